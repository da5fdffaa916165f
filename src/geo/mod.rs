use crate::error::AppError;
use crate::models::rider::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn validate(point: &GeoPoint) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lng) {
        return Err(AppError::InvalidCoordinate {
            lat: point.lat,
            lng: point.lng,
        });
    }
    Ok(())
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let h = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    // atan2 keeps antipodal points out of asin's domain trouble
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * central_angle
}

#[derive(Debug, Clone, Copy)]
pub struct Pricing {
    pub base_fee_kobo: i64,
    pub per_km_fee_kobo: i64,
}

pub fn delivery_fee_kobo(distance_km: f64, pricing: &Pricing) -> i64 {
    let distance = distance_km.max(0.0);
    pricing.base_fee_kobo + (pricing.per_km_fee_kobo as f64 * distance).round() as i64
}

pub fn check_coverage(distance_km: f64, max_km: f64) -> Result<(), AppError> {
    if distance_km > max_km {
        return Err(AppError::OutOfRange {
            distance_km,
            max_km,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rider::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 6.5244,
            lng: 3.3792,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let ikeja = GeoPoint {
            lat: 6.6018,
            lng: 3.3515,
        };
        let lekki = GeoPoint {
            lat: 6.4478,
            lng: 3.4723,
        };
        let there = haversine_km(&ikeja, &lekki);
        let back = haversine_km(&lekki, &ikeja);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn lagos_to_abuja_is_around_526_km() {
        let lagos = GeoPoint {
            lat: 6.5244,
            lng: 3.3792,
        };
        let abuja = GeoPoint {
            lat: 9.0765,
            lng: 7.3986,
        };
        let distance = haversine_km(&lagos, &abuja);
        assert!((distance - 526.0).abs() < 5.0);
    }

    #[test]
    fn out_of_domain_coordinates_are_rejected() {
        assert!(validate(&GeoPoint { lat: 91.0, lng: 0.0 }).is_err());
        assert!(validate(&GeoPoint { lat: -91.0, lng: 0.0 }).is_err());
        assert!(validate(&GeoPoint {
            lat: 0.0,
            lng: 180.5
        })
        .is_err());
        assert!(validate(&GeoPoint {
            lat: 6.5244,
            lng: 3.3792
        })
        .is_ok());
    }

    #[test]
    fn fee_is_monotone_in_distance() {
        let pricing = Pricing {
            base_fee_kobo: 50_000,
            per_km_fee_kobo: 10_000,
        };

        let mut previous = delivery_fee_kobo(0.0, &pricing);
        for step in 1..=100 {
            let fee = delivery_fee_kobo(step as f64 * 0.1, &pricing);
            assert!(fee >= previous);
            previous = fee;
        }
    }

    #[test]
    fn fee_is_base_plus_per_km() {
        let pricing = Pricing {
            base_fee_kobo: 50_000,
            per_km_fee_kobo: 10_000,
        };
        assert_eq!(delivery_fee_kobo(0.0, &pricing), 50_000);
        assert_eq!(delivery_fee_kobo(4.9, &pricing), 99_000);
    }

    #[test]
    fn coverage_check_carries_the_distance() {
        assert!(check_coverage(4.9, 5.0).is_ok());

        let err = check_coverage(6.2035, 5.0).unwrap_err();
        match err {
            AppError::OutOfRange { distance_km, .. } => {
                assert!((distance_km - 6.2035).abs() < 1e-9)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("6.2"));
    }
}
