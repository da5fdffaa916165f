use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Serialize, PartialEq)]
pub struct DeliveryPerformance {
    pub delivered: usize,
    pub average_delivery_minutes: Option<f64>,
    pub on_time_rate: Option<f64>,
}

/// Fleet performance over delivered orders in a period: mean time from pickup
/// to hand-off, and the share delivered no later than estimated.
pub fn delivery_performance<'a, I>(
    orders: I,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> DeliveryPerformance
where
    I: IntoIterator<Item = &'a Order>,
{
    let delivered: Vec<&Order> = orders
        .into_iter()
        .filter(|order| order.status == OrderStatus::Delivered)
        .filter(|order| match order.actual_delivery_time {
            Some(at) => {
                since.is_none_or(|s| at >= s) && until.is_none_or(|u| at <= u)
            }
            None => false,
        })
        .collect();

    if delivered.is_empty() {
        return DeliveryPerformance {
            delivered: 0,
            average_delivery_minutes: None,
            on_time_rate: None,
        };
    }

    let durations: Vec<f64> = delivered
        .iter()
        .filter_map(|order| {
            let picked_up = order.actual_pickup_time?;
            let dropped_off = order.actual_delivery_time?;
            Some((dropped_off - picked_up).num_seconds() as f64 / 60.0)
        })
        .collect();

    let average_delivery_minutes = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    };

    let on_time = delivered
        .iter()
        .filter(|order| {
            matches!(
                (order.actual_delivery_time, order.estimated_delivery_time),
                (Some(actual), Some(estimated)) if actual <= estimated
            )
        })
        .count();

    DeliveryPerformance {
        delivered: delivered.len(),
        average_delivery_minutes,
        on_time_rate: Some(on_time as f64 / delivered.len() as f64),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::models::order::PaymentStatus;
    use crate::models::rider::GeoPoint;

    fn delivered_order(
        picked_up_minutes_ago: i64,
        delivery_minutes: i64,
        estimated_minutes: i64,
    ) -> Order {
        let base = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let picked_up = base - Duration::minutes(picked_up_minutes_ago);

        Order {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            items: vec![],
            status: OrderStatus::Delivered,
            payment_status: PaymentStatus::Paid,
            destination: GeoPoint { lat: 6.45, lng: 3.47 },
            distance_km: 3.0,
            delivery_fee_kobo: 80_000,
            total_kobo: 330_000,
            rider: Some(Uuid::new_v4()),
            otp: None,
            estimated_pickup_time: Some(picked_up),
            estimated_delivery_time: Some(picked_up + Duration::minutes(estimated_minutes)),
            actual_pickup_time: Some(picked_up),
            actual_delivery_time: Some(picked_up + Duration::minutes(delivery_minutes)),
            created_at: picked_up - Duration::minutes(30),
            status_history: vec![],
        }
    }

    #[test]
    fn empty_period_has_no_averages() {
        let orders: Vec<Order> = vec![];
        let stats = delivery_performance(orders.iter(), None, None);
        assert_eq!(
            stats,
            DeliveryPerformance {
                delivered: 0,
                average_delivery_minutes: None,
                on_time_rate: None,
            }
        );
    }

    #[test]
    fn averages_and_on_time_rate() {
        let orders = vec![
            delivered_order(120, 20, 30), // on time
            delivered_order(100, 40, 30), // late
        ];

        let stats = delivery_performance(orders.iter(), None, None);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.average_delivery_minutes, Some(30.0));
        assert_eq!(stats.on_time_rate, Some(0.5));
    }

    #[test]
    fn window_filters_by_delivery_time() {
        let orders = vec![delivered_order(120, 20, 30)];
        let cutoff = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();

        let stats = delivery_performance(orders.iter(), Some(cutoff), None);
        assert_eq!(stats.delivered, 0);

        let stats = delivery_performance(orders.iter(), None, Some(cutoff));
        assert_eq!(stats.delivered, 1);
    }

    #[test]
    fn undelivered_orders_are_ignored() {
        let mut in_flight = delivered_order(60, 20, 30);
        in_flight.status = OrderStatus::InTransit;
        in_flight.actual_delivery_time = None;

        let orders = vec![in_flight, delivered_order(120, 20, 30)];
        let stats = delivery_performance(orders.iter(), None, None);
        assert_eq!(stats.delivered, 1);
    }
}
