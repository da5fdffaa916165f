use std::env;

use crate::error::AppError;
use crate::geo::Pricing;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub max_coverage_km: f64,
    pub base_fee_kobo: i64,
    pub per_km_fee_kobo: i64,
    pub otp_ttl_minutes: i64,
    pub near_delivery_km: f64,
    pub prep_time_minutes: i64,
}

impl DeliveryConfig {
    pub fn pricing(&self) -> Pricing {
        Pricing {
            base_fee_kobo: self.base_fee_kobo,
            per_km_fee_kobo: self.per_km_fee_kobo,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_coverage_km: 5.0,
            base_fee_kobo: 50_000,
            per_km_fee_kobo: 10_000,
            otp_ttl_minutes: 10,
            near_delivery_km: 0.5,
            prep_time_minutes: 20,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = DeliveryConfig::default();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            delivery: DeliveryConfig {
                max_coverage_km: parse_or_default("COVERAGE_RADIUS_KM", defaults.max_coverage_km)?,
                base_fee_kobo: parse_or_default("BASE_FEE_KOBO", defaults.base_fee_kobo)?,
                per_km_fee_kobo: parse_or_default("PER_KM_FEE_KOBO", defaults.per_km_fee_kobo)?,
                otp_ttl_minutes: parse_or_default("OTP_TTL_MINUTES", defaults.otp_ttl_minutes)?,
                near_delivery_km: parse_or_default("NEAR_DELIVERY_KM", defaults.near_delivery_km)?,
                prep_time_minutes: parse_or_default(
                    "PREP_TIME_MINUTES",
                    defaults.prep_time_minutes,
                )?,
            },
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
