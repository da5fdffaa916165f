use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::OrderStatus;
use crate::models::rider::{GeoPoint, TransportMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingPing {
    pub id: Uuid,
    pub order_id: Uuid,
    pub location: GeoPoint,
    pub distance_km: f64,
    pub eta_minutes: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderContact {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub transport_mode: TransportMode,
}

/// The customer-facing view of a delivery in flight. When no ping has been
/// recorded yet this degrades to status + last_updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub rider: Option<RiderContact>,
    pub vendor_name: String,
    pub location: Option<GeoPoint>,
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<f64>,
    pub near_delivery: bool,
    pub last_updated: DateTime<Utc>,
}
