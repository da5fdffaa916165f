use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::order::OrderStatus;

/// Events fanned out to sockets and push channels after a state change has
/// committed. Delivery is fire-and-forget: a slow or absent subscriber never
/// blocks or rolls back a transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    OrderCreated {
        order_id: Uuid,
        vendor_id: Uuid,
        total_kobo: i64,
        at: DateTime<Utc>,
    },
    OrderAssigned {
        order_id: Uuid,
        rider_id: Uuid,
        at: DateTime<Utc>,
    },
    StatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    },
    TrackingUpdated {
        order_id: Uuid,
        distance_km: f64,
        eta_minutes: f64,
        at: DateTime<Utc>,
    },
    NearDelivery {
        order_id: Uuid,
        distance_km: f64,
        at: DateTime<Utc>,
    },
    OrderDelivered {
        order_id: Uuid,
        at: DateTime<Utc>,
    },
    OrderCanceled {
        order_id: Uuid,
        at: DateTime<Utc>,
    },
}

pub fn publish(tx: &broadcast::Sender<OrderEvent>, event: OrderEvent) {
    // no subscribers is fine
    let _ = tx.send(event);
}
