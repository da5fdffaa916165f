use dashmap::DashMap;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::DeliveryConfig;
use crate::models::order::Order;
use crate::models::rider::Rider;
use crate::models::tracking::TrackingPing;
use crate::models::vendor::Vendor;
use crate::observability::metrics::Metrics;
use crate::outbox::OrderEvent;
use crate::wallet::Wallet;

pub struct AppState {
    pub delivery: DeliveryConfig,
    pub vendors: DashMap<Uuid, Vendor>,
    pub riders: DashMap<Uuid, Rider>,
    pub orders: DashMap<Uuid, Order>,
    pub tracking: DashMap<Uuid, Vec<TrackingPing>>,
    pub catalog: Catalog,
    pub wallet: Wallet,
    // serializes assignment so the pending-check, busy-check and both writes
    // act as one unit
    pub assign_lock: Mutex<()>,
    pub events_tx: broadcast::Sender<OrderEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(delivery: DeliveryConfig, event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            delivery,
            vendors: DashMap::new(),
            riders: DashMap::new(),
            orders: DashMap::new(),
            tracking: DashMap::new(),
            catalog: Catalog::new(),
            wallet: Wallet::new(),
            assign_lock: Mutex::new(()),
            events_tx,
            metrics: Metrics::new(),
        }
    }
}
