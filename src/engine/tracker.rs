use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo;
use crate::models::rider::{GeoPoint, TransportMode};
use crate::models::tracking::{RiderContact, TrackingPing, TrackingSnapshot};
use crate::models::vendor::DELETED_VENDOR_PLACEHOLDER;
use crate::outbox::{self, OrderEvent};
use crate::state::AppState;

pub fn is_near_delivery(distance_km: f64, threshold_km: f64) -> bool {
    distance_km <= threshold_km
}

/// Appends a location ping for an active delivery and returns the refreshed
/// snapshot. Pings may arrive out of order; the snapshot always reflects the
/// latest recorded_at, not the last write.
pub fn record_location(
    state: &AppState,
    order_id: Uuid,
    location: GeoPoint,
    recorded_at: DateTime<Utc>,
) -> Result<TrackingSnapshot, AppError> {
    geo::validate(&location)?;

    let (status, rider_id, destination) = {
        let order = state
            .orders
            .get(&order_id)
            .ok_or(AppError::OrderNotFound(order_id))?;
        (order.status, order.rider, order.destination)
    };

    if !status.is_active_delivery() {
        return Err(AppError::InactiveOrder { status });
    }

    let mode = rider_id
        .and_then(|id| state.riders.get(&id).map(|r| r.transport_mode))
        .unwrap_or(TransportMode::Bike);

    let distance_km = geo::haversine_km(&location, &destination);
    let eta_minutes = distance_km / mode.speed_kmh() * 60.0;

    state.tracking.entry(order_id).or_default().push(TrackingPing {
        id: Uuid::new_v4(),
        order_id,
        location,
        distance_km,
        eta_minutes,
        recorded_at,
    });

    if let Some(rider_id) = rider_id {
        if let Some(mut rider) = state.riders.get_mut(&rider_id) {
            rider.location = Some(location);
            rider.updated_at = recorded_at;
        }
    }

    state.metrics.tracking_updates_total.inc();

    outbox::publish(
        &state.events_tx,
        OrderEvent::TrackingUpdated {
            order_id,
            distance_km,
            eta_minutes,
            at: recorded_at,
        },
    );

    snapshot(state, order_id)
}

/// Builds the customer-facing view. Without any ping yet, location, distance
/// and ETA stay empty and last_updated falls back to the last status change.
pub fn snapshot(state: &AppState, order_id: Uuid) -> Result<TrackingSnapshot, AppError> {
    let order = state
        .orders
        .get(&order_id)
        .map(|o| o.value().clone())
        .ok_or(AppError::OrderNotFound(order_id))?;

    let latest = state.tracking.get(&order_id).and_then(|pings| {
        pings
            .iter()
            .max_by_key(|ping| ping.recorded_at)
            .cloned()
    });

    let rider = order.rider.and_then(|id| {
        state.riders.get(&id).map(|r| RiderContact {
            id: r.id,
            name: r.name.clone(),
            phone: r.phone.clone(),
            transport_mode: r.transport_mode,
        })
    });

    let vendor_name = state
        .vendors
        .get(&order.vendor_id)
        .filter(|v| !v.deleted)
        .map(|v| v.name.clone())
        .unwrap_or_else(|| DELETED_VENDOR_PLACEHOLDER.to_string());

    let last_updated = latest
        .as_ref()
        .map(|ping| ping.recorded_at)
        .or_else(|| order.status_history.last().map(|change| change.at))
        .unwrap_or(order.created_at);

    let near_delivery = latest
        .as_ref()
        .map(|ping| is_near_delivery(ping.distance_km, state.delivery.near_delivery_km))
        .unwrap_or(false);

    Ok(TrackingSnapshot {
        order_id,
        status: order.status,
        rider,
        vendor_name,
        location: latest.as_ref().map(|ping| ping.location),
        distance_km: latest.as_ref().map(|ping| ping.distance_km),
        eta_minutes: latest.as_ref().map(|ping| ping.eta_minutes),
        near_delivery,
        last_updated,
    })
}
