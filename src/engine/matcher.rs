use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo;
use crate::models::order::{Order, OrderStatus};
use crate::models::tracking::TrackingPing;
use crate::outbox::{self, OrderEvent};
use crate::state::AppState;

/// Orders a rider can pick up right now: pending and unassigned, oldest
/// first.
pub fn available_orders(state: &AppState) -> Vec<Order> {
    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| entry.status == OrderStatus::Pending && entry.rider.is_none())
        .map(|entry| entry.value().clone())
        .collect();

    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    orders
}

/// Assigns a pending order to a rider. The whole section runs under the
/// assignment lock: concurrent callers racing for the same order or the same
/// rider see OrderAlreadyAssigned / RiderBusy, never a silent overwrite.
pub async fn assign(
    state: &AppState,
    order_id: Uuid,
    rider_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Order, AppError> {
    let rider = state
        .riders
        .get(&rider_id)
        .map(|r| r.value().clone())
        .ok_or(AppError::RiderNotFound(rider_id))?;

    let assigned = {
        let _guard = state.assign_lock.lock().await;

        {
            let order = state
                .orders
                .get(&order_id)
                .ok_or(AppError::OrderNotFound(order_id))?;

            if order.rider.is_some() {
                record_conflict(state);
                return Err(AppError::OrderAlreadyAssigned);
            }
            if order.status != OrderStatus::Pending {
                record_conflict(state);
                return Err(AppError::InvalidTransition {
                    from: order.status,
                    to: OrderStatus::Confirmed,
                });
            }
        }

        let busy = state.orders.iter().any(|entry| {
            entry.rider == Some(rider_id) && entry.status.is_active_delivery()
        });
        if busy {
            record_conflict(state);
            return Err(AppError::RiderBusy);
        }

        let assigned = {
            let mut order = state
                .orders
                .get_mut(&order_id)
                .ok_or(AppError::OrderNotFound(order_id))?;

            order.transition(OrderStatus::Confirmed, now)?;
            order.rider = Some(rider_id);

            let estimated_pickup = now + Duration::minutes(state.delivery.prep_time_minutes);
            let travel_minutes = order.distance_km / rider.transport_mode.speed_kmh() * 60.0;
            order.estimated_pickup_time = Some(estimated_pickup);
            order.estimated_delivery_time =
                Some(estimated_pickup + Duration::seconds((travel_minutes * 60.0) as i64));

            order.clone()
        };

        if let Some(location) = rider.location {
            let distance_km = geo::haversine_km(&location, &assigned.destination);
            let eta_minutes = distance_km / rider.transport_mode.speed_kmh() * 60.0;
            state.tracking.entry(order_id).or_default().push(TrackingPing {
                id: Uuid::new_v4(),
                order_id,
                location,
                distance_km,
                eta_minutes,
                recorded_at: now,
            });
        }

        assigned
    };

    state.metrics.pending_orders.dec();
    state.metrics.active_deliveries.inc();
    state
        .metrics
        .assignments_total
        .with_label_values(&["success"])
        .inc();

    info!(order_id = %order_id, rider_id = %rider_id, "order assigned");

    outbox::publish(
        &state.events_tx,
        OrderEvent::OrderAssigned {
            order_id,
            rider_id,
            at: now,
        },
    );

    Ok(assigned)
}

fn record_conflict(state: &AppState) {
    state
        .metrics
        .assignments_total
        .with_label_values(&["conflict"])
        .inc();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::config::DeliveryConfig;
    use crate::models::order::PaymentStatus;
    use crate::models::rider::{
        GeoPoint, Rider, RiderDocuments, TransportMode, VerificationStatus,
    };

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(DeliveryConfig::default(), 16))
    }

    fn seed_order(state: &AppState, id_seed: u128) -> Uuid {
        let id = Uuid::from_u128(id_seed);
        let order = Order {
            id,
            customer_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            items: vec![],
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Paid,
            destination: GeoPoint {
                lat: 6.4478,
                lng: 3.4723,
            },
            distance_km: 3.1,
            delivery_fee_kobo: 81_000,
            total_kobo: 331_000,
            rider: None,
            otp: None,
            estimated_pickup_time: None,
            estimated_delivery_time: None,
            actual_pickup_time: None,
            actual_delivery_time: None,
            created_at: Utc::now(),
            status_history: vec![],
        };
        state.orders.insert(id, order);
        id
    }

    fn seed_rider(state: &AppState, id_seed: u128) -> Uuid {
        let id = Uuid::from_u128(id_seed);
        let rider = Rider {
            id,
            user_id: Uuid::new_v4(),
            name: "Tunde".to_string(),
            phone: "+2348012345678".to_string(),
            transport_mode: TransportMode::Bike,
            online: true,
            verification: VerificationStatus::Active,
            documents: RiderDocuments {
                id_card: true,
                vehicle_papers: true,
                profile_photo: true,
            },
            location: Some(GeoPoint {
                lat: 6.5244,
                lng: 3.3792,
            }),
            updated_at: Utc::now(),
        };
        state.riders.insert(id, rider);
        id
    }

    #[tokio::test]
    async fn assign_confirms_order_and_seeds_tracking() {
        let state = state();
        let order_id = seed_order(&state, 1);
        let rider_id = seed_rider(&state, 100);

        let order = assign(&state, order_id, rider_id, Utc::now()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.rider, Some(rider_id));
        assert!(order.estimated_delivery_time.is_some());
        assert_eq!(state.tracking.get(&order_id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn assign_unknown_order_or_rider_fails() {
        let state = state();
        let order_id = seed_order(&state, 1);
        let rider_id = seed_rider(&state, 100);

        let err = assign(&state, Uuid::from_u128(42), rider_id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OrderNotFound(_)));

        let err = assign(&state, order_id, Uuid::from_u128(43), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RiderNotFound(_)));
    }

    #[tokio::test]
    async fn second_assignment_sees_order_already_assigned() {
        let state = state();
        let order_id = seed_order(&state, 1);
        let first = seed_rider(&state, 100);
        let second = seed_rider(&state, 101);

        assign(&state, order_id, first, Utc::now()).await.unwrap();
        let err = assign(&state, order_id, second, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::OrderAlreadyAssigned));
    }

    #[tokio::test]
    async fn rider_cannot_hold_two_active_deliveries() {
        let state = state();
        let first_order = seed_order(&state, 1);
        let second_order = seed_order(&state, 2);
        let rider_id = seed_rider(&state, 100);

        assign(&state, first_order, rider_id, Utc::now())
            .await
            .unwrap();
        let err = assign(&state, second_order, rider_id, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RiderBusy));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_assignments_produce_exactly_one_winner() {
        let state = state();
        let order_id = seed_order(&state, 1);
        let riders: Vec<Uuid> = (0..8).map(|i| seed_rider(&state, 100 + i)).collect();

        let handles: Vec<_> = riders
            .into_iter()
            .map(|rider_id| {
                let state = state.clone();
                tokio::spawn(async move {
                    assign(&state, order_id, rider_id, Utc::now()).await.is_ok()
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        let order = state.orders.get(&order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(order.rider.is_some());
    }

    #[tokio::test]
    async fn available_orders_are_fifo_and_exclude_assigned() {
        let state = state();
        let older = seed_order(&state, 1);
        {
            let mut order = state.orders.get_mut(&older).unwrap();
            order.created_at = Utc::now() - chrono::Duration::minutes(5);
        }
        let newer = seed_order(&state, 2);
        let rider_id = seed_rider(&state, 100);

        let listed: Vec<Uuid> = available_orders(&state).iter().map(|o| o.id).collect();
        assert_eq!(listed, vec![older, newer]);

        assign(&state, older, rider_id, Utc::now()).await.unwrap();
        let listed: Vec<Uuid> = available_orders(&state).iter().map(|o| o.id).collect();
        assert_eq!(listed, vec![newer]);
    }
}
