use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{DeliveryOtp, Order, OrderStatus};
use crate::outbox::{self, OrderEvent};
use crate::state::AppState;

/// Issues a 5-digit delivery code for the assigned rider at drop-off.
/// Re-issuing replaces any earlier code.
pub fn issue(
    state: &AppState,
    order_id: Uuid,
    rider_id: Uuid,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let mut order = state
        .orders
        .get_mut(&order_id)
        .ok_or(AppError::OrderNotFound(order_id))?;

    if order.rider != Some(rider_id) {
        return Err(AppError::OrderNotAssignedToRider);
    }

    // the code only exists while the order is awaiting hand-off
    if !matches!(
        order.status,
        OrderStatus::InTransit | OrderStatus::NearDelivery
    ) {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Delivered,
        });
    }

    let code = format!("{:05}", rand::thread_rng().gen_range(10_000..100_000));
    order.otp = Some(DeliveryOtp {
        code: code.clone(),
        expires_at: now + Duration::minutes(state.delivery.otp_ttl_minutes),
    });

    info!(order_id = %order_id, "delivery code issued");

    Ok(code)
}

/// Verifies the submitted code and completes the delivery. Verification and
/// the state change run under the order's map entry, so two near-simultaneous
/// confirms cannot both succeed.
pub fn confirm(
    state: &AppState,
    order_id: Uuid,
    submitted_code: &str,
    now: DateTime<Utc>,
) -> Result<Order, AppError> {
    let delivered = {
        let mut order = state
            .orders
            .get_mut(&order_id)
            .ok_or(AppError::OrderNotFound(order_id))?;

        let otp = order.otp.clone().ok_or(AppError::OtpNotFound)?;

        if now > otp.expires_at {
            order.otp = None;
            return Err(AppError::OtpExpired);
        }
        if otp.code != submitted_code {
            // left in place so the customer can retry until expiry
            return Err(AppError::OtpMismatch);
        }

        order.transition(OrderStatus::Delivered, now)?;
        order.clone()
    };

    state.metrics.active_deliveries.dec();
    if let (Some(picked_up), Some(dropped_off)) =
        (delivered.actual_pickup_time, delivered.actual_delivery_time)
    {
        let seconds = (dropped_off - picked_up).num_milliseconds() as f64 / 1_000.0;
        state.metrics.delivery_duration_seconds.observe(seconds);
    }

    info!(order_id = %order_id, "delivery confirmed");

    outbox::publish(
        &state.events_tx,
        OrderEvent::OrderDelivered { order_id, at: now },
    );

    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::config::DeliveryConfig;
    use crate::models::order::PaymentStatus;
    use crate::models::rider::GeoPoint;

    fn state() -> AppState {
        AppState::new(DeliveryConfig::default(), 16)
    }

    fn seed_order(state: &AppState, status: OrderStatus, rider: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        state.orders.insert(
            id,
            Order {
                id,
                customer_id: Uuid::new_v4(),
                vendor_id: Uuid::new_v4(),
                items: vec![],
                status,
                payment_status: PaymentStatus::Paid,
                destination: GeoPoint {
                    lat: 6.4478,
                    lng: 3.4723,
                },
                distance_km: 3.1,
                delivery_fee_kobo: 81_000,
                total_kobo: 331_000,
                rider,
                otp: None,
                estimated_pickup_time: None,
                estimated_delivery_time: None,
                actual_pickup_time: Some(Utc::now() - Duration::minutes(25)),
                actual_delivery_time: None,
                created_at: Utc::now(),
                status_history: vec![],
            },
        );
        id
    }

    #[test]
    fn only_the_assigned_rider_can_issue() {
        let state = state();
        let rider = Uuid::from_u128(1);
        let order_id = seed_order(&state, OrderStatus::InTransit, Some(rider));

        let err = issue(&state, order_id, Uuid::from_u128(2), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::OrderNotAssignedToRider));

        let code = issue(&state, order_id, rider, Utc::now()).unwrap();
        assert_eq!(code.len(), 5);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn issue_requires_an_in_flight_delivery() {
        let state = state();
        let rider = Uuid::from_u128(1);
        let order_id = seed_order(&state, OrderStatus::Preparing, Some(rider));

        let err = issue(&state, order_id, rider, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn reissue_overwrites_the_previous_code() {
        let state = state();
        let rider = Uuid::from_u128(1);
        let order_id = seed_order(&state, OrderStatus::InTransit, Some(rider));

        let first = issue(&state, order_id, rider, Utc::now()).unwrap();
        let second = issue(&state, order_id, rider, Utc::now()).unwrap();

        let stored = state.orders.get(&order_id).unwrap().otp.clone().unwrap();
        assert_eq!(stored.code, second);
        if first != second {
            let err = confirm(&state, order_id, &first, Utc::now()).unwrap_err();
            assert!(matches!(err, AppError::OtpMismatch));
        }
    }

    #[test]
    fn correct_code_delivers_exactly_once() {
        let state = state();
        let rider = Uuid::from_u128(1);
        let order_id = seed_order(&state, OrderStatus::NearDelivery, Some(rider));

        let issued_at = Utc::now();
        let code = issue(&state, order_id, rider, issued_at).unwrap();

        let submitted_at = issued_at + Duration::minutes(5);
        let order = confirm(&state, order_id, &code, submitted_at).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.actual_delivery_time, Some(submitted_at));
        assert!(order.otp.is_none());

        // the code was cleared on success
        let err = confirm(&state, order_id, &code, submitted_at).unwrap_err();
        assert!(matches!(err, AppError::OtpNotFound));
    }

    #[test]
    fn expired_code_is_cleared_and_reissuable() {
        let state = state();
        let rider = Uuid::from_u128(1);
        let order_id = seed_order(&state, OrderStatus::InTransit, Some(rider));

        let issued_at = Utc::now();
        let code = issue(&state, order_id, rider, issued_at).unwrap();

        let late = issued_at + Duration::minutes(11);
        let err = confirm(&state, order_id, &code, late).unwrap_err();
        assert!(matches!(err, AppError::OtpExpired));
        assert!(state.orders.get(&order_id).unwrap().otp.is_none());

        // no residual lock: a fresh code can be issued right away
        issue(&state, order_id, rider, late).unwrap();
    }

    #[test]
    fn mismatch_keeps_the_code_for_retry() {
        let state = state();
        let rider = Uuid::from_u128(1);
        let order_id = seed_order(&state, OrderStatus::InTransit, Some(rider));

        let issued_at = Utc::now();
        let code = issue(&state, order_id, rider, issued_at).unwrap();
        let wrong = if code == "00000" { "00001" } else { "00000" };

        let err = confirm(&state, order_id, wrong, issued_at).unwrap_err();
        assert!(matches!(err, AppError::OtpMismatch));

        let order = confirm(&state, order_id, &code, issued_at).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn confirm_without_issue_is_not_found() {
        let state = state();
        let order_id = seed_order(&state, OrderStatus::InTransit, Some(Uuid::from_u128(1)));

        let err = confirm(&state, order_id, "12345", Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::OtpNotFound));
    }
}
