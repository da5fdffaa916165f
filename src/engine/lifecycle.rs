use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::outbox::{self, OrderEvent};
use crate::state::AppState;

/// Advances an order one step along the lifecycle (vendor and rider driven
/// edges). The transition commits before the event goes out.
pub fn advance(
    state: &AppState,
    order_id: Uuid,
    next: OrderStatus,
    now: DateTime<Utc>,
) -> Result<Order, AppError> {
    let (updated, from) = {
        let mut order = state
            .orders
            .get_mut(&order_id)
            .ok_or(AppError::OrderNotFound(order_id))?;

        let from = order.status;
        order.transition(next, now)?;
        (order.clone(), from)
    };

    info!(order_id = %order_id, from = %from, to = %next, "order status changed");

    outbox::publish(
        &state.events_tx,
        OrderEvent::StatusChanged {
            order_id,
            from,
            to: next,
            at: now,
        },
    );

    Ok(updated)
}

pub fn cancel(state: &AppState, order_id: Uuid, now: DateTime<Utc>) -> Result<Order, AppError> {
    let (updated, was) = {
        let mut order = state
            .orders
            .get_mut(&order_id)
            .ok_or(AppError::OrderNotFound(order_id))?;

        let was = order.status;
        order.transition(OrderStatus::Canceled, now)?;
        (order.clone(), was)
    };

    if was == OrderStatus::Pending {
        state.metrics.pending_orders.dec();
    } else if was.is_active_delivery() {
        state.metrics.active_deliveries.dec();
    }

    info!(order_id = %order_id, was = %was, "order canceled");

    outbox::publish(
        &state.events_tx,
        OrderEvent::OrderCanceled { order_id, at: now },
    );

    Ok(updated)
}
