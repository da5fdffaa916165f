use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo;
use crate::models::order::{Order, OrderItem, OrderStatus, PaymentStatus};
use crate::models::rider::GeoPoint;
use crate::outbox::{self, OrderEvent};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub items: Vec<NewOrderItem>,
    pub destination: GeoPoint,
}

#[derive(Debug, Deserialize)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Checkout: validates the basket against the catalog, prices the delivery,
/// debits the customer wallet and persists the order as pending. Nothing is
/// written unless every step succeeds.
pub fn create_order(
    state: &AppState,
    new_order: NewOrder,
    now: DateTime<Utc>,
) -> Result<Order, AppError> {
    geo::validate(&new_order.destination)?;

    let vendor = state
        .vendors
        .get(&new_order.vendor_id)
        .filter(|v| !v.deleted)
        .map(|v| v.value().clone())
        .ok_or(AppError::VendorNotFound(new_order.vendor_id))?;

    if new_order.items.is_empty() {
        return Err(AppError::BadRequest("order has no items".to_string()));
    }

    let mut items = Vec::with_capacity(new_order.items.len());
    for item in &new_order.items {
        if item.quantity == 0 {
            return Err(AppError::BadRequest(
                "item quantity must be at least 1".to_string(),
            ));
        }

        let product = state.catalog.get_product(item.product_id)?;
        if state.catalog.vendor_of(&product)? != vendor.id {
            return Err(AppError::BadRequest(format!(
                "product {} does not belong to vendor {}",
                product.id, vendor.id
            )));
        }

        // price is snapshotted here; later catalog changes do not touch
        // placed orders
        items.push(OrderItem {
            product_id: product.id,
            name: product.name,
            quantity: item.quantity,
            unit_price_kobo: product.price_kobo,
        });
    }

    let distance_km = geo::haversine_km(&vendor.location, &new_order.destination);
    geo::check_coverage(distance_km, state.delivery.max_coverage_km)?;

    let delivery_fee_kobo = geo::delivery_fee_kobo(distance_km, &state.delivery.pricing());
    let subtotal_kobo: i64 = items.iter().map(OrderItem::line_total_kobo).sum();
    let total_kobo = subtotal_kobo + delivery_fee_kobo;

    let order_id = Uuid::new_v4();
    state
        .wallet
        .debit(new_order.customer_id, total_kobo, Some(order_id))?;

    let order = Order {
        id: order_id,
        customer_id: new_order.customer_id,
        vendor_id: vendor.id,
        items,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Paid,
        destination: new_order.destination,
        distance_km,
        delivery_fee_kobo,
        total_kobo,
        rider: None,
        otp: None,
        estimated_pickup_time: None,
        estimated_delivery_time: None,
        actual_pickup_time: None,
        actual_delivery_time: None,
        created_at: now,
        status_history: vec![],
    };

    state.orders.insert(order.id, order.clone());
    state.metrics.pending_orders.inc();

    info!(
        order_id = %order.id,
        vendor_id = %vendor.id,
        total_kobo = order.total_kobo,
        distance_km = order.distance_km,
        "order created"
    );

    outbox::publish(
        &state.events_tx,
        OrderEvent::OrderCreated {
            order_id: order.id,
            vendor_id: vendor.id,
            total_kobo: order.total_kobo,
            at: now,
        },
    );

    Ok(order)
}
