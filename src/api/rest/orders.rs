use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::checkout::{self, NewOrder};
use crate::engine::{lifecycle, matcher, otp, stats, tracker};
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::models::rider::GeoPoint;
use crate::models::tracking::TrackingSnapshot;
use crate::outbox::{self, OrderEvent};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/available", get(available_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/assign", post(assign_order))
        .route("/orders/:id/status", post(update_status))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/location", post(record_location))
        .route("/orders/:id/tracking", get(get_tracking))
        .route("/orders/:id/otp", post(issue_otp))
        .route("/orders/:id/confirm", post(confirm_delivery))
        .route("/stats/deliveries", get(delivery_stats))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewOrder>,
) -> Result<Json<Order>, AppError> {
    let order = checkout::create_order(&state, payload, Utc::now())?;
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or(AppError::OrderNotFound(id))?;

    Ok(Json(order.value().clone()))
}

async fn available_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(matcher::available_orders(&state))
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub rider_id: Uuid,
}

async fn assign_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Order>, AppError> {
    // eligibility is checked at the boundary; the matcher itself only
    // guards against double assignment
    let eligible = state
        .riders
        .get(&payload.rider_id)
        .map(|rider| rider.can_take_orders())
        .ok_or(AppError::RiderNotFound(payload.rider_id))?;

    if !eligible {
        return Err(AppError::BadRequest(
            "rider is offline or not verified".to_string(),
        ));
    }

    let order = matcher::assign(&state, id, payload.rider_id, Utc::now()).await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    // assignment, near-delivery, delivery and cancellation all have their own
    // entry points
    let allowed = matches!(
        payload.status,
        OrderStatus::Preparing
            | OrderStatus::ReadyForPickup
            | OrderStatus::PickedUp
            | OrderStatus::InTransit
    );
    if !allowed {
        return Err(AppError::BadRequest(format!(
            "status {} cannot be set directly",
            payload.status
        )));
    }

    let order = lifecycle::advance(&state, id, payload.status, Utc::now())?;
    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::cancel(&state, id, Utc::now())?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct LocationUpdateRequest {
    pub lat: f64,
    pub lng: f64,
    pub recorded_at: Option<DateTime<Utc>>,
}

async fn record_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocationUpdateRequest>,
) -> Result<Json<TrackingSnapshot>, AppError> {
    let now = Utc::now();
    let recorded_at = payload.recorded_at.unwrap_or(now);
    let point = GeoPoint {
        lat: payload.lat,
        lng: payload.lng,
    };

    let snapshot = tracker::record_location(&state, id, point, recorded_at)?;

    // the tracker only reports proximity; flipping the status is on us
    if snapshot.near_delivery && snapshot.status == OrderStatus::InTransit {
        lifecycle::advance(&state, id, OrderStatus::NearDelivery, now)?;
        outbox::publish(
            &state.events_tx,
            OrderEvent::NearDelivery {
                order_id: id,
                distance_km: snapshot.distance_km.unwrap_or(0.0),
                at: now,
            },
        );
        return Ok(Json(tracker::snapshot(&state, id)?));
    }

    Ok(Json(snapshot))
}

async fn get_tracking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackingSnapshot>, AppError> {
    Ok(Json(tracker::snapshot(&state, id)?))
}

#[derive(Deserialize)]
pub struct IssueOtpRequest {
    pub rider_id: Uuid,
}

#[derive(Serialize)]
pub struct IssueOtpResponse {
    pub code: String,
}

async fn issue_otp(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IssueOtpRequest>,
) -> Result<Json<IssueOtpResponse>, AppError> {
    let code = otp::issue(&state, id, payload.rider_id, Utc::now())?;
    Ok(Json(IssueOtpResponse { code }))
}

#[derive(Deserialize)]
pub struct ConfirmDeliveryRequest {
    pub code: String,
}

async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmDeliveryRequest>,
) -> Result<Json<Order>, AppError> {
    let order = otp::confirm(&state, id, &payload.code, Utc::now())?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

async fn delivery_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Json<stats::DeliveryPerformance> {
    let orders: Vec<Order> = state
        .orders
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    Json(stats::delivery_performance(
        orders.iter(),
        query.since,
        query.until,
    ))
}
