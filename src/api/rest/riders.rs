use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo;
use crate::models::rider::{GeoPoint, Rider, RiderDocuments, TransportMode, VerificationStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/riders", post(create_rider).get(list_riders))
        .route("/riders/:id/status", patch(update_rider_status))
        .route("/riders/:id/documents", patch(update_rider_documents))
        .route("/riders/:id/location", patch(update_rider_location))
}

#[derive(Deserialize)]
pub struct CreateRiderRequest {
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub transport_mode: TransportMode,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub online: bool,
}

#[derive(Deserialize)]
pub struct UpdateDocumentsRequest {
    pub id_card: Option<bool>,
    pub vehicle_papers: Option<bool>,
    pub profile_photo: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

async fn create_rider(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRiderRequest>,
) -> Result<Json<Rider>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("phone cannot be empty".to_string()));
    }

    let rider = Rider {
        id: Uuid::new_v4(),
        user_id: payload.user_id,
        name: payload.name,
        phone: payload.phone,
        transport_mode: payload.transport_mode,
        online: false,
        verification: VerificationStatus::Inactive,
        documents: RiderDocuments::default(),
        location: None,
        updated_at: Utc::now(),
    };

    state.riders.insert(rider.id, rider.clone());
    Ok(Json(rider))
}

async fn list_riders(State(state): State<Arc<AppState>>) -> Json<Vec<Rider>> {
    let riders = state
        .riders
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(riders)
}

async fn update_rider_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Rider>, AppError> {
    let mut rider = state
        .riders
        .get_mut(&id)
        .ok_or(AppError::RiderNotFound(id))?;

    rider.online = payload.online;
    rider.updated_at = Utc::now();

    Ok(Json(rider.clone()))
}

async fn update_rider_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentsRequest>,
) -> Result<Json<Rider>, AppError> {
    let mut rider = state
        .riders
        .get_mut(&id)
        .ok_or(AppError::RiderNotFound(id))?;

    if let Some(id_card) = payload.id_card {
        rider.documents.id_card = id_card;
    }
    if let Some(vehicle_papers) = payload.vehicle_papers {
        rider.documents.vehicle_papers = vehicle_papers;
    }
    if let Some(profile_photo) = payload.profile_photo {
        rider.documents.profile_photo = profile_photo;
    }

    rider.verification = rider.documents.verification_status();
    rider.updated_at = Utc::now();

    Ok(Json(rider.clone()))
}

async fn update_rider_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Rider>, AppError> {
    geo::validate(&payload.location)?;

    let mut rider = state
        .riders
        .get_mut(&id)
        .ok_or(AppError::RiderNotFound(id))?;

    rider.location = Some(payload.location);
    rider.updated_at = Utc::now();

    Ok(Json(rider.clone()))
}
