use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo;
use crate::models::rider::GeoPoint;
use crate::models::vendor::{Product, Vendor};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vendors", post(create_vendor).get(list_vendors))
        .route("/vendors/:id", delete(delete_vendor))
        .route("/products", post(create_product))
}

#[derive(Deserialize)]
pub struct CreateVendorRequest {
    pub name: String,
    pub location: GeoPoint,
}

async fn create_vendor(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateVendorRequest>,
) -> Result<Json<Vendor>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    geo::validate(&payload.location)?;

    let vendor = Vendor {
        id: Uuid::new_v4(),
        name: payload.name,
        location: payload.location,
        deleted: false,
    };

    state.vendors.insert(vendor.id, vendor.clone());
    Ok(Json(vendor))
}

async fn list_vendors(State(state): State<Arc<AppState>>) -> Json<Vec<Vendor>> {
    let vendors = state
        .vendors
        .iter()
        .filter(|entry| !entry.deleted)
        .map(|entry| entry.value().clone())
        .collect();
    Json(vendors)
}

// soft delete: order history keeps pointing at the id
async fn delete_vendor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vendor>, AppError> {
    let mut vendor = state
        .vendors
        .get_mut(&id)
        .ok_or(AppError::VendorNotFound(id))?;

    vendor.deleted = true;

    Ok(Json(vendor.clone()))
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub vendor_id: Uuid,
    pub name: String,
    pub price_kobo: i64,
    pub parent_id: Option<Uuid>,
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<Product>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.price_kobo <= 0 {
        return Err(AppError::BadRequest("price must be positive".to_string()));
    }

    let vendor_exists = state
        .vendors
        .get(&payload.vendor_id)
        .map(|vendor| !vendor.deleted)
        .unwrap_or(false);
    if !vendor_exists {
        return Err(AppError::VendorNotFound(payload.vendor_id));
    }

    if let Some(parent_id) = payload.parent_id {
        let parent = state.catalog.get_product(parent_id)?;
        if parent.vendor_id != payload.vendor_id {
            return Err(AppError::BadRequest(
                "variant must belong to the parent's vendor".to_string(),
            ));
        }
    }

    let product = Product {
        id: Uuid::new_v4(),
        vendor_id: payload.vendor_id,
        name: payload.name,
        price_kobo: payload.price_kobo,
        parent_id: payload.parent_id,
    };

    state.catalog.insert(product.clone());
    Ok(Json(product))
}
