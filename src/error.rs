use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::order::OrderStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("order {0} not found")]
    OrderNotFound(Uuid),

    #[error("rider {0} not found")]
    RiderNotFound(Uuid),

    #[error("vendor {0} not found")]
    VendorNotFound(Uuid),

    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order already assigned to a rider")]
    OrderAlreadyAssigned,

    #[error("rider already has an active delivery")]
    RiderBusy,

    #[error("out of range: destination is {distance_km:.1} km away (max {max_km} km)")]
    OutOfRange { distance_km: f64, max_km: f64 },

    #[error("insufficient funds: balance {balance_kobo} kobo, requested {requested_kobo} kobo")]
    InsufficientFunds {
        balance_kobo: i64,
        requested_kobo: i64,
    },

    #[error("no active delivery code for this order")]
    OtpNotFound,

    #[error("delivery code has expired")]
    OtpExpired,

    #[error("delivery code does not match")]
    OtpMismatch,

    #[error("order is not assigned to this rider")]
    OrderNotAssignedToRider,

    #[error("invalid coordinate: lat {lat}, lng {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("order is not in an active delivery state: {status}")]
    InactiveOrder { status: OrderStatus },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::OrderNotFound(_)
            | AppError::RiderNotFound(_)
            | AppError::VendorNotFound(_)
            | AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. }
            | AppError::OrderAlreadyAssigned
            | AppError::RiderBusy
            | AppError::InactiveOrder { .. }
            | AppError::OtpNotFound
            | AppError::OtpExpired
            | AppError::OtpMismatch => StatusCode::CONFLICT,
            AppError::OutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::OrderNotAssignedToRider => StatusCode::FORBIDDEN,
            AppError::InvalidCoordinate { .. } | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
