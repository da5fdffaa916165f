use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::wallet::WalletTransaction;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/wallets/:user_id", get(get_wallet))
        .route("/wallets/:user_id/credit", post(credit_wallet))
}

#[derive(Serialize)]
pub struct WalletView {
    pub user_id: Uuid,
    pub balance_kobo: i64,
    pub transactions: Vec<WalletTransaction>,
}

async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Json<WalletView> {
    Json(WalletView {
        user_id,
        balance_kobo: state.wallet.balance_kobo(user_id),
        transactions: state.wallet.transactions_for(user_id),
    })
}

#[derive(Deserialize)]
pub struct CreditRequest {
    pub amount_kobo: i64,
}

async fn credit_wallet(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CreditRequest>,
) -> Result<Json<WalletTransaction>, AppError> {
    let tx = state.wallet.credit(user_id, payload.amount_kobo, None)?;
    Ok(Json(tx))
}
