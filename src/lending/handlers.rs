use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{BorrowRequest, BorrowResponse},
    services::{monthly_repayment, validate_amount},
};
use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

pub fn lending_routes() -> Router<AppState> {
    Router::new().route("/borrow", post(borrow))
}

#[instrument(skip(state, payload))]
pub async fn borrow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<BorrowRequest>, JsonRejection>,
) -> Result<Json<BorrowResponse>, AppError> {
    let Json(payload) = payload?;
    let amount = validate_amount(payload.amount, &state.config.lending)?;

    let user = match state.users.add_purchase_power(user_id, amount).await? {
        Some(u) => u,
        None => {
            warn!(%user_id, "borrow for unknown user");
            return Err(AppError::NotFound("User not found".into()));
        }
    };

    let monthly_repayment = monthly_repayment(amount, &state.config.lending);
    info!(%user_id, amount, purchase_power = user.purchase_power, "borrow recorded");

    Ok(Json(BorrowResponse {
        purchase_power: user.purchase_power,
        monthly_repayment,
    }))
}
