//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use madrona_core::Price;

use crate::domain::Order;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::AddressDraft;
use crate::services::CheckoutService;
use crate::state::AppState;

/// Checkout payload: the client-computed total (re-validated server-side)
/// and the billing/delivery address pair.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub total: Price,
    pub addresses: Vec<AddressDraft>,
}

/// Convert the user's cart into an order.
///
/// Rejections come back as 422 with the full violation set; success is 201
/// with the pending order (shipment already exists in `preparing`).
#[instrument(skip(state, user, request))]
pub async fn checkout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutService::new(state.pool())
        .checkout(user.id, &request.addresses, request.total)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}
