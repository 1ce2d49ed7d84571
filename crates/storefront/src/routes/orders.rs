//! Order route handlers.
//!
//! Customers see their own orders; admins see everything and drive the
//! lifecycle. A missing *or foreign* order is a plain 404 so order IDs do
//! not leak ownership.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use madrona_core::{OrderId, OrderStatus, UserId};

use crate::db::{OrderRepository, OrderSummary};
use crate::domain::{Invoice, Order, OrderTransition, Shipment};
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::SessionUser;
use crate::services::FulfillmentService;
use crate::state::AppState;

/// Listing filter (admins only).
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub user_id: Option<UserId>,
}

/// Rule-driven transition payload.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub action: OrderTransition,
}

/// Administrative override payload.
#[derive(Debug, Deserialize)]
pub struct OverrideStatusRequest {
    pub status: OrderStatus,
}

/// Load an order the caller is allowed to see.
async fn authorized_order(
    state: &AppState,
    user: SessionUser,
    id: OrderId,
) -> Result<Order> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    if order.user_id != user.id && !user.role.is_admin() {
        return Err(AppError::NotFound(format!("order {id}")));
    }
    Ok(order)
}

/// List orders: own for customers, all (or a user's) for admins.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool());

    let summaries = if user.role.is_admin() {
        match query.user_id {
            Some(user_id) => orders.list_for_user(user_id).await?,
            None => orders.list_all().await?,
        }
    } else {
        orders.list_for_user(user.id).await?
    };
    Ok(Json(summaries))
}

/// Order detail with its frozen item snapshot.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = authorized_order(&state, user, id).await?;
    Ok(Json(order))
}

/// Apply a rule-driven transition (admin).
///
/// Out-of-graph attempts and lost races both come back as 409; the order is
/// unchanged either way.
#[instrument(skip(state, admin))]
pub async fn transition(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<OrderId>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Order>> {
    let order = FulfillmentService::new(state.pool())
        .transition_order(id, request.action, admin.id)
        .await?;
    Ok(Json(order))
}

/// Set the status directly, bypassing the graph (admin; audit-logged).
#[instrument(skip(state, admin))]
pub async fn override_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<OrderId>,
    Json(request): Json<OverrideStatusRequest>,
) -> Result<Json<Order>> {
    let order = FulfillmentService::new(state.pool())
        .override_order_status(id, request.status, admin.id)
        .await?;
    Ok(Json(order))
}

/// The order's shipment, lazily created in `preparing` on first access.
#[instrument(skip(state, user))]
pub async fn shipment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Shipment>> {
    authorized_order(&state, user, id).await?;
    let shipment = FulfillmentService::new(state.pool())
        .ensure_shipment(id)
        .await?;
    Ok(Json(shipment))
}

/// The order's invoice, issued at the configured flat tax rate on first
/// access.
#[instrument(skip(state, user))]
pub async fn invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Invoice>> {
    authorized_order(&state, user, id).await?;
    let invoice = FulfillmentService::new(state.pool())
        .ensure_invoice(id, state.config().tax_rate)
        .await?;
    Ok(Json(invoice))
}
