//! Cart route handlers.
//!
//! The engine runs server-side against the user's persisted cart: add and
//! remove mutate through [`Cart`]'s rules, `PUT` is the wholesale
//! last-write-wins save path for clients that assemble the cart themselves.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use madrona_core::{CartId, CartItemId, Price, ProductId, ProductOptionId};

use crate::db::{CartRepository, ProductRepository};
use crate::domain::{Cart, CartItem, CatalogueView};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Cart payload returned to clients.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: Option<CartId>,
    pub items: Vec<CartItem>,
    pub total: Price,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id,
            total: cart.total(),
            items: cart.items,
        }
    }
}

/// Add-to-cart payload.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_option_id: Option<ProductOptionId>,
    /// Defaults to 1.
    pub quantity: Option<i32>,
}

/// Query for partial line removal.
#[derive(Debug, Deserialize)]
pub struct RemoveItemQuery {
    pub quantity: Option<i32>,
}

/// Wholesale cart replacement payload.
#[derive(Debug, Deserialize)]
pub struct ReplaceCartRequest {
    pub items: Vec<CartItem>,
}

/// The user's cart, created empty on first interaction.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool())
        .get_or_create_for_user(user.id)
        .await?;
    Ok(Json(cart.into()))
}

/// Add a line to the cart (merges by product + option).
#[instrument(skip(state, user, request))]
pub async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let catalogue = ProductRepository::new(state.pool());
    let product = catalogue
        .product(request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let option = match request.product_option_id {
        Some(option_id) => Some(
            catalogue
                .option(option_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("product option {option_id}")))?,
        ),
        None => None,
    };

    let carts = CartRepository::new(state.pool());
    let mut cart = carts.get_or_create_for_user(user.id).await?;
    cart.add_item(&product, option.as_ref(), request.quantity.unwrap_or(1))?;

    if let Some(cart_id) = cart.id {
        carts.save_items(cart_id, &cart.items).await?;
    }
    Ok(Json(cart.into()))
}

/// Remove a line, or `?quantity=n` of it.
#[instrument(skip(state, user))]
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<CartItemId>,
    Query(query): Query<RemoveItemQuery>,
) -> Result<Json<CartView>> {
    let carts = CartRepository::new(state.pool());
    let mut cart = carts.get_or_create_for_user(user.id).await?;

    if cart.remove_item(item_id, query.quantity) {
        if let Some(cart_id) = cart.id {
            carts.save_items(cart_id, &cart.items).await?;
        }
    }
    Ok(Json(cart.into()))
}

/// Replace the whole cart (last write wins).
#[instrument(skip(state, user, request))]
pub async fn replace(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ReplaceCartRequest>,
) -> Result<Json<CartView>> {
    let carts = CartRepository::new(state.pool());
    let mut cart = carts.get_or_create_for_user(user.id).await?;

    cart.replace_items(request.items);
    if let Some(cart_id) = cart.id {
        carts.save_items(cart_id, &cart.items).await?;
    }
    Ok(Json(cart.into()))
}
