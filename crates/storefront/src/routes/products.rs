//! Catalogue route handlers.
//!
//! Reads are public; writes require the admin role.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use madrona_core::{ProductId, ProductOptionId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::AdminUser;
use crate::models::{NewProduct, NewProductOption, Product, ProductOption, ProductPatch};
use crate::state::AppState;

/// List the catalogue.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}

/// Create a product (admin).
#[instrument(skip(state, _admin, input))]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_owned()));
    }
    if !input.base_price.is_non_negative() {
        return Err(AppError::BadRequest(
            "base price must not be negative".to_owned(),
        ));
    }

    let product = ProductRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Partially update a product (admin).
#[instrument(skip(state, _admin, patch))]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool()).update(id, &patch).await?;
    Ok(Json(product))
}

/// Delete a product and its options (admin).
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Options of a product.
#[instrument(skip(state))]
pub async fn options(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<ProductOption>>> {
    let repo = ProductRepository::new(state.pool());
    if repo.get(id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    Ok(Json(repo.options_for(id).await?))
}

/// Create an option under a product (admin).
#[instrument(skip(state, _admin, input))]
pub async fn create_option(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ProductId>,
    Json(input): Json<NewProductOption>,
) -> Result<(StatusCode, Json<ProductOption>)> {
    if input.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".to_owned()));
    }
    if input.attribute.trim().is_empty() || input.value.trim().is_empty() {
        return Err(AppError::BadRequest(
            "attribute and value are required".to_owned(),
        ));
    }

    let option = ProductRepository::new(state.pool())
        .create_option(id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(option)))
}

/// Option detail.
#[instrument(skip(state))]
pub async fn show_option(
    State(state): State<AppState>,
    Path(id): Path<ProductOptionId>,
) -> Result<Json<ProductOption>> {
    let option = ProductRepository::new(state.pool())
        .get_option(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product option {id}")))?;
    Ok(Json(option))
}

/// Delete an option (admin).
#[instrument(skip(state, _admin))]
pub async fn delete_option(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ProductOptionId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete_option(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
