//! Address route handlers.
//!
//! Saving always writes a full current pair and demotes the user's prior
//! addresses; the shape rules are the same ones checkout enforces.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use madrona_core::UserId;

use crate::db::AddressRepository;
use crate::domain::checkout::{AddressPair, address_violations};
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::{Address, AddressDraft};
use crate::state::AppState;

/// New current pair payload.
#[derive(Debug, Deserialize)]
pub struct CreateAddressesRequest {
    pub addresses: Vec<AddressDraft>,
}

/// The caller's addresses, current pair first.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(addresses))
}

/// Save a new current billing/delivery pair, demoting the prior addresses.
#[instrument(skip(state, user, request))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateAddressesRequest>,
) -> Result<(StatusCode, Json<Vec<Address>>)> {
    let mut violations = Vec::new();
    for (i, draft) in request.addresses.iter().enumerate() {
        address_violations(draft, &format!("addresses[{i}]"), &mut violations);
    }
    let pair = match AddressPair::from_drafts(&request.addresses) {
        Ok(pair) => Some(pair),
        Err(violation) => {
            violations.push(violation);
            None
        }
    };
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }
    let Some(pair) = pair else {
        return Err(AppError::Validation(violations));
    };

    let (billing, delivery) = AddressRepository::new(state.pool())
        .create_current_pair(user.id, &pair.billing, &pair.delivery)
        .await?;
    Ok((StatusCode::CREATED, Json(vec![billing, delivery])))
}

/// A user's addresses (admin).
#[instrument(skip(state, _admin))]
pub async fn for_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;
    Ok(Json(addresses))
}
