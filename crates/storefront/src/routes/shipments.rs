//! Shipment route handlers (fulfillment staff).

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::DateTime;
use serde::Deserialize;
use tracing::instrument;

use madrona_core::{ShipmentId, ShipmentStatus};

use crate::db::ShipmentRepository;
use crate::domain::Shipment;
use crate::error::{AppError, Result};
use crate::middleware::AdminUser;
use crate::services::{FulfillmentService, ShipmentPatch};
use crate::state::AppState;

/// Shipment update payload; absent fields are left unchanged.
///
/// `eta` crosses the wire as integer epoch milliseconds.
#[derive(Debug, Deserialize)]
pub struct UpdateShipmentRequest {
    pub status: Option<ShipmentStatus>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub eta: Option<i64>,
}

impl UpdateShipmentRequest {
    fn into_patch(self) -> Result<ShipmentPatch> {
        let eta = match self.eta {
            Some(millis) => Some(DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                AppError::BadRequest(format!("eta {millis} is not a valid timestamp"))
            })?),
            None => None,
        };
        Ok(ShipmentPatch {
            status: self.status,
            carrier: self.carrier,
            tracking_number: self.tracking_number,
            eta,
        })
    }
}

/// All shipments, newest first (admin).
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Shipment>>> {
    let shipments = ShipmentRepository::new(state.pool()).list_all().await?;
    Ok(Json(shipments))
}

/// Shipment detail (admin).
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ShipmentId>,
) -> Result<Json<Shipment>> {
    let shipment = ShipmentRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shipment {id}")))?;
    Ok(Json(shipment))
}

/// Update carrier data, ETA, and/or advance the lifecycle one step (admin).
#[instrument(skip(state, admin, request))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<ShipmentId>,
    Json(request): Json<UpdateShipmentRequest>,
) -> Result<Json<Shipment>> {
    let patch = request.into_patch()?;
    let shipment = FulfillmentService::new(state.pool())
        .update_shipment(id, patch, admin.id)
        .await?;
    Ok(Json(shipment))
}
