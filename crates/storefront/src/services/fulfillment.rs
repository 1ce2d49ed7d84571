//! Fulfillment orchestration: order transitions and shipment updates.
//!
//! Rule-driven order transitions run through the domain state machine and a
//! compare-and-swap write, so two concurrent transitions for the same order
//! cannot both succeed against the same starting state. The administrative
//! override bypasses the graph on purpose and is logged with a distinct
//! `audit` field so support actions remain distinguishable from rule-driven
//! transitions in the trail.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use madrona_core::{OrderId, OrderStatus, ShipmentId, ShipmentStatus, UserId};

use crate::db::{InvoiceRepository, OrderRepository, RepositoryError, ShipmentRepository};
use crate::domain::{InvalidTransition, Invoice, Order, OrderTransition, Shipment, ShipmentError};

/// Fulfillment operation failures.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The order or shipment does not exist.
    #[error("not found")]
    NotFound,

    /// The requested order transition is not an edge of the lifecycle
    /// graph.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// A shipment rule was violated.
    #[error(transparent)]
    Shipment(#[from] ShipmentError),

    /// A concurrent writer got there first; re-read and retry against the
    /// new state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence failure.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for FulfillmentError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

/// Partial shipment update; absent fields are left unchanged.
#[derive(Debug, Default)]
pub struct ShipmentPatch {
    pub status: Option<ShipmentStatus>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub eta: Option<DateTime<Utc>>,
}

/// Fulfillment service for staff-driven order and shipment updates.
pub struct FulfillmentService<'a> {
    pool: &'a PgPool,
}

impl<'a> FulfillmentService<'a> {
    /// Create a new fulfillment service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Apply a rule-driven order transition.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::InvalidTransition`] for an out-of-graph
    /// attempt (the order is untouched), [`FulfillmentError::Conflict`] if
    /// a concurrent transition won the race, or
    /// [`FulfillmentError::NotFound`] for an unknown order.
    #[instrument(skip(self))]
    pub async fn transition_order(
        &self,
        order_id: OrderId,
        transition: OrderTransition,
        actor: UserId,
    ) -> Result<Order, FulfillmentError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders.get(order_id).await?.ok_or(FulfillmentError::NotFound)?;

        let next = transition.apply(order.status)?;
        let updated = orders
            .transition_status(order_id, order.version, next)
            .await?;

        info!(
            event = "order_transition",
            order_id = %order_id,
            from = %order.status,
            to = %next,
            transition = %transition,
            actor = %actor,
            "order transition applied"
        );
        Ok(updated)
    }

    /// Set an order's status directly, bypassing the lifecycle graph.
    ///
    /// Deliberate escape hatch for support workflows; callers must already
    /// have gated on the admin role.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::NotFound`] for an unknown order.
    #[instrument(skip(self))]
    pub async fn override_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        actor: UserId,
    ) -> Result<Order, FulfillmentError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders.get(order_id).await?.ok_or(FulfillmentError::NotFound)?;
        let updated = orders.override_status(order_id, status).await?;

        warn!(
            audit = "status_override",
            order_id = %order_id,
            from = %order.status,
            to = %status,
            actor = %actor,
            "order status overridden outside the lifecycle graph"
        );
        Ok(updated)
    }

    /// Get an order's shipment, lazily creating one in `preparing` on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::NotFound`] for an unknown order.
    #[instrument(skip(self))]
    pub async fn ensure_shipment(&self, order_id: OrderId) -> Result<Shipment, FulfillmentError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders.get(order_id).await?.ok_or(FulfillmentError::NotFound)?;

        let shipments = ShipmentRepository::new(self.pool);
        Ok(shipments
            .ensure_for_order(order.id, order.delivery_address_id)
            .await?)
    }

    /// Apply a staff shipment update: carrier data, ETA, and at most one
    /// lifecycle step.
    ///
    /// Re-sending the current status is a no-op, so a full-state PUT from a
    /// form does not trip the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::Shipment`] when a field rule or the
    /// lifecycle graph rejects the update (nothing is persisted), or
    /// [`FulfillmentError::NotFound`] for an unknown shipment.
    #[instrument(skip(self, patch))]
    pub async fn update_shipment(
        &self,
        shipment_id: ShipmentId,
        patch: ShipmentPatch,
        actor: UserId,
    ) -> Result<Shipment, FulfillmentError> {
        let shipments = ShipmentRepository::new(self.pool);
        let mut shipment = shipments
            .get(shipment_id)
            .await?
            .ok_or(FulfillmentError::NotFound)?;
        let previous_status = shipment.status;

        if let Some(carrier) = patch.carrier {
            shipment.set_carrier(Some(carrier))?;
        }
        if let Some(tracking) = patch.tracking_number {
            shipment.set_tracking_number(Some(tracking))?;
        }
        if let Some(eta) = patch.eta {
            shipment.set_eta(Some(eta))?;
        }
        if let Some(status) = patch.status {
            if status != shipment.status {
                shipment.advance(status, Utc::now())?;
            }
        }

        let updated = shipments.update(&shipment).await?;
        info!(
            event = "shipment_updated",
            shipment_id = %shipment_id,
            order_id = %updated.order_id,
            from = %previous_status,
            to = %updated.status,
            actor = %actor,
            "shipment updated"
        );
        Ok(updated)
    }

    /// Get an order's invoice, issuing one at the given flat tax rate on
    /// first access.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::NotFound`] for an unknown order.
    #[instrument(skip(self))]
    pub async fn ensure_invoice(
        &self,
        order_id: OrderId,
        tax_rate: rust_decimal::Decimal,
    ) -> Result<Invoice, FulfillmentError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders.get(order_id).await?.ok_or(FulfillmentError::NotFound)?;

        let invoices = InvoiceRepository::new(self.pool);
        let invoice = Invoice::for_order(&order, tax_rate, Utc::now());
        Ok(invoices.ensure(&invoice).await?)
    }
}
