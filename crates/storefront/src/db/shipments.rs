//! Shipment repository.
//!
//! One shipment per order. `ensure_for_order` is the idempotent lazy-create
//! path: the unique `order_id` constraint turns a concurrent double-create
//! into a plain lookup for the race loser.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use madrona_core::{AddressId, OrderId, ShipmentId, ShipmentStatus};

use crate::domain::Shipment;

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ShipmentRow {
    id: ShipmentId,
    order_id: OrderId,
    address_id: AddressId,
    status: ShipmentStatus,
    carrier: Option<String>,
    tracking_number: Option<String>,
    eta: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ShipmentRow> for Shipment {
    fn from(row: ShipmentRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            address_id: row.address_id,
            status: row.status,
            carrier: row.carrier,
            tracking_number: row.tracking_number,
            eta: row.eta,
            shipped_at: row.shipped_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SHIPMENT_COLUMNS: &str = "id, order_id, address_id, status, carrier, tracking_number, \
                                eta, shipped_at, created_at, updated_at";

/// Repository for shipment database operations.
pub struct ShipmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShipmentRepository<'a> {
    /// Create a new shipment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a shipment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, RepositoryError> {
        let row: Option<ShipmentRow> = sqlx::query_as(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Shipment::from))
    }

    /// Get the shipment of an order, if one exists yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Shipment>, RepositoryError> {
        let row: Option<ShipmentRow> = sqlx::query_as(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Shipment::from))
    }

    /// Get the shipment of an order, lazily creating one in `preparing`
    /// addressed to the given delivery address.
    ///
    /// Safe under concurrent access: `ON CONFLICT DO NOTHING` plus the
    /// re-select means exactly one row ever exists per order and a race
    /// loser sees the winner's row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::NotFound` if the row vanished between insert and
    /// re-select (the order was deleted).
    pub async fn ensure_for_order(
        &self,
        order_id: OrderId,
        delivery_address_id: AddressId,
    ) -> Result<Shipment, RepositoryError> {
        let row: Option<ShipmentRow> = sqlx::query_as(&format!(
            "INSERT INTO shipments (id, order_id, address_id, status)
             VALUES ($1, $2, $3, 'preparing')
             ON CONFLICT (order_id) DO NOTHING
             RETURNING {SHIPMENT_COLUMNS}"
        ))
        .bind(ShipmentId::generate())
        .bind(order_id)
        .bind(delivery_address_id)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        self.get_for_order(order_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Persist a shipment after domain mutations.
    ///
    /// Writes every mutable field; the id, order, and address never change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shipment does not exist.
    pub async fn update(&self, shipment: &Shipment) -> Result<Shipment, RepositoryError> {
        let row: Option<ShipmentRow> = sqlx::query_as(&format!(
            "UPDATE shipments
             SET status = $2, carrier = $3, tracking_number = $4, eta = $5,
                 shipped_at = $6, updated_at = now()
             WHERE id = $1
             RETURNING {SHIPMENT_COLUMNS}"
        ))
        .bind(shipment.id)
        .bind(shipment.status)
        .bind(&shipment.carrier)
        .bind(&shipment.tracking_number)
        .bind(shipment.eta)
        .bind(shipment.shipped_at)
        .fetch_optional(self.pool)
        .await?;

        row.map(Shipment::from).ok_or(RepositoryError::NotFound)
    }

    /// Every shipment, newest first (fulfillment listing).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Shipment>, RepositoryError> {
        let rows: Vec<ShipmentRow> = sqlx::query_as(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Shipment::from).collect())
    }
}
