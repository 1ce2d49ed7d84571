//! Invoice repository.
//!
//! Ensure-style like shipments: at most one invoice per order, idempotent
//! under concurrent generation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use madrona_core::{InvoiceId, OrderId, Price};

use crate::domain::Invoice;

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: InvoiceId,
    order_id: OrderId,
    issued_at: DateTime<Utc>,
    tax_rate: Decimal,
    total_with_tax: Price,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            issued_at: row.issued_at,
            tax_rate: row.tax_rate,
            total_with_tax: row.total_with_tax,
        }
    }
}

const INVOICE_COLUMNS: &str = "id, order_id, issued_at, tax_rate, total_with_tax";

/// Repository for invoice database operations.
pub struct InvoiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InvoiceRepository<'a> {
    /// Create a new invoice repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the invoice of an order, if one has been issued.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Invoice::from))
    }

    /// Persist a freshly issued invoice, keeping whichever row got there
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn ensure(&self, invoice: &Invoice) -> Result<Invoice, RepositoryError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "INSERT INTO invoices (id, order_id, issued_at, tax_rate, total_with_tax)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (order_id) DO NOTHING
             RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(invoice.id)
        .bind(invoice.order_id)
        .bind(invoice.issued_at)
        .bind(invoice.tax_rate)
        .bind(invoice.total_with_tax)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        self.get_for_order(invoice.order_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
