//! Order repository: the checkout transaction and status persistence.
//!
//! Checkout is one atomic multi-row write: address demotion and insertion,
//! the order row with its frozen item snapshot, the guarded per-option
//! stock decrement, and the linked shipment all commit or roll back
//! together. Status transitions go through a compare-and-swap on the
//! `version` column so two concurrent transitions cannot both succeed
//! against the same starting state.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use madrona_core::{
    AddressId, OrderId, OrderItemId, OrderStatus, Price, ProductId, ProductOptionId, ShipmentId,
    UserId,
};

use crate::domain::checkout::OrderDraft;
use crate::domain::{Order, OrderItem};

use super::addresses::AddressRepository;
use super::RepositoryError;

// =============================================================================
// Types
// =============================================================================

/// A list-view order without its item snapshot.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Price,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Failure writing a validated checkout.
#[derive(Debug, Error)]
pub enum CheckoutWriteError {
    /// The guarded stock decrement lost the race for the last units; the
    /// whole transaction was rolled back.
    #[error("insufficient stock for \"{title}\": requested {requested}, available {available}")]
    OutOfStock {
        /// Index of the failing line in the draft.
        index: usize,
        title: String,
        requested: i32,
        available: i32,
    },

    /// Any other persistence failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutWriteError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    total: Price,
    billing_address_id: AddressId,
    delivery_address_id: AddressId,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            total: self.total,
            items,
            billing_address_id: self.billing_address_id,
            delivery_address_id: self.delivery_address_id,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    product_option_id: Option<ProductOptionId>,
    title: String,
    base_price: Price,
    extra_price: Price,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_option_id: row.product_option_id,
            title: row.title,
            base_price: row.base_price,
            extra_price: row.extra_price,
            quantity: row.quantity,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status, total, billing_address_id, \
                             delivery_address_id, version, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_option_id, title, base_price, extra_price, quantity";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a validated checkout draft.
    ///
    /// One transaction: demote and insert the address pair, insert the
    /// order (Pending) with its item snapshot, decrement option stock
    /// behind a `stock >= quantity` guard, insert the linked shipment in
    /// `preparing`, and clear the cart. A failed guard aborts everything -
    /// no partial orders, no partial address writes.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutWriteError::OutOfStock`] if a line lost the race
    /// for its last units, or a repository error for anything else.
    pub async fn create_from_draft(
        &self,
        user_id: UserId,
        cart_id: Option<madrona_core::CartId>,
        draft: &OrderDraft,
    ) -> Result<Order, CheckoutWriteError> {
        let mut tx = self.pool.begin().await?;

        let (billing, delivery) = AddressRepository::insert_current_pair(
            &mut *tx,
            user_id,
            &draft.addresses.billing,
            &draft.addresses.delivery,
        )
        .await?;

        let order_row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (id, user_id, status, total, billing_address_id, delivery_address_id)
             VALUES ($1, $2, 'Pending', $3, $4, $5)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(OrderId::generate())
        .bind(user_id)
        .bind(draft.total)
        .bind(billing.id)
        .bind(delivery.id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(draft.items.len());
        for (index, line) in draft.items.iter().enumerate() {
            let item_row: OrderItemRow = sqlx::query_as(&format!(
                "INSERT INTO order_items
                     (id, order_id, product_id, product_option_id, title, base_price,
                      extra_price, quantity)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING {ORDER_ITEM_COLUMNS}"
            ))
            .bind(OrderItemId::generate())
            .bind(order_row.id)
            .bind(line.product_id)
            .bind(line.product_option_id)
            .bind(&line.title)
            .bind(line.base_price)
            .bind(line.extra_price)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::from(item_row));

            // Stock is tracked per option; the guard makes the validator's
            // re-check and this decrement atomic as a unit.
            if let Some(option_id) = line.product_option_id {
                Self::decrement_stock(&mut *tx, option_id, line.quantity, index, &line.title)
                    .await?;
            }
        }

        sqlx::query(
            "INSERT INTO shipments (id, order_id, address_id, status)
             VALUES ($1, $2, $3, 'preparing')",
        )
        .bind(ShipmentId::generate())
        .bind(order_row.id)
        .bind(delivery.id)
        .execute(&mut *tx)
        .await?;

        if let Some(cart_id) = cart_id {
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
                .bind(cart_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(order_row.into_order(items))
    }

    async fn decrement_stock(
        conn: &mut PgConnection,
        option_id: ProductOptionId,
        quantity: i32,
        index: usize,
        title: &str,
    ) -> Result<(), CheckoutWriteError> {
        let result = sqlx::query(
            "UPDATE product_options
             SET stock = stock - $2, updated_at = now()
             WHERE id = $1 AND stock >= $2",
        )
        .bind(option_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<i32> =
                sqlx::query_scalar("SELECT stock FROM product_options WHERE id = $1")
                    .bind(option_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            return Err(CheckoutWriteError::OutOfStock {
                index,
                title: title.to_owned(),
                requested: quantity,
                available: available.unwrap_or(0),
            });
        }
        Ok(())
    }

    /// Get an order with its item snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(
            row.into_order(items.into_iter().map(OrderItem::from).collect()),
        ))
    }

    /// A user's orders, newest first, without item snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::summarize).collect())
    }

    /// Every order, newest first (admin listing).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::summarize).collect())
    }

    fn summarize(row: OrderRow) -> OrderSummary {
        OrderSummary {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    /// Compare-and-swap the order status.
    ///
    /// The write only lands if the caller's `expected_version` still
    /// matches; a lost race surfaces as `Conflict` so the caller re-reads
    /// the post-transition state instead of overwriting it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for a missing order and
    /// `RepositoryError::Conflict` for a lost race.
    pub async fn transition_status(
        &self,
        id: OrderId,
        expected_version: i32,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders
             SET status = $3, version = version + 1, updated_at = now()
             WHERE id = $1 AND version = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(expected_version)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let order = self
                    .get(row.id)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                Ok(order)
            }
            None => {
                let exists: Option<i32> =
                    sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                        .bind(id)
                        .fetch_optional(self.pool)
                        .await?;
                match exists {
                    Some(_) => Err(RepositoryError::Conflict(
                        "order status changed concurrently".to_owned(),
                    )),
                    None => Err(RepositoryError::NotFound),
                }
            }
        }
    }

    /// Set the status directly, bypassing the transition graph.
    ///
    /// Only the fulfillment service's audit-logged override path calls
    /// this.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn override_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders
             SET status = $2, version = version + 1, updated_at = now()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.get(row.id).await?.ok_or(RepositoryError::NotFound),
            None => Err(RepositoryError::NotFound),
        }
    }
}
