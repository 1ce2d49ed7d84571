//! Cart persistence.
//!
//! The cart engine runs in memory; this repository loads a user's cart,
//! saves it back wholesale (delete-and-reinsert, last-write-wins - the
//! accepted model for multi-tab writers), and clears it after checkout.

use sqlx::PgPool;

use madrona_core::{CartId, CartItemId, Price, ProductId, ProductOptionId, UserId};

use crate::domain::{Cart, CartItem};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    product_id: ProductId,
    product_option_id: Option<ProductOptionId>,
    title: String,
    base_price: Price,
    extra_price: Price,
    quantity: i32,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_option_id: row.product_option_id,
            title: row.title,
            base_price: row.base_price,
            extra_price: row.extra_price,
            quantity: row.quantity,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart, if one has been persisted.
    ///
    /// Lines come back in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart_id: Option<CartId> =
            sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        let Some(cart_id) = cart_id else {
            return Ok(None);
        };

        let rows: Vec<CartItemRow> = sqlx::query_as(
            "SELECT id, product_id, product_option_id, title, base_price, extra_price, quantity
             FROM cart_items
             WHERE cart_id = $1
             ORDER BY created_at, id",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(Cart {
            id: Some(cart_id),
            items: rows.into_iter().map(CartItem::from).collect(),
        }))
    }

    /// Load a user's cart, creating an empty one on first interaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Cart, RepositoryError> {
        if let Some(cart) = self.get_for_user(user_id).await? {
            return Ok(cart);
        }

        // Two first interactions can race; the unique user_id constraint
        // resolves the loser into a plain lookup.
        let cart_id: Option<CartId> = sqlx::query_scalar(
            "INSERT INTO carts (id, user_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING id",
        )
        .bind(CartId::generate())
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        match cart_id {
            Some(id) => Ok(Cart {
                id: Some(id),
                items: Vec::new(),
            }),
            None => self
                .get_for_user(user_id)
                .await?
                .ok_or(RepositoryError::NotFound),
        }
    }

    /// Persist the cart's lines wholesale (last write wins).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn save_items(&self, cart_id: CartId, items: &[CartItem]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO cart_items
                     (id, cart_id, product_id, product_option_id, title, base_price, extra_price, quantity)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(item.id)
            .bind(cart_id)
            .bind(item.product_id)
            .bind(item.product_option_id)
            .bind(&item.title)
            .bind(item.base_price)
            .bind(item.extra_price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Drop every line of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
