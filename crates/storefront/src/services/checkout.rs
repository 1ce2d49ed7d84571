//! Checkout orchestration.
//!
//! Snapshot the cart, validate against the live catalogue, then hand the
//! draft to the order repository's single checkout transaction. A rejected
//! validation persists nothing; a lost stock race at commit time comes back
//! as the same `InsufficientStock` violation shape the validator produces,
//! so clients handle both identically.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use madrona_core::{Price, UserId};

use crate::db::orders::CheckoutWriteError;
use crate::db::{CartRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::domain::checkout::{CheckoutError, CheckoutRejected, CheckoutValidator, Violation};
use crate::domain::{Cart, Order};
use crate::models::AddressDraft;

/// Why a checkout did not produce an order.
#[derive(Debug, Error)]
pub enum CheckoutFailure {
    /// Domain-rule violations, reported all at once.
    #[error(transparent)]
    Rejected(#[from] CheckoutRejected),

    /// Persistence failure; the caller decides whether to retry.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CheckoutError> for CheckoutFailure {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Rejected(rejected) => Self::Rejected(rejected),
            CheckoutError::Storage(err) => Self::Repository(err),
        }
    }
}

/// Checkout service: cart snapshot in, pending order out.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert the user's cart into an order.
    ///
    /// On success the order is `Pending`, its shipment exists in
    /// `preparing`, option stock is decremented, and the cart is empty -
    /// all committed atomically.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutFailure::Rejected`] with the full violation set,
    /// or [`CheckoutFailure::Repository`] on persistence failure.
    #[instrument(skip(self, addresses))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        addresses: &[AddressDraft],
        submitted_total: Price,
    ) -> Result<Order, CheckoutFailure> {
        let carts = CartRepository::new(self.pool);
        let cart = carts
            .get_for_user(user_id)
            .await?
            .unwrap_or_else(Cart::empty);
        let snapshot = cart.snapshot();

        let validator = CheckoutValidator::new(ProductRepository::new(self.pool));
        let draft = validator
            .validate(&snapshot, addresses, submitted_total)
            .await
            .map_err(CheckoutFailure::from)?;

        let orders = OrderRepository::new(self.pool);
        let order = orders
            .create_from_draft(user_id, cart.id, &draft)
            .await
            .map_err(|e| match e {
                CheckoutWriteError::OutOfStock {
                    index,
                    title,
                    requested,
                    available,
                } => CheckoutFailure::Rejected(CheckoutRejected {
                    violations: vec![Violation::InsufficientStock {
                        path: format!("items[{index}]"),
                        title,
                        requested,
                        available,
                        shortfall: requested - available,
                    }],
                }),
                CheckoutWriteError::Repository(err) => CheckoutFailure::Repository(err),
            })?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total,
            lines = order.items.len(),
            "checkout completed"
        );
        Ok(order)
    }
}
