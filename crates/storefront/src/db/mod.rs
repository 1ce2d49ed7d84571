//! Database operations for the storefront `PostgreSQL`.
//!
//! # Database: `madrona`
//!
//! ## Tables
//!
//! - `users` - Site accounts (role-tagged, no separate admin table)
//! - `sessions` - Tower-sessions storage
//! - `products`, `product_options` - The catalogue; options carry stock
//! - `carts`, `cart_items` - Last-write-wins cart persistence
//! - `addresses` - Billing/delivery addresses with current/previous status
//! - `orders`, `order_items` - Frozen checkout snapshots plus a version
//!   column for optimistic status transitions
//! - `shipments` - 1:1 with orders (unique `order_id` enables idempotent
//!   lazy creation)
//! - `invoices` - 1:1 with orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p madrona-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod addresses;
pub mod carts;
pub mod invoices;
pub mod orders;
pub mod products;
pub mod shipments;
pub mod users;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use invoices::InvoiceRepository;
pub use orders::{CheckoutWriteError, OrderRepository, OrderSummary};
pub use products::ProductRepository;
pub use shipments::ShipmentRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email) or a lost optimistic
    /// concurrency race.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
