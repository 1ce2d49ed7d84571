//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! madrona-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `MADRONA_DATABASE_URL` - `PostgreSQL` connection string

use super::connect;

/// Run the storefront database migrations.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    tracing::info!("Connected to database");

    tracing::info!("Running migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
