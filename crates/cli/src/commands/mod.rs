//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

/// Connect to the storefront database using `MADRONA_DATABASE_URL`.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("MADRONA_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "MADRONA_DATABASE_URL not set")?;

    let pool = PgPool::connect(database_url.expose_secret()).await?;
    Ok(pool)
}
