//! Admin user management.

use madrona_core::UserId;
use sha2::{Digest, Sha256};

use super::connect;

/// Create an admin user (or promote an existing account).
///
/// # Errors
///
/// Returns an error if the database is unreachable or the insert fails.
pub async fn create(email: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !email.contains('@') {
        return Err(format!("invalid email: {email}").into());
    }

    let pool = connect().await?;

    let digest = Sha256::digest(password.as_bytes());
    let password_hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, is_verified)
         VALUES ($1, $2, $3, 'admin', TRUE)
         ON CONFLICT (email)
         DO UPDATE SET role = 'admin', password_hash = EXCLUDED.password_hash",
    )
    .bind(UserId::generate())
    .bind(email)
    .bind(&password_hash)
    .execute(&pool)
    .await?;

    tracing::info!(email, "admin user ready");
    Ok(())
}
