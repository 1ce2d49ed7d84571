//! Identity glue: credential login, registration, logout.
//!
//! Credentials are a SHA-256 hex digest compared against the stored hash;
//! everything downstream of these handlers only ever sees the session.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tower_sessions::Session;
use tracing::instrument;

use madrona_core::{UserId, UserRole};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{SessionUser, User, session_keys};
use crate::state::AppState;

/// Login/registration payload.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

/// Public view of a user (no credential material).
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            is_verified: user.is_verified,
        }
    }
}

fn password_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Log in with email and password.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<UserView>> {
    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_email(&form.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_owned()))?;

    if password_digest(&form.password) != user.password_hash {
        return Err(AppError::Unauthorized("invalid credentials".to_owned()));
    }

    session
        .insert(
            session_keys::CURRENT_USER,
            SessionUser {
                id: user.id,
                role: user.role,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(UserView::from(&user)))
}

/// Create a customer account and log it in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CredentialsForm>,
) -> Result<(StatusCode, Json<UserView>)> {
    if form.email.trim().is_empty() || !form.email.contains('@') {
        return Err(AppError::BadRequest("invalid email address".to_owned()));
    }
    if form.password.chars().count() < 8 {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".to_owned(),
        ));
    }

    let users = UserRepository::new(state.pool());
    let user = users
        .create(
            form.email.trim(),
            &password_digest(&form.password),
            UserRole::Customer,
        )
        .await?;

    session
        .insert(
            session_keys::CURRENT_USER,
            SessionUser {
                id: user.id,
                role: user.role,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// Drop the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_the_stored_format() {
        // sha256("password"), the digest format the seed data uses
        assert_eq!(
            password_digest("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }
}
