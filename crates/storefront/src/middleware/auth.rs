//! Authentication extractors.
//!
//! The session carries a [`SessionUser`] written by the login route;
//! handlers pull it out with [`CurrentUser`] (any logged-in user) or
//! [`AdminUser`] (admin role required). Identity issuance itself is the
//! login route's concern - nothing else in the service reads credentials.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{SessionUser, session_keys};

/// Extractor requiring a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("user {}", user.id)
/// }
/// ```
pub struct CurrentUser(pub SessionUser);

/// Extractor requiring a logged-in admin.
pub struct AdminUser(pub SessionUser);

async fn session_user(parts: &mut Parts) -> Result<SessionUser, AppError> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or_else(|| AppError::Internal("session layer missing".to_owned()))?;

    session
        .get::<SessionUser>(session_keys::CURRENT_USER)
        .await?
        .ok_or_else(|| AppError::Unauthorized("login required".to_owned()))
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await?))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden("admin role required".to_owned()));
        }
        Ok(Self(user))
    }
}
