//! User domain types.
//!
//! The role is a plain field, not a type hierarchy: admin and customer share
//! every other attribute, and handlers gate on [`UserRole::is_admin`].

use chrono::{DateTime, Utc};

use madrona_core::{UserId, UserRole};

/// A storefront user.
///
/// Implements `Debug` manually to redact the credential hash.
#[derive(Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Email address (unique).
    pub email: String,
    /// SHA-256 hex digest of the password.
    pub password_hash: String,
    /// Role gate for admin-only routes.
    pub role: UserRole,
    /// Whether the account finished email verification.
    pub is_verified: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("is_verified", &self.is_verified)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password_hash() {
        let user = User {
            id: UserId::generate(),
            email: "user@example.com".to_owned(),
            password_hash: "5e884898da28047151d0e56f8dc62927".to_owned(),
            role: UserRole::Customer,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let debug = format!("{user:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("5e884898"));
    }
}
