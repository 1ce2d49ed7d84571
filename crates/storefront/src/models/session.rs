//! Session-related types.
//!
//! Identity issuance itself (login) is thin glue; the rest of the service
//! only ever sees the [`SessionUser`] stored here.

use serde::{Deserialize, Serialize};

use madrona_core::{UserId, UserRole};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user and
/// gate administrative routes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionUser {
    /// User's database ID.
    pub id: UserId,
    /// Role at login time.
    pub role: UserRole,
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
