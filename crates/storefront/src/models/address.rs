//! Billing and delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use madrona_core::{AddressId, AddressStatus, AddressType, UserId};

/// A stored address.
///
/// At most one `CurrentAddress` exists per (user, type); saving a new pair
/// demotes the user's prior addresses to `PreviousAddress`.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub status: AddressStatus,
    #[serde(rename = "type")]
    pub kind: AddressType,
    pub full_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// An address as submitted at checkout or on the address form, before
/// persistence.
///
/// Optional fields stay optional here; empty-string coercion is a
/// presentation concern and must not leak into stored data. Shape rules
/// (non-empty fields, postcode length) are enforced by the checkout
/// validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    #[serde(rename = "type")]
    pub kind: AddressType,
    pub full_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
}
