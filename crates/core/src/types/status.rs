//! Status enums for various entities.
//!
//! The label sets here are a wire contract shared with existing API
//! consumers: order statuses cross the boundary in PascalCase, shipment and
//! product statuses in snake_case, and address labels verbatim. The serde and
//! sqlx renames below must stay in lockstep with the Postgres enum types
//! created in the storefront migrations.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// The transition graph lives with the order aggregate; this type only knows
/// which states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "order_status"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Refunded,
}

impl OrderStatus {
    /// Terminal states admit no further rule-driven transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Refunded)
    }

    /// All states, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Paid,
        Self::Shipped,
        Self::Delivered,
        Self::Refunded,
    ];
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Paid => write!(f, "Paid"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Refunded => write!(f, "Refunded"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Refunded" => Ok(Self::Refunded),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Shipment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shipment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Preparing,
    InTransit,
    Delivered,
}

impl ShipmentStatus {
    /// A delivered shipment admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preparing => write!(f, "preparing"),
            Self::InTransit => write!(f, "in_transit"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preparing" => Ok(Self::Preparing),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid shipment status: {s}")),
        }
    }
}

/// Whether an address is the user's current one for its type.
///
/// At most one `CurrentAddress` exists per (user, type) pair; saving a new
/// pair demotes the prior addresses to `PreviousAddress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "address_status"))]
pub enum AddressStatus {
    #[default]
    CurrentAddress,
    PreviousAddress,
}

/// Billing vs. delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "address_type"))]
pub enum AddressType {
    BillingAddress,
    DeliveryAddress,
}

/// Product availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Available,
    #[default]
    OutOfStock,
    Discontinued,
}

impl ProductStatus {
    /// Whether the product can currently be added to an order.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// User role, a plain field rather than a type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    Customer,
}

impl UserRole {
    /// Admins may manage the catalogue, override order statuses, and update
    /// shipments.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_wire_labels() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).expect("serialize");
            assert_eq!(json, format!("\"{status}\""));
        }
        assert_eq!(
            serde_json::to_string(&OrderStatus::Refunded).expect("serialize"),
            "\"Refunded\""
        );
    }

    #[test]
    fn shipment_status_wire_labels() {
        assert_eq!(
            serde_json::to_string(&ShipmentStatus::InTransit).expect("serialize"),
            "\"in_transit\""
        );
        let parsed: ShipmentStatus =
            serde_json::from_str("\"preparing\"").expect("deserialize");
        assert_eq!(parsed, ShipmentStatus::Preparing);
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(!ShipmentStatus::Preparing.is_terminal());
    }

    #[test]
    fn address_labels_are_verbatim() {
        assert_eq!(
            serde_json::to_string(&AddressStatus::CurrentAddress).expect("serialize"),
            "\"CurrentAddress\""
        );
        assert_eq!(
            serde_json::to_string(&AddressType::DeliveryAddress).expect("serialize"),
            "\"DeliveryAddress\""
        );
    }
}
