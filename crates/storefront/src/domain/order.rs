//! The order aggregate and its lifecycle state machine.
//!
//! ```text
//! Pending ──mark_paid──▶ Paid ──mark_shipped──▶ Shipped ──mark_delivered──▶ Delivered
//!    │                     │                       │
//!    └──────refund─────────┴─────────refund────────┘──▶ Refunded
//! ```
//!
//! `Delivered` and `Refunded` are terminal. Transitions are checked against
//! the graph and never silently coerced: an out-of-order attempt fails with
//! [`InvalidTransition`] and leaves the status unchanged. Operators can
//! bypass the graph through the fulfillment service's override path, which
//! is audit-logged separately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use madrona_core::{
    AddressId, OrderId, OrderItemId, OrderStatus, Price, ProductId, ProductOptionId, UserId,
};

/// A frozen line of an order, copied from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_option_id: Option<ProductOptionId>,
    pub title: String,
    pub base_price: Price,
    pub extra_price: Price,
    pub quantity: i32,
}

/// An order: the immutable outcome of a checkout plus a status machine.
///
/// Items and addresses are snapshots - later catalogue or address edits do
/// not reach into a placed order. After creation only `status` (and the
/// accompanying `version`/`updated_at`) ever change.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Price,
    pub items: Vec<OrderItem>,
    pub billing_address_id: AddressId,
    pub delivery_address_id: AddressId,
    /// Optimistic-concurrency token; bumped on every status write.
    pub version: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// A rule-driven order transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTransition {
    MarkPaid,
    MarkShipped,
    MarkDelivered,
    Refund,
}

impl OrderTransition {
    /// The status this transition lands in.
    #[must_use]
    pub const fn target(self) -> OrderStatus {
        match self {
            Self::MarkPaid => OrderStatus::Paid,
            Self::MarkShipped => OrderStatus::Shipped,
            Self::MarkDelivered => OrderStatus::Delivered,
            Self::Refund => OrderStatus::Refunded,
        }
    }

    /// Whether this transition may fire from `from`.
    #[must_use]
    pub const fn allowed_from(self, from: OrderStatus) -> bool {
        matches!(
            (self, from),
            (Self::MarkPaid, OrderStatus::Pending)
                | (Self::MarkShipped, OrderStatus::Paid)
                | (Self::MarkDelivered, OrderStatus::Shipped)
                | (
                    Self::Refund,
                    OrderStatus::Pending | OrderStatus::Paid | OrderStatus::Shipped
                )
        )
    }

    /// Compute the successor status, or fail without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the transition is not an edge of
    /// the lifecycle graph at `from`.
    pub const fn apply(self, from: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        if self.allowed_from(from) {
            Ok(self.target())
        } else {
            Err(InvalidTransition {
                from,
                transition: self,
            })
        }
    }
}

impl std::fmt::Display for OrderTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkPaid => write!(f, "mark_paid"),
            Self::MarkShipped => write!(f, "mark_shipped"),
            Self::MarkDelivered => write!(f, "mark_delivered"),
            Self::Refund => write!(f, "refund"),
        }
    }
}

/// A transition attempted outside the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition {transition} from status {from}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub transition: OrderTransition,
}

impl Order {
    /// Apply a rule-driven transition in place.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] and leaves the order untouched when the
    /// transition is not allowed from the current status.
    pub fn apply(&mut self, transition: OrderTransition) -> Result<(), InvalidTransition> {
        self.status = transition.apply(self.status)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSITIONS: [OrderTransition; 4] = [
        OrderTransition::MarkPaid,
        OrderTransition::MarkShipped,
        OrderTransition::MarkDelivered,
        OrderTransition::Refund,
    ];

    fn order_in(status: OrderStatus) -> Order {
        Order {
            id: OrderId::generate(),
            user_id: UserId::generate(),
            status,
            total: Price::from_cents(100_00),
            items: Vec::new(),
            billing_address_id: AddressId::generate(),
            delivery_address_id: AddressId::generate(),
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn happy_path_walks_the_whole_graph() {
        let mut order = order_in(OrderStatus::Pending);
        order.apply(OrderTransition::MarkPaid).expect("pay");
        order.apply(OrderTransition::MarkShipped).expect("ship");
        order.apply(OrderTransition::MarkDelivered).expect("deliver");
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn refund_is_reachable_from_every_non_terminal_state() {
        for status in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Shipped] {
            let mut order = order_in(status);
            order.apply(OrderTransition::Refund).expect("refund");
            assert_eq!(order.status, OrderStatus::Refunded);
        }
        for status in [OrderStatus::Delivered, OrderStatus::Refunded] {
            let mut order = order_in(status);
            assert!(order.apply(OrderTransition::Refund).is_err());
            assert_eq!(order.status, status);
        }
    }

    #[test]
    fn every_disallowed_pair_fails_and_leaves_status_unchanged() {
        for from in OrderStatus::ALL {
            for transition in TRANSITIONS {
                if transition.allowed_from(from) {
                    continue;
                }
                let mut order = order_in(from);
                let err = order.apply(transition).expect_err("must reject");
                assert_eq!(err, InvalidTransition { from, transition });
                assert_eq!(order.status, from, "status must not move on failure");
            }
        }
    }

    #[test]
    fn skipping_ahead_is_rejected() {
        // Pending → Shipped directly is the canonical out-of-order attempt.
        let mut order = order_in(OrderStatus::Pending);
        assert!(order.apply(OrderTransition::MarkShipped).is_err());
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn terminal_states_reject_everything() {
        for from in [OrderStatus::Delivered, OrderStatus::Refunded] {
            for transition in TRANSITIONS {
                assert!(!transition.allowed_from(from));
            }
        }
    }
}
