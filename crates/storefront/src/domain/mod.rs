//! The order & cart domain engine.
//!
//! Everything with real invariants lives here: how a cart accumulates lines,
//! how a cart plus addresses becomes an order at checkout, and the state
//! machines governing an order's and a shipment's lifecycle afterwards. The
//! modules are pure domain logic - persistence stays behind
//! [`crate::db`], and the only seam into storage is the read-only
//! [`catalogue::CatalogueView`] trait used for live stock and price checks.

pub mod cart;
pub mod catalogue;
pub mod checkout;
pub mod invoice;
pub mod order;
pub mod shipment;

pub use cart::{Cart, CartError, CartItem};
pub use catalogue::CatalogueView;
pub use checkout::{
    AddressPair, CheckoutError, CheckoutRejected, CheckoutValidator, OrderDraft, Violation,
};
pub use invoice::Invoice;
pub use order::{InvalidTransition, Order, OrderItem, OrderTransition};
pub use shipment::{Shipment, ShipmentError};
