//! Orchestration services.
//!
//! Services sit between the HTTP handlers and the repositories: they run
//! the domain rules, decide what gets persisted, and own the audit logging.
//! Handlers stay thin and repositories stay dumb.

pub mod checkout;
pub mod fulfillment;

pub use checkout::{CheckoutFailure, CheckoutService};
pub use fulfillment::{FulfillmentError, FulfillmentService, ShipmentPatch};
