//! The shipment aggregate and its lifecycle state machine.
//!
//! `preparing → in_transit → delivered`, one shipment per order, addressed
//! to the order's delivery address. `shipped_at` is stamped exactly when the
//! shipment leaves `preparing` and is immutable afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use madrona_core::{AddressId, OrderId, ShipmentId, ShipmentStatus};

/// Minimum length of a tracking number, when one is set.
pub const MIN_TRACKING_NUMBER_LEN: usize = 10;

/// Minimum length of a carrier name, when one is set.
pub const MIN_CARRIER_LEN: usize = 5;

/// Errors from shipment mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShipmentError {
    /// The requested status change is not an edge of the lifecycle graph.
    #[error("invalid shipment transition from {from} to {to}")]
    InvalidTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    /// Tracking numbers are at least 10 characters.
    #[error("tracking number must be at least {MIN_TRACKING_NUMBER_LEN} characters, got {len}")]
    TrackingNumberTooShort { len: usize },

    /// Carrier names are at least 5 characters.
    #[error("carrier must be at least {MIN_CARRIER_LEN} characters, got {len}")]
    CarrierTooShort { len: usize },

    /// The ETA can no longer change once the shipment is delivered.
    #[error("cannot change the ETA of a delivered shipment")]
    EtaAfterDelivery,
}

/// A shipment, tied 1:1 to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    /// The order's delivery address.
    pub address_id: AddressId,
    pub status: ShipmentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub eta: Option<DateTime<Utc>>,
    /// Set exactly on the `preparing → in_transit` transition, never again.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    /// A fresh shipment in `preparing` with no carrier data yet.
    #[must_use]
    pub fn preparing(order_id: OrderId, address_id: AddressId, now: DateTime<Utc>) -> Self {
        Self {
            id: ShipmentId::generate(),
            order_id,
            address_id,
            status: ShipmentStatus::Preparing,
            carrier: None,
            tracking_number: None,
            eta: None,
            shipped_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the lifecycle one step.
    ///
    /// The only legal moves are `preparing → in_transit` (which stamps
    /// `shipped_at` with `now`) and `in_transit → delivered`. Anything else,
    /// including moving backwards or re-entering the current status, fails
    /// and leaves the shipment untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError::InvalidTransition`] for any non-edge.
    pub fn advance(
        &mut self,
        to: ShipmentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), ShipmentError> {
        match (self.status, to) {
            (ShipmentStatus::Preparing, ShipmentStatus::InTransit) => {
                self.shipped_at = Some(now);
            }
            (ShipmentStatus::InTransit, ShipmentStatus::Delivered) => {}
            (from, to) => return Err(ShipmentError::InvalidTransition { from, to }),
        }
        self.status = to;
        Ok(())
    }

    /// Set or clear the tracking number.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError::TrackingNumberTooShort`] for a value under
    /// 10 characters.
    pub fn set_tracking_number(
        &mut self,
        tracking_number: Option<String>,
    ) -> Result<(), ShipmentError> {
        if let Some(t) = &tracking_number {
            if t.chars().count() < MIN_TRACKING_NUMBER_LEN {
                return Err(ShipmentError::TrackingNumberTooShort {
                    len: t.chars().count(),
                });
            }
        }
        self.tracking_number = tracking_number;
        Ok(())
    }

    /// Set or clear the carrier.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError::CarrierTooShort`] for a value under 5
    /// characters.
    pub fn set_carrier(&mut self, carrier: Option<String>) -> Result<(), ShipmentError> {
        if let Some(c) = &carrier {
            if c.chars().count() < MIN_CARRIER_LEN {
                return Err(ShipmentError::CarrierTooShort {
                    len: c.chars().count(),
                });
            }
        }
        self.carrier = carrier;
        Ok(())
    }

    /// Set or change the ETA; allowed any time before delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError::EtaAfterDelivery`] once the shipment is
    /// delivered.
    pub fn set_eta(&mut self, eta: Option<DateTime<Utc>>) -> Result<(), ShipmentError> {
        if self.status.is_terminal() {
            return Err(ShipmentError::EtaAfterDelivery);
        }
        self.eta = eta;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipment() -> Shipment {
        Shipment::preparing(OrderId::generate(), AddressId::generate(), Utc::now())
    }

    #[test]
    fn entering_transit_stamps_shipped_at_exactly_once() {
        let mut s = shipment();
        assert_eq!(s.shipped_at, None);

        let now = Utc::now();
        s.advance(ShipmentStatus::InTransit, now).expect("ship");
        assert_eq!(s.shipped_at, Some(now));

        let later = now + chrono::Duration::hours(4);
        s.advance(ShipmentStatus::Delivered, later).expect("deliver");
        assert_eq!(s.shipped_at, Some(now), "delivery must not restamp");
    }

    #[test]
    fn non_edges_are_rejected_without_side_effects() {
        let cases = [
            (ShipmentStatus::Preparing, ShipmentStatus::Delivered),
            (ShipmentStatus::Preparing, ShipmentStatus::Preparing),
            (ShipmentStatus::InTransit, ShipmentStatus::Preparing),
            (ShipmentStatus::InTransit, ShipmentStatus::InTransit),
            (ShipmentStatus::Delivered, ShipmentStatus::Preparing),
            (ShipmentStatus::Delivered, ShipmentStatus::InTransit),
            (ShipmentStatus::Delivered, ShipmentStatus::Delivered),
        ];
        for (from, to) in cases {
            let mut s = shipment();
            s.status = from;
            let err = s.advance(to, Utc::now()).expect_err("must reject");
            assert_eq!(err, ShipmentError::InvalidTransition { from, to });
            assert_eq!(s.status, from);
            assert_eq!(s.shipped_at, None, "failed transition must not stamp");
        }
    }

    #[test]
    fn tracking_number_length_is_enforced() {
        let mut s = shipment();
        assert_eq!(
            s.set_tracking_number(Some("123456789".to_owned())),
            Err(ShipmentError::TrackingNumberTooShort { len: 9 })
        );
        assert_eq!(s.tracking_number, None);

        s.set_tracking_number(Some("1234567890".to_owned()))
            .expect("10 chars is enough");
        assert_eq!(s.tracking_number.as_deref(), Some("1234567890"));
    }

    #[test]
    fn carrier_length_is_enforced() {
        let mut s = shipment();
        assert_eq!(
            s.set_carrier(Some("UPS".to_owned())),
            Err(ShipmentError::CarrierTooShort { len: 3 })
        );
        s.set_carrier(Some("FedEx".to_owned())).expect("5 chars");
        assert_eq!(s.carrier.as_deref(), Some("FedEx"));
    }

    #[test]
    fn eta_is_mutable_until_delivery() {
        let mut s = shipment();
        let eta = Utc::now() + chrono::Duration::days(3);
        s.set_eta(Some(eta)).expect("set while preparing");

        s.advance(ShipmentStatus::InTransit, Utc::now()).expect("ship");
        s.set_eta(Some(eta + chrono::Duration::days(1)))
            .expect("set while in transit");

        s.advance(ShipmentStatus::Delivered, Utc::now())
            .expect("deliver");
        assert_eq!(s.set_eta(None), Err(ShipmentError::EtaAfterDelivery));
    }
}
