//! Invoices: a flat-taxed view of a placed order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use madrona_core::{InvoiceId, OrderId, Price};

use super::order::Order;

/// An invoice generated for an order.
///
/// One per order; generation is ensure-style and idempotent at the
/// persistence layer. Tax is a single flat rate captured at issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub order_id: OrderId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub issued_at: DateTime<Utc>,
    pub tax_rate: Decimal,
    pub total_with_tax: Price,
}

impl Invoice {
    /// Issue an invoice for an order at the given flat tax rate.
    ///
    /// `total_with_tax` is `order.total × (1 + tax_rate)`, computed with
    /// exact decimal arithmetic.
    #[must_use]
    pub fn for_order(order: &Order, tax_rate: Decimal, issued_at: DateTime<Utc>) -> Self {
        Self {
            id: InvoiceId::generate(),
            order_id: order.id,
            issued_at,
            tax_rate,
            total_with_tax: order.total * (Decimal::ONE + tax_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use madrona_core::{AddressId, OrderStatus, UserId};

    use super::*;

    #[test]
    fn total_with_tax_applies_the_flat_rate_exactly() {
        let order = Order {
            id: OrderId::generate(),
            user_id: UserId::generate(),
            status: OrderStatus::Pending,
            total: Price::from_cents(250_00),
            items: Vec::new(),
            billing_address_id: AddressId::generate(),
            delivery_address_id: AddressId::generate(),
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let rate: Decimal = "0.10".parse().expect("decimal");
        let invoice = Invoice::for_order(&order, rate, Utc::now());
        assert_eq!(invoice.total_with_tax, Price::from_cents(275_00));
        assert_eq!(invoice.tax_rate, rate);
    }
}
