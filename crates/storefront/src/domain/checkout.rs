//! The checkout validator.
//!
//! Converts a cart snapshot plus a submitted address pair into an
//! [`OrderDraft`] ready for persistence, or rejects the whole checkout with
//! every violation it found. Rejection carries no side effects - nothing is
//! persisted until the draft is committed by the checkout service, and the
//! final stock guard is re-applied transactionally there.
//!
//! Validation runs in two passes. The shape pass checks every item and
//! address field and collects all violations rather than stopping at the
//! first. Only when the shapes are sound does the live pass re-check the
//! catalogue: unknown or unavailable products, price drift since the item
//! was added, per-option stock, and the submitted total against the exact
//! recomputed sum. Insufficient lines are reported together so the customer
//! can correct all of them in one pass.

use serde::Serialize;
use thiserror::Error;

use madrona_core::{AddressType, Price};

use crate::db::RepositoryError;
use crate::models::AddressDraft;

use super::cart::CartItem;
use super::catalogue::CatalogueView;

/// Minimum title length for an order line.
const MIN_TITLE_LEN: usize = 3;

/// Minimum postcode length.
const MIN_POSTCODE_LEN: usize = 4;

/// A single checkout violation.
///
/// Serialized with a `kind` tag so API clients can dispatch on the
/// violation class without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A field failed shape validation or live re-validation.
    Validation { path: String, message: String },

    /// A line requests more units than the option has in stock.
    InsufficientStock {
        path: String,
        title: String,
        requested: i32,
        available: i32,
        shortfall: i32,
    },

    /// The request did not carry exactly one billing and one delivery
    /// address.
    AddressCount { message: String },
}

impl Violation {
    fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A rejected checkout: the full violation set, nothing persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("checkout rejected with {} violation(s)", violations.len())]
pub struct CheckoutRejected {
    pub violations: Vec<Violation>,
}

/// Checkout validation outcome.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Domain-rule violations; recoverable by the customer.
    #[error(transparent)]
    Rejected(#[from] CheckoutRejected),

    /// The catalogue could not be read.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Exactly one billing and one delivery address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPair {
    pub billing: AddressDraft,
    pub delivery: AddressDraft,
}

impl AddressPair {
    /// Split submitted drafts into the billing/delivery pair.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation::AddressCount`] unless the input is exactly
    /// one address of each type.
    pub fn from_drafts(drafts: &[AddressDraft]) -> Result<Self, Violation> {
        let billing: Vec<_> = drafts
            .iter()
            .filter(|a| a.kind == AddressType::BillingAddress)
            .collect();
        let delivery: Vec<_> = drafts
            .iter()
            .filter(|a| a.kind == AddressType::DeliveryAddress)
            .collect();

        match (billing.as_slice(), delivery.as_slice(), drafts.len()) {
            ([b], [d], 2) => Ok(Self {
                billing: (*b).clone(),
                delivery: (*d).clone(),
            }),
            _ => Err(Violation::AddressCount {
                message: format!(
                    "expected exactly one billing and one delivery address, got {} address(es)",
                    drafts.len()
                ),
            }),
        }
    }
}

/// A validated checkout, ready for order creation.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    /// Validated item snapshot (frozen; not live cart references).
    pub items: Vec<CartItem>,
    /// Validated billing/delivery pair.
    pub addresses: AddressPair,
    /// Exact recomputed total.
    pub total: Price,
}

/// The checkout validator, generic over its read-only catalogue seam.
pub struct CheckoutValidator<C> {
    catalogue: C,
}

impl<C: CatalogueView> CheckoutValidator<C> {
    /// Create a validator over the given catalogue view.
    #[must_use]
    pub const fn new(catalogue: C) -> Self {
        Self { catalogue }
    }

    /// Validate a cart snapshot, a submitted total, and an address pair.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Rejected`] with every collected violation,
    /// or [`CheckoutError::Storage`] if the catalogue could not be read.
    pub async fn validate(
        &self,
        items: &[CartItem],
        addresses: &[AddressDraft],
        submitted_total: Price,
    ) -> Result<OrderDraft, CheckoutError> {
        let mut violations = Vec::new();

        // Pass 1: shape.
        if items.is_empty() {
            violations.push(Violation::validation("items", "cart is empty"));
        }
        for (i, item) in items.iter().enumerate() {
            item_shape_violations(item, i, &mut violations);
        }
        for (i, address) in addresses.iter().enumerate() {
            address_violations(address, &format!("addresses[{i}]"), &mut violations);
        }
        let pair = match AddressPair::from_drafts(addresses) {
            Ok(pair) => Some(pair),
            Err(violation) => {
                violations.push(violation);
                None
            }
        };
        if !violations.is_empty() {
            return Err(CheckoutRejected { violations }.into());
        }
        let Some(pair) = pair else {
            return Err(CheckoutRejected { violations }.into());
        };

        // Pass 2: live re-validation against the catalogue.
        for (i, item) in items.iter().enumerate() {
            self.check_item_against_catalogue(item, i, &mut violations)
                .await?;
        }

        let computed: Price = items.iter().map(CartItem::line_total).sum();
        if computed != submitted_total {
            violations.push(Violation::validation(
                "total",
                format!("submitted total {submitted_total} does not match computed total {computed}"),
            ));
        }

        if violations.is_empty() {
            Ok(OrderDraft {
                items: items.to_vec(),
                addresses: pair,
                total: computed,
            })
        } else {
            Err(CheckoutRejected { violations }.into())
        }
    }

    async fn check_item_against_catalogue(
        &self,
        item: &CartItem,
        index: usize,
        violations: &mut Vec<Violation>,
    ) -> Result<(), RepositoryError> {
        let path = format!("items[{index}]");

        let Some(product) = self.catalogue.product(item.product_id).await? else {
            violations.push(Violation::validation(path, "unknown product"));
            return Ok(());
        };

        if !product.status.is_purchasable() {
            violations.push(Violation::validation(
                path.clone(),
                format!("\"{}\" is not available for purchase", product.title),
            ));
        } else if product.base_price != item.base_price {
            violations.push(Violation::validation(
                format!("{path}.base_price"),
                format!("price of \"{}\" has changed", product.title),
            ));
        }

        let Some(option_id) = item.product_option_id else {
            return Ok(());
        };

        let Some(option) = self.catalogue.option(option_id).await? else {
            violations.push(Violation::validation(
                format!("{path}.product_option_id"),
                "unknown product option",
            ));
            return Ok(());
        };

        if option.product_id != item.product_id {
            violations.push(Violation::validation(
                format!("{path}.product_option_id"),
                "option does not belong to the product",
            ));
            return Ok(());
        }

        if option.extra != item.extra_price {
            violations.push(Violation::validation(
                format!("{path}.extra_price"),
                format!("option price of \"{}\" has changed", item.title),
            ));
        }

        // Stock is checked per option; product-only lines are not stock
        // tracked.
        if option.stock < item.quantity {
            violations.push(Violation::InsufficientStock {
                path,
                title: item.title.clone(),
                requested: item.quantity,
                available: option.stock,
                shortfall: item.quantity - option.stock,
            });
        }

        Ok(())
    }
}

fn item_shape_violations(item: &CartItem, index: usize, violations: &mut Vec<Violation>) {
    let path = format!("items[{index}]");

    if item.product_id.is_nil() {
        violations.push(Violation::validation(
            format!("{path}.product_id"),
            "product id is required",
        ));
    }
    if item.title.trim().chars().count() < MIN_TITLE_LEN {
        violations.push(Violation::validation(
            format!("{path}.title"),
            format!("title must be at least {MIN_TITLE_LEN} characters"),
        ));
    }
    if !item.base_price.is_positive() {
        violations.push(Violation::validation(
            format!("{path}.base_price"),
            "base price must be positive",
        ));
    }
    if !item.extra_price.is_non_negative() {
        violations.push(Violation::validation(
            format!("{path}.extra_price"),
            "extra price must not be negative",
        ));
    }
    if item.quantity < 1 {
        violations.push(Violation::validation(
            format!("{path}.quantity"),
            "quantity must be at least 1",
        ));
    }
}

/// Collect shape violations for one address draft.
///
/// Also used by the standalone address routes so the form and the checkout
/// enforce identical rules.
pub fn address_violations(address: &AddressDraft, path: &str, violations: &mut Vec<Violation>) {
    let required = [
        ("full_name", &address.full_name),
        ("address_line1", &address.address_line1),
        ("city", &address.city),
        ("state", &address.state),
        ("country", &address.country),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            violations.push(Violation::validation(
                format!("{path}.{field}"),
                format!("{field} is required"),
            ));
        }
    }
    if address.postcode.trim().chars().count() < MIN_POSTCODE_LEN {
        violations.push(Violation::validation(
            format!("{path}.postcode"),
            format!("postcode must be at least {MIN_POSTCODE_LEN} characters"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use madrona_core::{CartItemId, ProductId, ProductOptionId, ProductStatus};

    use crate::domain::catalogue::testing::InMemoryCatalogue;
    use crate::models::{Product, ProductOption};

    use super::*;

    fn product(title: &str, cents: i64) -> Product {
        Product {
            id: ProductId::generate(),
            title: title.to_owned(),
            description: String::new(),
            images: Vec::new(),
            base_price: Price::from_cents(cents),
            status: ProductStatus::Available,
            barcode: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn option_for(product: &Product, extra_cents: i64, stock: i32) -> ProductOption {
        ProductOption {
            id: ProductOptionId::generate(),
            product_id: product.id,
            attribute: "SIZE".to_owned(),
            value: "XL".to_owned(),
            sku: "SKU-1".to_owned(),
            stock,
            extra: Price::from_cents(extra_cents),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product: &Product, option: Option<&ProductOption>, quantity: i32) -> CartItem {
        CartItem {
            id: CartItemId::generate(),
            product_id: product.id,
            product_option_id: option.map(|o| o.id),
            title: product.title.clone(),
            base_price: product.base_price,
            extra_price: option.map_or(Price::ZERO, |o| o.extra),
            quantity,
        }
    }

    fn address(kind: AddressType) -> AddressDraft {
        AddressDraft {
            kind,
            full_name: "Jordan Example".to_owned(),
            address_line1: "1 High Street".to_owned(),
            address_line2: None,
            city: "Hobart".to_owned(),
            state: "TAS".to_owned(),
            postcode: "7000".to_owned(),
            country: "Australia".to_owned(),
        }
    }

    fn address_pair() -> Vec<AddressDraft> {
        vec![
            address(AddressType::BillingAddress),
            address(AddressType::DeliveryAddress),
        ]
    }

    #[tokio::test]
    async fn valid_checkout_produces_a_draft_with_the_exact_total() {
        let shirt = product("Linen Shirt", 100_00);
        let xl = option_for(&shirt, 25_00, 5);
        let items = vec![line(&shirt, Some(&xl), 2)];
        let catalogue = InMemoryCatalogue::default()
            .with_product(shirt)
            .with_option(xl);

        let validator = CheckoutValidator::new(catalogue);
        let draft = validator
            .validate(&items, &address_pair(), Price::from_cents(250_00))
            .await
            .expect("valid checkout");

        assert_eq!(draft.total, Price::from_cents(250_00));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.addresses.billing.kind, AddressType::BillingAddress);
        assert_eq!(draft.addresses.delivery.kind, AddressType::DeliveryAddress);
    }

    #[tokio::test]
    async fn insufficient_stock_is_rejected_naming_the_line_and_shortfall() {
        let shirt = product("Linen Shirt", 100_00);
        let xl = option_for(&shirt, 0, 2);
        let items = vec![line(&shirt, Some(&xl), 3)];
        let catalogue = InMemoryCatalogue::default()
            .with_product(shirt)
            .with_option(xl);

        let validator = CheckoutValidator::new(catalogue);
        let err = validator
            .validate(&items, &address_pair(), Price::from_cents(300_00))
            .await
            .expect_err("must reject");

        let CheckoutError::Rejected(rejected) = err else {
            panic!("expected rejection, got storage error");
        };
        assert_eq!(
            rejected.violations,
            vec![Violation::InsufficientStock {
                path: "items[0]".to_owned(),
                title: "Linen Shirt".to_owned(),
                requested: 3,
                available: 2,
                shortfall: 1,
            }]
        );
    }

    #[tokio::test]
    async fn all_insufficient_lines_are_reported_together() {
        let shirt = product("Linen Shirt", 100_00);
        let hat = product("Straw Hat", 40_00);
        let xl = option_for(&shirt, 0, 1);
        let small = option_for(&hat, 0, 0);
        let items = vec![line(&shirt, Some(&xl), 2), line(&hat, Some(&small), 1)];
        let catalogue = InMemoryCatalogue::default()
            .with_product(shirt)
            .with_product(hat)
            .with_option(xl)
            .with_option(small);

        let validator = CheckoutValidator::new(catalogue);
        let err = validator
            .validate(&items, &address_pair(), Price::from_cents(240_00))
            .await
            .expect_err("must reject");

        let CheckoutError::Rejected(rejected) = err else {
            panic!("expected rejection");
        };
        let stock_violations = rejected
            .violations
            .iter()
            .filter(|v| matches!(v, Violation::InsufficientStock { .. }))
            .count();
        assert_eq!(stock_violations, 2, "no partial reporting");
    }

    #[tokio::test]
    async fn shape_violations_are_collected_not_short_circuited() {
        let items = vec![CartItem {
            id: CartItemId::generate(),
            product_id: ProductId::generate(),
            product_option_id: None,
            title: "ab".to_owned(),
            base_price: Price::ZERO,
            extra_price: Price::from_cents(-1),
            quantity: 0,
        }];
        let mut addresses = address_pair();
        if let Some(billing) = addresses.first_mut() {
            billing.postcode = "123".to_owned();
            billing.city = String::new();
        }

        let validator = CheckoutValidator::new(InMemoryCatalogue::default());
        let err = validator
            .validate(&items, &addresses, Price::ZERO)
            .await
            .expect_err("must reject");

        let CheckoutError::Rejected(rejected) = err else {
            panic!("expected rejection");
        };
        let paths: Vec<_> = rejected
            .violations
            .iter()
            .filter_map(|v| match v {
                Violation::Validation { path, .. } => Some(path.as_str()),
                _ => None,
            })
            .collect();
        assert!(paths.contains(&"items[0].title"));
        assert!(paths.contains(&"items[0].base_price"));
        assert!(paths.contains(&"items[0].extra_price"));
        assert!(paths.contains(&"items[0].quantity"));
        assert!(paths.contains(&"addresses[0].city"));
        assert!(paths.contains(&"addresses[0].postcode"));
    }

    #[tokio::test]
    async fn two_delivery_addresses_fail_the_count_rule() {
        let shirt = product("Linen Shirt", 100_00);
        let items = vec![line(&shirt, None, 1)];
        let catalogue = InMemoryCatalogue::default().with_product(shirt);
        let addresses = vec![
            address(AddressType::DeliveryAddress),
            address(AddressType::DeliveryAddress),
        ];

        let validator = CheckoutValidator::new(catalogue);
        let err = validator
            .validate(&items, &addresses, Price::from_cents(100_00))
            .await
            .expect_err("must reject");

        let CheckoutError::Rejected(rejected) = err else {
            panic!("expected rejection");
        };
        assert!(matches!(
            rejected.violations.as_slice(),
            [Violation::AddressCount { .. }]
        ));
    }

    #[tokio::test]
    async fn stale_submitted_total_is_rejected() {
        let shirt = product("Linen Shirt", 100_00);
        let items = vec![line(&shirt, None, 1)];
        let catalogue = InMemoryCatalogue::default().with_product(shirt);

        let validator = CheckoutValidator::new(catalogue);
        let err = validator
            .validate(&items, &address_pair(), Price::from_cents(99_00))
            .await
            .expect_err("must reject");

        let CheckoutError::Rejected(rejected) = err else {
            panic!("expected rejection");
        };
        assert!(matches!(
            rejected.violations.as_slice(),
            [Violation::Validation { path, .. }] if path == "total"
        ));
    }

    #[tokio::test]
    async fn price_drift_since_add_time_is_rejected() {
        let mut shirt = product("Linen Shirt", 100_00);
        let items = vec![line(&shirt, None, 1)];
        // The catalogue price moved after the line was added.
        shirt.base_price = Price::from_cents(120_00);
        let catalogue = InMemoryCatalogue::default().with_product(shirt);

        let validator = CheckoutValidator::new(catalogue);
        let err = validator
            .validate(&items, &address_pair(), Price::from_cents(100_00))
            .await
            .expect_err("must reject");

        let CheckoutError::Rejected(rejected) = err else {
            panic!("expected rejection");
        };
        assert!(matches!(
            rejected.violations.first(),
            Some(Violation::Validation { path, .. }) if path == "items[0].base_price"
        ));
    }

    #[tokio::test]
    async fn unavailable_product_is_rejected() {
        let mut shirt = product("Linen Shirt", 100_00);
        let items = vec![line(&shirt, None, 1)];
        shirt.status = ProductStatus::Discontinued;
        let catalogue = InMemoryCatalogue::default().with_product(shirt);

        let validator = CheckoutValidator::new(catalogue);
        assert!(
            validator
                .validate(&items, &address_pair(), Price::from_cents(100_00))
                .await
                .is_err()
        );
    }
}
