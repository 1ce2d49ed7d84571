//! The cart engine.
//!
//! A cart is an ordered sequence of lines keyed by (product id, option id);
//! adding the same pair twice merges into one line with the summed quantity.
//! The engine itself is synchronous and storage-agnostic: it mutates an
//! in-memory [`Cart`] and never touches inventory. Concurrent writers from
//! multiple tabs resolve last-write-wins at the persistence layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use madrona_core::{CartId, CartItemId, Price, ProductId, ProductOptionId};

use crate::models::{Product, ProductOption};

/// Errors from cart mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The product or option handed to `add_item` is not addressable.
    #[error("invalid item: {0}")]
    InvalidItem(&'static str),
}

/// One (product, option, quantity) line in a cart.
///
/// Title and prices are denormalized at add time so a placed order's
/// snapshot survives later catalogue edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_option_id: Option<ProductOptionId>,
    pub title: String,
    pub base_price: Price,
    pub extra_price: Price,
    pub quantity: i32,
}

impl CartItem {
    /// The line's contribution to the cart total.
    #[must_use]
    pub fn line_total(&self) -> Price {
        (self.base_price + self.extra_price).times(self.quantity)
    }

    /// Merge identity: two lines with the same key are one line.
    #[must_use]
    pub const fn merge_key(&self) -> (ProductId, Option<ProductOptionId>) {
        (self.product_id, self.product_option_id)
    }
}

/// A customer's cart.
///
/// `id` stays `None` until the cart is first persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Option<CartId>,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty, never-persisted cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            id: None,
            items: Vec::new(),
        }
    }

    /// Add `quantity` units of a product (optionally a specific option).
    ///
    /// If a line with the same (product id, option id) already exists its
    /// quantity is incremented; otherwise a new line is appended with a
    /// fresh ID, the denormalized title, the product base price, and the
    /// option's extra delta (zero when no option is chosen).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidItem`] when the product or option lacks a
    /// usable ID, the option belongs to a different product, or the
    /// quantity is below one.
    pub fn add_item(
        &mut self,
        product: &Product,
        option: Option<&ProductOption>,
        quantity: i32,
    ) -> Result<CartItemId, CartError> {
        if product.id.is_nil() {
            return Err(CartError::InvalidItem("product has no id"));
        }
        if let Some(opt) = option {
            if opt.id.is_nil() {
                return Err(CartError::InvalidItem("product option has no id"));
            }
            if opt.product_id != product.id {
                return Err(CartError::InvalidItem(
                    "product option belongs to a different product",
                ));
            }
        }
        if quantity < 1 {
            return Err(CartError::InvalidItem("quantity must be at least 1"));
        }

        let key = (product.id, option.map(|o| o.id));
        if let Some(line) = self.items.iter_mut().find(|i| i.merge_key() == key) {
            line.quantity += quantity;
            return Ok(line.id);
        }

        let id = CartItemId::generate();
        self.items.push(CartItem {
            id,
            product_id: product.id,
            product_option_id: option.map(|o| o.id),
            title: product.title.clone(),
            base_price: product.base_price,
            extra_price: option.map_or(Price::ZERO, |o| o.extra),
            quantity,
        });
        Ok(id)
    }

    /// Remove a line, or part of one.
    ///
    /// With a quantity, the line is decremented and dropped once it reaches
    /// zero (it never goes negative). Without one, the line is dropped
    /// outright regardless of quantity. Returns `true` if anything changed.
    pub fn remove_item(&mut self, item_id: CartItemId, quantity: Option<i32>) -> bool {
        let Some(pos) = self.items.iter().position(|i| i.id == item_id) else {
            return false;
        };

        if let Some(q) = quantity {
            if q <= 0 {
                return false;
            }
            if let Some(line) = self.items.get_mut(pos) {
                if q < line.quantity {
                    line.quantity -= q;
                    return true;
                }
            }
        }

        self.items.remove(pos);
        true
    }

    /// Replace the whole line list (the last-write-wins save path).
    ///
    /// Incoming lines that share a (product id, option id) pair are folded
    /// into one line with the summed quantity, preserving the merge
    /// invariant for payloads assembled outside the engine. Lines with a
    /// non-positive quantity are dropped.
    pub fn replace_items(&mut self, items: Vec<CartItem>) {
        self.items.clear();
        for item in items {
            if item.quantity < 1 {
                continue;
            }
            if let Some(existing) = self
                .items
                .iter_mut()
                .find(|i| i.merge_key() == item.merge_key())
            {
                existing.quantity += item.quantity;
            } else {
                self.items.push(item);
            }
        }
    }

    /// Exact decimal total: Σ quantity × (base + extra).
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// A deep copy of the lines, used to freeze cart contents into an
    /// order. The copy shares nothing with the live cart, so later cart
    /// mutation cannot retroactively change a placed order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.clone()
    }

    /// Drop every line (the cart survives checkout empty).
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of lines (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use madrona_core::ProductStatus;

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
            sku: "SKU-XL".to_owned(),
            stock,
            extra: Price::from_cents(extra_cents),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn repeated_adds_merge_into_one_line() {
        let mut cart = Cart::empty();
        let shirt = product("Shirt", 10_00);
        let xl = option_for(&shirt, 2_00, 10);

        for q in [1, 2, 4] {
            cart.add_item(&shirt, Some(&xl), q).expect("add");
        }

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items[0].quantity, 7);
    }

    #[test]
    fn distinct_options_get_distinct_lines() {
        let mut cart = Cart::empty();
        let shirt = product("Shirt", 10_00);
        let xl = option_for(&shirt, 2_00, 10);
        let xxl = option_for(&shirt, 3_00, 10);

        cart.add_item(&shirt, Some(&xl), 1).expect("add");
        cart.add_item(&shirt, Some(&xxl), 1).expect("add");
        cart.add_item(&shirt, None, 1).expect("add");

        assert_eq!(cart.len(), 3);
    }

    #[test]
    fn add_rejects_nil_ids_and_foreign_options() {
        let mut cart = Cart::empty();
        let mut shirt = product("Shirt", 10_00);
        let other = product("Hat", 5_00);
        let foreign = option_for(&other, 0, 1);

        assert_eq!(
            cart.add_item(&shirt, Some(&foreign), 1),
            Err(CartError::InvalidItem(
                "product option belongs to a different product"
            ))
        );
        assert_eq!(
            cart.add_item(&shirt, None, 0),
            Err(CartError::InvalidItem("quantity must be at least 1"))
        );

        shirt.id = ProductId::new(uuid::Uuid::nil());
        assert_eq!(
            cart.add_item(&shirt, None, 1),
            Err(CartError::InvalidItem("product has no id"))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn total_is_exact_over_decimal_unfriendly_prices() {
        let mut cart = Cart::empty();
        // 0.10, 0.20, 0.30: the classic binary-float drift trio
        for (cents, qty) in [(10, 1), (20, 1), (30, 1)] {
            let p = product("Sticker", cents);
            cart.add_item(&p, None, qty).expect("add");
        }
        assert_eq!(cart.total(), Price::from_cents(60));

        let mut bulk = Cart::empty();
        let p = product("Sticker", 10);
        bulk.add_item(&p, None, 3).expect("add");
        assert_eq!(bulk.total(), Price::from_cents(30));
    }

    #[test]
    fn snapshot_does_not_alias_the_live_cart() {
        let mut cart = Cart::empty();
        let shirt = product("Shirt", 10_00);
        cart.add_item(&shirt, None, 2).expect("add");

        let snapshot = cart.snapshot();
        cart.add_item(&shirt, None, 5).expect("add");
        cart.items[0].title = "Renamed".to_owned();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].quantity, 2);
        assert_eq!(snapshot[0].title, "Shirt");
    }

    #[test]
    fn replace_items_folds_duplicate_keys_and_drops_empty_lines() {
        let mut cart = Cart::empty();
        let shirt = product("Shirt", 10_00);
        let duplicate = |q: i32| CartItem {
            id: CartItemId::generate(),
            product_id: shirt.id,
            product_option_id: None,
            title: shirt.title.clone(),
            base_price: shirt.base_price,
            extra_price: Price::ZERO,
            quantity: q,
        };

        cart.replace_items(vec![duplicate(2), duplicate(3), duplicate(0)]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn remove_without_quantity_drops_the_line() {
        let mut cart = Cart::empty();
        let shirt = product("Shirt", 10_00);
        cart.add_item(&shirt, None, 5).expect("add");
        let id = cart.items[0].id;

        assert!(cart.remove_item(id, None));
        assert!(cart.is_empty());
        assert!(!cart.remove_item(id, None));
    }

    #[test]
    fn remove_with_quantity_decrements_and_floors_at_zero() {
        let mut cart = Cart::empty();
        let shirt = product("Shirt", 10_00);
        cart.add_item(&shirt, None, 5).expect("add");
        let id = cart.items[0].id;

        assert!(cart.remove_item(id, Some(2)));
        assert_eq!(cart.items[0].quantity, 3);

        // removing at least the remaining quantity drops the line
        assert!(cart.remove_item(id, Some(10)));
        assert!(cart.is_empty());
    }
}
