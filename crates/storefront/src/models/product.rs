//! Catalogue types: products and their purchasable options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use madrona_core::{Price, ProductId, ProductOptionId, ProductStatus};

/// A catalogue product.
///
/// Read-only to the cart and checkout; mutation happens through the admin
/// catalogue routes only.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Image URLs.
    pub images: Vec<String>,
    /// Price before any option delta.
    pub base_price: Price,
    /// Availability.
    pub status: ProductStatus,
    /// Optional barcode.
    pub barcode: Option<String>,
    /// When the product was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// A purchasable variant of a product (size, capacity, ...).
///
/// Options are the unit stock is checked against, not the bare product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductOption {
    /// Unique option ID.
    pub id: ProductOptionId,
    /// Parent product.
    pub product_id: ProductId,
    /// Attribute name, e.g. "SIZE".
    pub attribute: String,
    /// Attribute value, e.g. "XL".
    pub value: String,
    /// Stock-keeping unit.
    pub sku: String,
    /// Units in stock (never negative).
    pub stock: i32,
    /// Price delta relative to the product base price; may be negative.
    pub extra: Price,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub base_price: Price,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub barcode: Option<String>,
}

/// Payload for updating a product; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub base_price: Option<Price>,
    pub status: Option<ProductStatus>,
    pub barcode: Option<String>,
}

/// Payload for creating a product option.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProductOption {
    pub attribute: String,
    pub value: String,
    pub sku: String,
    pub stock: i32,
    #[serde(default)]
    pub extra: Price,
}
