//! Read-only catalogue and inventory view.
//!
//! The cart routes and the checkout validator look up products, options, and
//! live stock through this trait rather than a concrete repository, so the
//! validator can be exercised against an in-memory catalogue in tests. The
//! Postgres implementation lives on [`crate::db::ProductRepository`].

use async_trait::async_trait;

use madrona_core::{ProductId, ProductOptionId};

use crate::db::RepositoryError;
use crate::models::{Product, ProductOption};

/// Pure read access to the catalogue.
///
/// Absence is `None`, never an error - callers decide whether a missing
/// entity is fatal. Only storage failures surface as `RepositoryError`.
#[async_trait]
pub trait CatalogueView: Send + Sync {
    /// Look up a product by ID.
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Look up a product option by ID.
    async fn option(
        &self,
        id: ProductOptionId,
    ) -> Result<Option<ProductOption>, RepositoryError>;

    /// All options of a product, grouped by attribute in the UI.
    async fn options_for_product(
        &self,
        id: ProductId,
    ) -> Result<Vec<ProductOption>, RepositoryError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory catalogue for validator tests.

    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryCatalogue {
        products: HashMap<ProductId, Product>,
        options: HashMap<ProductOptionId, ProductOption>,
    }

    impl InMemoryCatalogue {
        pub fn with_product(mut self, product: Product) -> Self {
            self.products.insert(product.id, product);
            self
        }

        pub fn with_option(mut self, option: ProductOption) -> Self {
            self.options.insert(option.id, option);
            self
        }
    }

    #[async_trait]
    impl CatalogueView for InMemoryCatalogue {
        async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            Ok(self.products.get(&id).cloned())
        }

        async fn option(
            &self,
            id: ProductOptionId,
        ) -> Result<Option<ProductOption>, RepositoryError> {
            Ok(self.options.get(&id).cloned())
        }

        async fn options_for_product(
            &self,
            id: ProductId,
        ) -> Result<Vec<ProductOption>, RepositoryError> {
            Ok(self
                .options
                .values()
                .filter(|o| o.product_id == id)
                .cloned()
                .collect())
        }
    }
}
