//! Catalogue repository: products and their options.
//!
//! Also the Postgres implementation of [`CatalogueView`], the read-only
//! seam the cart routes and checkout validator consume.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use madrona_core::{Price, ProductId, ProductOptionId, ProductStatus};

use crate::domain::CatalogueView;
use crate::models::{NewProduct, NewProductOption, Product, ProductOption, ProductPatch};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    description: String,
    images: Vec<String>,
    base_price: Price,
    status: ProductStatus,
    barcode: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            images: row.images,
            base_price: row.base_price,
            status: row.status,
            barcode: row.barcode,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductOptionRow {
    id: ProductOptionId,
    product_id: ProductId,
    attribute: String,
    value: String,
    sku: String,
    stock: i32,
    extra: Price,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductOptionRow> for ProductOption {
    fn from(row: ProductOptionRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            attribute: row.attribute,
            value: row.value,
            sku: row.sku,
            stock: row.stock,
            extra: row.extra,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, title, description, images, base_price, status, barcode, created_at, updated_at";

const OPTION_COLUMNS: &str =
    "id, product_id, attribute, value, sku, stock, extra, created_at, updated_at";

/// Repository for catalogue database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the whole catalogue, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (id, title, description, images, base_price, status, barcode)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(ProductId::generate())
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.images)
        .bind(input.base_price)
        .bind(input.status)
        .bind(&input.barcode)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 images = COALESCE($4, images),
                 base_price = COALESCE($5, base_price),
                 status = COALESCE($6, status),
                 barcode = COALESCE($7, barcode),
                 updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.images)
        .bind(patch.base_price)
        .bind(patch.status)
        .bind(&patch.barcode)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product and (by cascade) its options.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Get an option by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_option(
        &self,
        id: ProductOptionId,
    ) -> Result<Option<ProductOption>, RepositoryError> {
        let row: Option<ProductOptionRow> = sqlx::query_as(&format!(
            "SELECT {OPTION_COLUMNS} FROM product_options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ProductOption::from))
    }

    /// All options of a product, stable order by attribute then value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn options_for(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductOption>, RepositoryError> {
        let rows: Vec<ProductOptionRow> = sqlx::query_as(&format!(
            "SELECT {OPTION_COLUMNS} FROM product_options
             WHERE product_id = $1
             ORDER BY attribute, value"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductOption::from).collect())
    }

    /// Create an option under a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the parent product does not
    /// exist.
    pub async fn create_option(
        &self,
        product_id: ProductId,
        input: &NewProductOption,
    ) -> Result<ProductOption, RepositoryError> {
        let row: ProductOptionRow = sqlx::query_as(&format!(
            "INSERT INTO product_options (id, product_id, attribute, value, sku, stock, extra)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {OPTION_COLUMNS}"
        ))
        .bind(ProductOptionId::generate())
        .bind(product_id)
        .bind(&input.attribute)
        .bind(&input.value)
        .bind(&input.sku)
        .bind(input.stock)
        .bind(input.extra)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Delete an option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the option does not exist.
    pub async fn delete_option(&self, id: ProductOptionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_options WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogueView for ProductRepository<'_> {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.get(id).await
    }

    async fn option(
        &self,
        id: ProductOptionId,
    ) -> Result<Option<ProductOption>, RepositoryError> {
        self.get_option(id).await
    }

    async fn options_for_product(
        &self,
        id: ProductId,
    ) -> Result<Vec<ProductOption>, RepositoryError> {
        self.options_for(id).await
    }
}
