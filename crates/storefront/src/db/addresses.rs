//! Address repository.
//!
//! Saving a new pair demotes the user's prior addresses to
//! `PreviousAddress` in the same transaction, keeping the partial unique
//! index (one `CurrentAddress` per user and type) satisfied.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use madrona_core::{AddressId, AddressStatus, AddressType, UserId};

use crate::models::{Address, AddressDraft};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    status: AddressStatus,
    #[sqlx(rename = "type")]
    kind: AddressType,
    full_name: String,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    state: String,
    postcode: String,
    country: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            kind: row.kind,
            full_name: row.full_name,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            state: row.state,
            postcode: row.postcode,
            country: row.country,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ADDRESS_COLUMNS: &str = "id, user_id, status, type, full_name, address_line1, \
                               address_line2, city, state, postcode, country, created_at, \
                               updated_at";

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an address by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// All of a user's addresses, current pair first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses
             WHERE user_id = $1
             ORDER BY status, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Save a new current billing/delivery pair for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create_current_pair(
        &self,
        user_id: UserId,
        billing: &AddressDraft,
        delivery: &AddressDraft,
    ) -> Result<(Address, Address), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let pair = Self::insert_current_pair(&mut tx, user_id, billing, delivery).await?;
        tx.commit().await?;
        Ok(pair)
    }

    /// Demote the user's prior addresses and insert a new current pair on
    /// an existing connection, so order creation can fold the address write
    /// into its own transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn insert_current_pair(
        conn: &mut PgConnection,
        user_id: UserId,
        billing: &AddressDraft,
        delivery: &AddressDraft,
    ) -> Result<(Address, Address), RepositoryError> {
        sqlx::query(
            "UPDATE addresses SET status = 'PreviousAddress', updated_at = now()
             WHERE user_id = $1 AND status = 'CurrentAddress'",
        )
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        let billing = Self::insert_one(conn, user_id, billing).await?;
        let delivery = Self::insert_one(conn, user_id, delivery).await?;
        Ok((billing, delivery))
    }

    async fn insert_one(
        conn: &mut PgConnection,
        user_id: UserId,
        draft: &AddressDraft,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(&format!(
            "INSERT INTO addresses
                 (id, user_id, status, type, full_name, address_line1, address_line2,
                  city, state, postcode, country)
             VALUES ($1, $2, 'CurrentAddress', $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(AddressId::generate())
        .bind(user_id)
        .bind(draft.kind)
        .bind(&draft.full_name)
        .bind(&draft.address_line1)
        .bind(&draft.address_line2)
        .bind(&draft.city)
        .bind(&draft.state)
        .bind(&draft.postcode)
        .bind(&draft.country)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row.into())
    }
}
