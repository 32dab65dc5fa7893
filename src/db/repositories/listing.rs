//! Listing repository
//!
//! Database operations for listings.
//!
//! This module provides:
//! - `ListingRepository` trait defining the interface for listing data access
//! - `SqlxListingRepository` implementing the trait for SQLite and MySQL
//!
//! List queries combine a LIKE substring filter over title, tags, and
//! description with offset pagination; the total count runs as an
//! independent COUNT(*) with the same filter. Sort column and direction
//! come from closed enums, never from raw query input.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ApprovalStatus, ListParams, Listing, ListingSort, SortDirection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Listing repository trait
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Create a new listing
    async fn create(&self, listing: &Listing) -> Result<Listing>;

    /// Get listing by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Listing>>;

    /// List listings with search, sort, and pagination.
    /// Returns the page of listings and the total match count.
    async fn list(
        &self,
        params: &ListParams,
        search: &str,
        sort: ListingSort,
        direction: SortDirection,
    ) -> Result<(Vec<Listing>, i64)>;

    /// List a user's listings, newest first, with search and pagination.
    async fn list_by_user(
        &self,
        user_id: i64,
        params: &ListParams,
        search: &str,
    ) -> Result<(Vec<Listing>, i64)>;

    /// Update a listing's fields (approval is excluded; see `set_approval`)
    async fn update(&self, listing: &Listing) -> Result<bool>;

    /// Set the approval state
    async fn set_approval(&self, id: i64, approval: ApprovalStatus) -> Result<bool>;

    /// Delete a listing
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based listing repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxListingRepository {
    pool: DynDatabasePool,
}

impl SqlxListingRepository {
    /// Create a new SQLx listing repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ListingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ListingRepository for SqlxListingRepository {
    async fn create(&self, listing: &Listing) -> Result<Listing> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_listing_sqlite(self.pool.as_sqlite().unwrap(), listing).await
            }
            DatabaseDriver::Mysql => {
                create_listing_mysql(self.pool.as_mysql().unwrap(), listing).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_listing_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_listing_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn list(
        &self,
        params: &ListParams,
        search: &str,
        sort: ListingSort,
        direction: SortDirection,
    ) -> Result<(Vec<Listing>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_listings_sqlite(self.pool.as_sqlite().unwrap(), params, search, sort, direction)
                    .await
            }
            DatabaseDriver::Mysql => {
                list_listings_mysql(self.pool.as_mysql().unwrap(), params, search, sort, direction)
                    .await
            }
        }
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        params: &ListParams,
        search: &str,
    ) -> Result<(Vec<Listing>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_user_sqlite(self.pool.as_sqlite().unwrap(), user_id, params, search).await
            }
            DatabaseDriver::Mysql => {
                list_by_user_mysql(self.pool.as_mysql().unwrap(), user_id, params, search).await
            }
        }
    }

    async fn update(&self, listing: &Listing) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_listing_sqlite(self.pool.as_sqlite().unwrap(), listing).await
            }
            DatabaseDriver::Mysql => {
                update_listing_mysql(self.pool.as_mysql().unwrap(), listing).await
            }
        }
    }

    async fn set_approval(&self, id: i64, approval: ApprovalStatus) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_approval_sqlite(self.pool.as_sqlite().unwrap(), id, approval).await
            }
            DatabaseDriver::Mysql => {
                set_approval_mysql(self.pool.as_mysql().unwrap(), id, approval).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_listing_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_listing_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const LISTING_COLUMNS: &str = "id, user_id, title, description, tags, email, link, image, \
                               approved, category_id, created_at, updated_at";

const SEARCH_FILTER: &str = "(title LIKE ? OR tags LIKE ? OR description LIKE ?)";

fn search_pattern(search: &str) -> String {
    format!("%{}%", search)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_listing_sqlite(pool: &SqlitePool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO listings (user_id, title, description, tags, email, link, image,
                              approved, category_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(listing.user_id)
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(&listing.tags)
    .bind(&listing.email)
    .bind(&listing.link)
    .bind(&listing.image)
    .bind(listing.approved.as_i64())
    .bind(listing.category_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create listing")?;

    let id = result.last_insert_rowid();

    Ok(Listing {
        id,
        created_at: now,
        updated_at: now,
        ..listing.clone()
    })
}

async fn get_listing_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Listing>> {
    let sql = format!("SELECT {} FROM listings WHERE id = ?", LISTING_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get listing by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_listing_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_listings_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
    search: &str,
    sort: ListingSort,
    direction: SortDirection,
) -> Result<(Vec<Listing>, i64)> {
    let pattern = search_pattern(search);

    let count_sql = format!("SELECT COUNT(*) as count FROM listings WHERE {}", SEARCH_FILTER);
    let count_row = sqlx::query(&count_sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count listings")?;
    let total: i64 = count_row.get("count");

    // Sort column/direction come from closed enums
    let sql = format!(
        "SELECT {} FROM listings WHERE {} ORDER BY {} {} LIMIT ? OFFSET ?",
        LISTING_COLUMNS,
        SEARCH_FILTER,
        sort.column(),
        direction.keyword()
    );
    let rows = sqlx::query(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list listings")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_sqlite(&row)?);
    }

    Ok((listings, total))
}

async fn list_by_user_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    params: &ListParams,
    search: &str,
) -> Result<(Vec<Listing>, i64)> {
    let pattern = search_pattern(search);

    let count_sql = format!(
        "SELECT COUNT(*) as count FROM listings WHERE user_id = ? AND {}",
        SEARCH_FILTER
    );
    let count_row = sqlx::query(&count_sql)
        .bind(user_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count user listings")?;
    let total: i64 = count_row.get("count");

    let sql = format!(
        "SELECT {} FROM listings WHERE user_id = ? AND {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        LISTING_COLUMNS, SEARCH_FILTER
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list user listings")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_sqlite(&row)?);
    }

    Ok((listings, total))
}

async fn update_listing_sqlite(pool: &SqlitePool, listing: &Listing) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE listings
        SET title = ?, description = ?, tags = ?, email = ?, link = ?,
            image = ?, category_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(&listing.tags)
    .bind(&listing.email)
    .bind(&listing.link)
    .bind(&listing.image)
    .bind(listing.category_id)
    .bind(Utc::now())
    .bind(listing.id)
    .execute(pool)
    .await
    .context("Failed to update listing")?;

    Ok(result.rows_affected() > 0)
}

async fn set_approval_sqlite(
    pool: &SqlitePool,
    id: i64,
    approval: ApprovalStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE listings SET approved = ?, updated_at = ? WHERE id = ?")
        .bind(approval.as_i64())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to set listing approval")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_listing_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete listing")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_listing_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Listing> {
    let approved: i64 = row.get("approved");

    Ok(Listing {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        tags: row.get("tags"),
        email: row.get("email"),
        link: row.get("link"),
        image: row.get("image"),
        approved: ApprovalStatus::from_i64(approved).unwrap_or_default(),
        category_id: row.get("category_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_listing_mysql(pool: &MySqlPool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO listings (user_id, title, description, tags, email, link, image,
                              approved, category_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(listing.user_id)
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(&listing.tags)
    .bind(&listing.email)
    .bind(&listing.link)
    .bind(&listing.image)
    .bind(listing.approved.as_i64())
    .bind(listing.category_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create listing")?;

    let id = result.last_insert_id() as i64;

    Ok(Listing {
        id,
        created_at: now,
        updated_at: now,
        ..listing.clone()
    })
}

async fn get_listing_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Listing>> {
    let sql = format!("SELECT {} FROM listings WHERE id = ?", LISTING_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get listing by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_listing_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_listings_mysql(
    pool: &MySqlPool,
    params: &ListParams,
    search: &str,
    sort: ListingSort,
    direction: SortDirection,
) -> Result<(Vec<Listing>, i64)> {
    let pattern = search_pattern(search);

    let count_sql = format!("SELECT COUNT(*) as count FROM listings WHERE {}", SEARCH_FILTER);
    let count_row = sqlx::query(&count_sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count listings")?;
    let total: i64 = count_row.get("count");

    let sql = format!(
        "SELECT {} FROM listings WHERE {} ORDER BY {} {} LIMIT ? OFFSET ?",
        LISTING_COLUMNS,
        SEARCH_FILTER,
        sort.column(),
        direction.keyword()
    );
    let rows = sqlx::query(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list listings")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_mysql(&row)?);
    }

    Ok((listings, total))
}

async fn list_by_user_mysql(
    pool: &MySqlPool,
    user_id: i64,
    params: &ListParams,
    search: &str,
) -> Result<(Vec<Listing>, i64)> {
    let pattern = search_pattern(search);

    let count_sql = format!(
        "SELECT COUNT(*) as count FROM listings WHERE user_id = ? AND {}",
        SEARCH_FILTER
    );
    let count_row = sqlx::query(&count_sql)
        .bind(user_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count user listings")?;
    let total: i64 = count_row.get("count");

    let sql = format!(
        "SELECT {} FROM listings WHERE user_id = ? AND {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        LISTING_COLUMNS, SEARCH_FILTER
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list user listings")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_mysql(&row)?);
    }

    Ok((listings, total))
}

async fn update_listing_mysql(pool: &MySqlPool, listing: &Listing) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE listings
        SET title = ?, description = ?, tags = ?, email = ?, link = ?,
            image = ?, category_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(&listing.tags)
    .bind(&listing.email)
    .bind(&listing.link)
    .bind(&listing.image)
    .bind(listing.category_id)
    .bind(Utc::now())
    .bind(listing.id)
    .execute(pool)
    .await
    .context("Failed to update listing")?;

    Ok(result.rows_affected() > 0)
}

async fn set_approval_mysql(pool: &MySqlPool, id: i64, approval: ApprovalStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE listings SET approved = ?, updated_at = ? WHERE id = ?")
        .bind(approval.as_i64())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to set listing approval")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_listing_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete listing")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_listing_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Listing> {
    let approved: i64 = row.get("approved");

    Ok(Listing {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        tags: row.get("tags"),
        email: row.get("email"),
        link: row.get("link"),
        image: row.get("image"),
        approved: ApprovalStatus::from_i64(approved).unwrap_or_default(),
        category_id: row.get("category_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
