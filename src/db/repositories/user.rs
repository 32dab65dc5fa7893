//! User repository
//!
//! Database operations for user accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! The verification and reset operations are conditional updates keyed on
//! the stored single-use token, so a stale token never matches and the
//! token is cleared in the same statement that consumes it.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email (case-sensitive exact match)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List accounts with the `user` role
    async fn list_members(&self) -> Result<Vec<User>>;

    /// Store a new single-use verification/reset token for the account
    async fn set_verification_token(&self, email: &str, token: &str) -> Result<bool>;

    /// Consume the verification token: sets the verified timestamp and
    /// clears the token iff the token matches and the account is
    /// currently unverified
    async fn verify_email(&self, email: &str, token: &str) -> Result<bool>;

    /// Consume the reset token: stores the new password hash and clears
    /// the token iff the token matches
    async fn reset_password(&self, email: &str, token: &str, password_hash: &str) -> Result<bool>;

    /// Update name and email for the account
    async fn update_profile(&self, id: i64, name: &str, email: &str) -> Result<bool>;

    /// Point the account at a newly stored profile picture path
    async fn update_profile_picture(&self, id: i64, path: &str) -> Result<bool>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn list_members(&self) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_members_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_members_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn set_verification_token(&self, email: &str, token: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_verification_token_sqlite(self.pool.as_sqlite().unwrap(), email, token).await
            }
            DatabaseDriver::Mysql => {
                set_verification_token_mysql(self.pool.as_mysql().unwrap(), email, token).await
            }
        }
    }

    async fn verify_email(&self, email: &str, token: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                verify_email_sqlite(self.pool.as_sqlite().unwrap(), email, token).await
            }
            DatabaseDriver::Mysql => {
                verify_email_mysql(self.pool.as_mysql().unwrap(), email, token).await
            }
        }
    }

    async fn reset_password(&self, email: &str, token: &str, password_hash: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                reset_password_sqlite(self.pool.as_sqlite().unwrap(), email, token, password_hash)
                    .await
            }
            DatabaseDriver::Mysql => {
                reset_password_mysql(self.pool.as_mysql().unwrap(), email, token, password_hash)
                    .await
            }
        }
    }

    async fn update_profile(&self, id: i64, name: &str, email: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_profile_sqlite(self.pool.as_sqlite().unwrap(), id, name, email).await
            }
            DatabaseDriver::Mysql => {
                update_profile_mysql(self.pool.as_mysql().unwrap(), id, name, email).await
            }
        }
    }

    async fn update_profile_picture(&self, id: i64, path: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_profile_picture_sqlite(self.pool.as_sqlite().unwrap(), id, path).await
            }
            DatabaseDriver::Mysql => {
                update_profile_picture_mysql(self.pool.as_mysql().unwrap(), id, path).await
            }
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, email_verified_at, \
                            verification_token, profile_picture, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, role, email_verified_at,
                           verification_token, profile_picture, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&role_str)
    .bind(user.email_verified_at)
    .bind(&user.verification_token)
    .bind(&user.profile_picture)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    Ok(User {
        id,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_members_sqlite(pool: &SqlitePool) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE role = 'user' ORDER BY created_at DESC",
        USER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_sqlite(&row)?);
    }

    Ok(users)
}

async fn set_verification_token_sqlite(
    pool: &SqlitePool,
    email: &str,
    token: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET verification_token = ?, updated_at = ? WHERE email = ?",
    )
    .bind(token)
    .bind(Utc::now())
    .bind(email)
    .execute(pool)
    .await
    .context("Failed to set verification token")?;

    Ok(result.rows_affected() > 0)
}

async fn verify_email_sqlite(pool: &SqlitePool, email: &str, token: &str) -> Result<bool> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE users
        SET email_verified_at = ?, verification_token = NULL, updated_at = ?
        WHERE email = ? AND verification_token = ? AND email_verified_at IS NULL
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(email)
    .bind(token)
    .execute(pool)
    .await
    .context("Failed to verify email")?;

    Ok(result.rows_affected() > 0)
}

async fn reset_password_sqlite(
    pool: &SqlitePool,
    email: &str,
    token: &str,
    password_hash: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?, verification_token = NULL, updated_at = ?
        WHERE email = ? AND verification_token = ?
        "#,
    )
    .bind(password_hash)
    .bind(Utc::now())
    .bind(email)
    .bind(token)
    .execute(pool)
    .await
    .context("Failed to reset password")?;

    Ok(result.rows_affected() > 0)
}

async fn update_profile_sqlite(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    email: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?")
        .bind(name)
        .bind(email)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update profile")?;

    Ok(result.rows_affected() > 0)
}

async fn update_profile_picture_sqlite(pool: &SqlitePool, id: i64, path: &str) -> Result<bool> {
    let result =
        sqlx::query("UPDATE users SET profile_picture = ?, updated_at = ? WHERE id = ?")
            .bind(path)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to update profile picture")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        email_verified_at: row.get("email_verified_at"),
        verification_token: row.get("verification_token"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, role, email_verified_at,
                           verification_token, profile_picture, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&role_str)
    .bind(user.email_verified_at)
    .bind(&user.verification_token)
    .bind(&user.profile_picture)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_id() as i64;

    Ok(User {
        id,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_members_mysql(pool: &MySqlPool) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE role = 'user' ORDER BY created_at DESC",
        USER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_mysql(&row)?);
    }

    Ok(users)
}

async fn set_verification_token_mysql(pool: &MySqlPool, email: &str, token: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET verification_token = ?, updated_at = ? WHERE email = ?",
    )
    .bind(token)
    .bind(Utc::now())
    .bind(email)
    .execute(pool)
    .await
    .context("Failed to set verification token")?;

    Ok(result.rows_affected() > 0)
}

async fn verify_email_mysql(pool: &MySqlPool, email: &str, token: &str) -> Result<bool> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE users
        SET email_verified_at = ?, verification_token = NULL, updated_at = ?
        WHERE email = ? AND verification_token = ? AND email_verified_at IS NULL
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(email)
    .bind(token)
    .execute(pool)
    .await
    .context("Failed to verify email")?;

    Ok(result.rows_affected() > 0)
}

async fn reset_password_mysql(
    pool: &MySqlPool,
    email: &str,
    token: &str,
    password_hash: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?, verification_token = NULL, updated_at = ?
        WHERE email = ? AND verification_token = ?
        "#,
    )
    .bind(password_hash)
    .bind(Utc::now())
    .bind(email)
    .bind(token)
    .execute(pool)
    .await
    .context("Failed to reset password")?;

    Ok(result.rows_affected() > 0)
}

async fn update_profile_mysql(pool: &MySqlPool, id: i64, name: &str, email: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?")
        .bind(name)
        .bind(email)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update profile")?;

    Ok(result.rows_affected() > 0)
}

async fn update_profile_picture_mysql(pool: &MySqlPool, id: i64, path: &str) -> Result<bool> {
    let result =
        sqlx::query("UPDATE users SET profile_picture = ?, updated_at = ? WHERE id = ?")
            .bind(path)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to update profile picture")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        email_verified_at: row.get("email_verified_at"),
        verification_token: row.get("verification_token"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
