//! Database layer
//!
//! This module provides database abstraction for the Listly backend:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The driver is selected from configuration. Repositories are trait
//! objects so services stay backend-agnostic and testable against
//! in-memory SQLite.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
