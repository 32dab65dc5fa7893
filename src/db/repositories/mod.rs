//! Trait-based repositories over the database pool
//!
//! Each repository is a trait plus a SQLx implementation that dispatches
//! on the configured driver (SQLite or MySQL). Services depend on the
//! traits only.

mod category;
mod listing;
mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use listing::{ListingRepository, SqlxListingRepository};
pub use user::{SqlxUserRepository, UserRepository};
