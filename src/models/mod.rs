//! Data models
//!
//! This module contains all data structures used throughout the Listly
//! backend:
//! - Database entities (User, Listing, Category)
//! - Pagination parameters and containers
//! - Internal data transfer objects

mod category;
mod listing;
mod user;

pub use category::{slugify, Category};
pub use listing::{
    ApprovalStatus, ListParams, Listing, ListingSort, PagedResult, SaveListingInput, SortDirection,
};
pub use user::{RegisterInput, User, UserRole};
