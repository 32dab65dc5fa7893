//! Listing model
//!
//! Defines the Listing entity, its approval state, and the pagination
//! types shared by the list queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Listing entity representing a directory entry submitted by a user.
///
/// New listings start in `Pending` approval; only the dedicated approval
/// operation moves them out of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Listing title
    pub title: String,
    /// Listing description
    pub description: String,
    /// Comma-separated tags
    pub tags: String,
    /// Contact email
    pub email: String,
    /// External link
    pub link: String,
    /// Stored image path (relative); rewritten to an absolute URL on read
    pub image: Option<String>,
    /// Approval state
    pub approved: ApprovalStatus,
    /// Category reference
    pub category_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new pending Listing owned by `user_id`.
    pub fn new(
        user_id: i64,
        title: String,
        description: String,
        tags: String,
        email: String,
        link: String,
        category_id: Option<i64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            user_id,
            title,
            description,
            tags,
            email,
            link,
            image: None,
            approved: ApprovalStatus::Pending,
            category_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the listing has been approved by an admin
    pub fn is_approved(&self) -> bool {
        self.approved == ApprovalStatus::Approved
    }
}

/// Listing approval state, stored as an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting admin review (default for new listings)
    Pending,
    /// Visible in the directory
    Approved,
    /// Rejected by an admin
    Rejected,
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl ApprovalStatus {
    /// Integer value stored in the database
    pub fn as_i64(self) -> i64 {
        match self {
            ApprovalStatus::Pending => 0,
            ApprovalStatus::Approved => 1,
            ApprovalStatus::Rejected => 2,
        }
    }

    /// Parse the stored integer value
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(ApprovalStatus::Pending),
            1 => Some(ApprovalStatus::Approved),
            2 => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved => write!(f, "approved"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Sort column for listing queries.
///
/// A closed set: unknown query values fall back to `CreatedAt` instead of
/// reaching the SQL layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingSort {
    Title,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl ListingSort {
    /// The column name used in ORDER BY clauses
    pub fn column(self) -> &'static str {
        match self {
            ListingSort::Title => "title",
            ListingSort::CreatedAt => "created_at",
            ListingSort::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for ListingSort {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "title" => ListingSort::Title,
            "updated_at" | "updatedat" => ListingSort::UpdatedAt,
            _ => ListingSort::CreatedAt,
        })
    }
}

/// Sort direction for listing queries; ascending unless explicitly "desc".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The keyword used in ORDER BY clauses
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("desc") {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        })
    }
}

/// Input for creating or updating a listing.
///
/// `id: None` means create. A create requires either `image` bytes or an
/// `existing_image` reference; an update with neither keeps the stored
/// path unchanged.
#[derive(Debug, Clone, Default)]
pub struct SaveListingInput {
    /// Listing ID for updates; None creates a new listing
    pub id: Option<i64>,
    /// Owning user
    pub user_id: i64,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Comma-separated tags
    pub tags: String,
    /// Contact email
    pub email: String,
    /// External link
    pub link: String,
    /// Category reference
    pub category_id: Option<i64>,
    /// Newly uploaded image: original filename and bytes
    pub image: Option<(String, Vec<u8>)>,
    /// Reference to an already-stored image path
    pub existing_image: Option<String>,
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters, clamping out-of-range values
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages (ceiling division)
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map items into another type, keeping the pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
        }
    }
}
