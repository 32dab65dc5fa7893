//! Common API utilities and shared query types

use serde::Deserialize;

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size
pub fn default_page_size() -> u32 {
    10
}

// ============================================================================
// Query Types
// ============================================================================

/// Query parameters for paginated listing endpoints
#[derive(Debug, Deserialize)]
pub struct ListingsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: u32,
    #[serde(default)]
    pub search: String,
    /// Sort column; unknown values fall back to created_at
    #[serde(default, rename = "sortBy")]
    pub sort_by: String,
    /// "desc" for descending; anything else is ascending
    #[serde(default)]
    pub order: String,
}

/// Query parameters for category search
#[derive(Debug, Deserialize)]
pub struct CategorySearchQuery {
    #[serde(default)]
    pub search: String,
}

/// Query parameters for category creation
#[derive(Debug, Deserialize)]
pub struct CreateCategoryQuery {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Query parameters for the listing approval endpoint
#[derive(Debug, Deserialize)]
pub struct ApprovalQuery {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Approved")]
    pub approved: i64,
}
