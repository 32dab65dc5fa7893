//! Category model
//!
//! Defines the Category entity used to classify listings. Categories are
//! static reference data; the slug is derived from the name at creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category entity for classifying listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Category name
    pub name: String,
    /// Category description
    pub description: Option<String>,
    /// URL-friendly slug derived from the name
    pub slug: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new Category; the slug is derived from the name.
    pub fn new(name: String, description: Option<String>) -> Self {
        let slug = slugify(&name);
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            description,
            slug,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Derive a URL-friendly slug from a category name.
///
/// Lowercases, keeps alphanumerics, and collapses everything else into
/// single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;

    for c in name.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}
