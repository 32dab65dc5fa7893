//! Category service
//!
//! Business logic for category reference data: searchable listing,
//! creation with derived slugs, and deletion.

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::CategoryRepository;
use crate::models::Category;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    /// Create a new category service
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    /// List categories matching a substring search; empty search matches all.
    pub async fn list(&self, search: &str) -> Result<Vec<Category>, CategoryServiceError> {
        let categories = self
            .categories
            .list(search)
            .await
            .context("Failed to list categories")?;

        Ok(categories)
    }

    /// Get a category by ID
    pub async fn get(&self, id: i64) -> Result<Option<Category>, CategoryServiceError> {
        let category = self
            .categories
            .get_by_id(id)
            .await
            .context("Failed to get category")?;

        Ok(category)
    }

    /// Create a category; the slug is derived from the name.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Category, CategoryServiceError> {
        if name.trim().is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "category name is required".to_string(),
            ));
        }
        if description.trim().is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "category description is required".to_string(),
            ));
        }

        let category = Category::new(name.to_string(), Some(description.to_string()));

        let created = self
            .categories
            .create(&category)
            .await
            .context("Failed to create category")?;

        Ok(created)
    }

    /// Delete a category
    pub async fn delete(&self, id: i64) -> Result<bool, CategoryServiceError> {
        let deleted = self
            .categories
            .delete(id)
            .await
            .context("Failed to delete category")?;

        Ok(deleted)
    }
}
