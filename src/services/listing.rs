//! Listing service
//!
//! Business logic for listings: paginated search, the joined single-listing
//! view, saving with image replacement, approval, and deletion.
//!
//! Image replacement ordering: the new file is written and the row updated
//! before the old file is deleted, so the row never points at a missing
//! file. Concurrent replacements for the same listing can orphan a file;
//! that loss is logged and tolerated at this scale.

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::{CategoryRepository, ListingRepository, UserRepository};
use crate::models::{
    ApprovalStatus, Category, ListParams, Listing, ListingSort, PagedResult, SaveListingInput,
    SortDirection, User,
};
use crate::services::images::{ImageStore, ImageStoreError};

/// Error types for listing service operations
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Listing does not exist
    #[error("Listing not found")]
    NotFound,

    /// Image upload rejected or failed
    #[error(transparent)]
    Image(#[from] ImageStoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Listing service
pub struct ListingService {
    listings: Arc<dyn ListingRepository>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    images: Arc<ImageStore>,
}

impl ListingService {
    /// Create a new listing service
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        images: Arc<ImageStore>,
    ) -> Self {
        Self {
            listings,
            users,
            categories,
            images,
        }
    }

    /// List listings with search, sort, and pagination.
    ///
    /// Each returned listing's image field is rewritten to an absolute
    /// URL, falling back to the placeholder asset when none is stored.
    pub async fn list(
        &self,
        params: &ListParams,
        search: &str,
        sort: ListingSort,
        direction: SortDirection,
    ) -> Result<PagedResult<Listing>, ListingServiceError> {
        let (listings, total) = self
            .listings
            .list(params, search, sort, direction)
            .await
            .context("Failed to list listings")?;

        let items = listings.into_iter().map(|l| self.with_image_url(l)).collect();

        Ok(PagedResult::new(items, total, params))
    }

    /// List a user's own listings, newest first.
    pub async fn list_by_user(
        &self,
        user_id: i64,
        params: &ListParams,
        search: &str,
    ) -> Result<PagedResult<Listing>, ListingServiceError> {
        let (listings, total) = self
            .listings
            .list_by_user(user_id, params, search)
            .await
            .context("Failed to list user listings")?;

        let items = listings.into_iter().map(|l| self.with_image_url(l)).collect();

        Ok(PagedResult::new(items, total, params))
    }

    /// Get a listing by ID without resolving owner or category.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Listing>, ListingServiceError> {
        let listing = self
            .listings
            .get_by_id(id)
            .await
            .context("Failed to get listing")?;

        Ok(listing)
    }

    /// Get a listing together with its owner and category.
    ///
    /// The owner and category are two additional lookups, not a SQL join;
    /// either may be absent.
    pub async fn get(
        &self,
        id: i64,
    ) -> Result<Option<(Listing, Option<User>, Option<Category>)>, ListingServiceError> {
        let Some(listing) = self
            .listings
            .get_by_id(id)
            .await
            .context("Failed to get listing")?
        else {
            return Ok(None);
        };

        let owner = self
            .users
            .get_by_id(listing.user_id)
            .await
            .context("Failed to get listing owner")?;

        let category = match listing.category_id {
            Some(category_id) => self
                .categories
                .get_by_id(category_id)
                .await
                .context("Failed to get listing category")?,
            None => None,
        };

        Ok(Some((self.with_image_url(listing), owner, category)))
    }

    /// Create or update a listing.
    ///
    /// Create requires an uploaded image or an existing-image reference and
    /// assigns `Pending` approval. On update, a new image replaces the
    /// stored file (old file deleted after the row update); with no new
    /// image the stored path is preserved.
    pub async fn save(&self, input: SaveListingInput) -> Result<Listing, ListingServiceError> {
        validate_save_input(&input)?;

        match input.id {
            None => self.create_listing(input).await,
            Some(id) => self.update_listing(id, input).await,
        }
    }

    async fn create_listing(
        &self,
        input: SaveListingInput,
    ) -> Result<Listing, ListingServiceError> {
        let image_path = match &input.image {
            Some((filename, bytes)) => Some(self.images.store_listing_image(filename, bytes).await?),
            None => match input.existing_image {
                Some(ref existing) if !existing.trim().is_empty() => Some(existing.clone()),
                _ => {
                    return Err(ListingServiceError::ValidationError(
                        "An image is required for a new listing".to_string(),
                    ))
                }
            },
        };

        let mut listing = Listing::new(
            input.user_id,
            input.title,
            input.description,
            input.tags,
            input.email,
            input.link,
            input.category_id,
        );
        listing.image = image_path;

        let created = self
            .listings
            .create(&listing)
            .await
            .context("Failed to create listing")?;

        Ok(created)
    }

    async fn update_listing(
        &self,
        id: i64,
        input: SaveListingInput,
    ) -> Result<Listing, ListingServiceError> {
        let current = self
            .listings
            .get_by_id(id)
            .await
            .context("Failed to get listing")?
            .ok_or(ListingServiceError::NotFound)?;

        let old_image = current.image.clone();

        let (new_image, replaced) = match &input.image {
            Some((filename, bytes)) => {
                let stored = self.images.store_listing_image(filename, bytes).await?;
                (Some(stored), true)
            }
            // No new upload: keep the stored path (or an explicit existing reference)
            None => (input.existing_image.clone().or(old_image.clone()), false),
        };

        let updated = Listing {
            id,
            user_id: current.user_id,
            title: input.title,
            description: input.description,
            tags: input.tags,
            email: input.email,
            link: input.link,
            image: new_image,
            approved: current.approved,
            category_id: input.category_id,
            created_at: current.created_at,
            updated_at: current.updated_at,
        };

        let changed = self
            .listings
            .update(&updated)
            .await
            .context("Failed to update listing")?;
        if !changed {
            return Err(ListingServiceError::NotFound);
        }

        // Old file is removed only after the row points at the new one
        if replaced {
            if let Some(old_path) = old_image {
                if let Err(e) = self.images.delete(&old_path).await {
                    tracing::warn!(listing_id = id, "Failed to delete replaced image: {}", e);
                }
            }
        }

        Ok(updated)
    }

    /// Set the approval state. This is the only operation that touches
    /// approval.
    pub async fn set_approval(
        &self,
        id: i64,
        approval: ApprovalStatus,
    ) -> Result<(), ListingServiceError> {
        let changed = self
            .listings
            .set_approval(id, approval)
            .await
            .context("Failed to set approval")?;

        if changed {
            Ok(())
        } else {
            Err(ListingServiceError::NotFound)
        }
    }

    /// Delete a listing.
    pub async fn delete(&self, id: i64) -> Result<(), ListingServiceError> {
        let deleted = self
            .listings
            .delete(id)
            .await
            .context("Failed to delete listing")?;

        if deleted {
            Ok(())
        } else {
            Err(ListingServiceError::NotFound)
        }
    }

    fn with_image_url(&self, mut listing: Listing) -> Listing {
        listing.image = Some(self.images.listing_image_url(listing.image.as_deref()));
        listing
    }
}

fn validate_save_input(input: &SaveListingInput) -> Result<(), ListingServiceError> {
    for (value, field) in [
        (&input.title, "title"),
        (&input.description, "description"),
        (&input.email, "email"),
        (&input.link, "link"),
    ] {
        if value.trim().is_empty() {
            return Err(ListingServiceError::ValidationError(format!(
                "{} is required",
                field
            )));
        }
    }
    Ok(())
}
