//! Shared API response types
//!
//! Explicit response-record types for every endpoint, replacing ad hoc
//! per-endpoint payload shaping. Wire names are camelCase.

use serde::Serialize;

use crate::models::{Category, Listing, PagedResult, User};
use crate::services::ImageStore;

/// Simple `{ status, message }` response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
        }
    }
}

/// `{ status, message, data }` response
#[derive(Debug, Serialize)]
pub struct StatusDataResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: T,
}

impl<T> StatusDataResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data,
        }
    }
}

/// The paginated envelope shared by list endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub message: String,
    pub status_code: u16,
    pub data: T,
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Paginated<T> {
    /// Build the envelope from a paged result (of any item type) and the
    /// already-shaped `data` payload.
    pub fn from_page<I>(
        message: impl Into<String>,
        status_code: u16,
        data: T,
        page: &PagedResult<I>,
    ) -> Self {
        Self {
            message: message.into(),
            status_code,
            data,
            current_page: page.page,
            page_size: page.per_page,
            total_count: page.total,
            total_pages: page.total_pages(),
            has_previous: page.has_prev(),
            has_next: page.has_next(),
        }
    }

    /// The 404 shape: zeroed counts, echoing the requested window.
    pub fn empty(message: impl Into<String>, data: T, page: u32, page_size: u32) -> Self {
        Self {
            message: message.into(),
            status_code: 404,
            data,
            current_page: page,
            page_size,
            total_count: 0,
            total_pages: 0,
            has_previous: false,
            has_next: false,
        }
    }
}

/// Listing as returned by the API; `image` is always an absolute URL
/// (services resolve it, with the placeholder fallback).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub email: String,
    pub link: String,
    pub image: String,
    pub approved: i64,
    pub category_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            user_id: listing.user_id,
            title: listing.title,
            description: listing.description,
            tags: listing.tags,
            email: listing.email,
            link: listing.link,
            image: listing.image.unwrap_or_default(),
            approved: listing.approved.as_i64(),
            category_id: listing.category_id,
            created_at: listing.created_at.to_rfc3339(),
            updated_at: listing.updated_at.to_rfc3339(),
        }
    }
}

/// `data` payload for listing pages
#[derive(Debug, Serialize)]
pub struct ListingsData {
    pub listings: Vec<ListingResponse>,
}

/// Single listing joined with its owner and category
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetail {
    pub listing: ListingResponse,
    pub user: Option<UserResponse>,
    pub category: Option<CategoryResponse>,
}

/// User as returned by the API; `profile_picture` is an absolute URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub profile_picture: String,
    pub email_verified_at: Option<String>,
}

impl UserResponse {
    /// Shape a user, resolving the profile picture against the image store.
    pub fn from_user(user: User, images: &ImageStore) -> Self {
        let profile_picture = images.profile_picture_url(user.profile_picture.as_deref());
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.to_string(),
            profile_picture,
            email_verified_at: user.email_verified_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Category as returned by the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            slug: category.slug,
            created_at: category.created_at.to_rfc3339(),
            updated_at: category.updated_at.to_rfc3339(),
        }
    }
}

/// `data` payload for the category list 404 shape
#[derive(Debug, Serialize)]
pub struct CategoriesData {
    pub categories: Vec<CategoryResponse>,
}

/// Unpaginated not-found envelope (category list)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundEnvelope<T> {
    pub message: String,
    pub status_code: u16,
    pub data: T,
}

impl<T> NotFoundEnvelope<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            status_code: 404,
            data,
        }
    }
}

/// Login success response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: bool,
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// Authenticated profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub status: bool,
    pub user: ProfileUser,
}

/// Profile fields derived from the validated claims
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub profile_picture: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApprovalStatus, ListParams};

    #[test]
    fn test_paginated_envelope_wire_names() {
        let params = ListParams::new(2, 10);
        let page: PagedResult<i32> = PagedResult::new(vec![1, 2], 25, &params);
        let envelope = Paginated::from_page(
            "Listings fetched successfully.",
            200,
            ListingsData { listings: vec![] },
            &page,
        );

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["totalCount"], 25);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["hasPrevious"], true);
        assert_eq!(json["hasNext"], true);
        assert!(json["data"]["listings"].is_array());
    }

    #[test]
    fn test_paginated_empty_shape() {
        let envelope = Paginated::empty(
            "No listings found.",
            ListingsData { listings: vec![] },
            3,
            20,
        );

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["currentPage"], 3);
        assert_eq!(json["pageSize"], 20);
        assert_eq!(json["totalCount"], 0);
        assert_eq!(json["totalPages"], 0);
        assert_eq!(json["hasPrevious"], false);
        assert_eq!(json["hasNext"], false);
    }

    #[test]
    fn test_listing_response_camel_case() {
        let mut listing = Listing::new(
            7,
            "Red Shoe".to_string(),
            "desc".to_string(),
            "tags".to_string(),
            "a@x.com".to_string(),
            "https://example.com".to_string(),
            Some(3),
        );
        listing.id = 1;
        listing.approved = ApprovalStatus::Approved;
        listing.image = Some("http://localhost:5067/uploads/listing_pictures/x.jpg".to_string());

        let json = serde_json::to_value(ListingResponse::from(listing)).unwrap();
        assert_eq!(json["userId"], 7);
        assert_eq!(json["categoryId"], 3);
        assert_eq!(json["approved"], 1);
        assert!(json["createdAt"].is_string());
        assert!(json["image"].as_str().unwrap().starts_with("http://"));
    }
}
