//! Listing API endpoints
//!
//! - GET /api/listings - paginated, searchable, sortable listing pages
//! - GET /api/listing/{id} - single listing joined with owner and category
//! - POST /api/listings - create or update a listing (multipart)
//! - PUT /api/listing/approval - admin approval
//! - DELETE /api/listing/{id} - delete (admin or owner)

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::common::{ApprovalQuery, ListingsQuery};
use crate::api::middleware::{ApiError, AppState, AuthClaims};
use crate::api::responses::{
    ListingDetail, ListingResponse, ListingsData, Paginated, StatusDataResponse, StatusResponse,
    UserResponse,
};
use crate::models::{ApprovalStatus, ListParams, SaveListingInput, UserRole};

/// GET /api/listings - paginated listing pages
///
/// `search` matches title, tags, and description as a substring. Empty
/// pages return the 404 envelope with zeroed pagination fields.
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let sort = query.sort_by.parse().unwrap_or_default();
    let direction = query.order.parse().unwrap_or_default();

    let result = state
        .listing_service
        .list(&params, &query.search, sort, direction)
        .await?;

    if result.is_empty() {
        let body = Paginated::empty(
            "No listings found.",
            ListingsData { listings: vec![] },
            params.page,
            params.per_page,
        );
        return Ok((StatusCode::NOT_FOUND, Json(body)).into_response());
    }

    let listings: Vec<ListingResponse> = result.items.iter().cloned().map(Into::into).collect();
    let body = Paginated::from_page(
        "Listings fetched successfully.",
        200,
        ListingsData { listings },
        &result,
    );

    Ok(Json(body).into_response())
}

/// GET /api/listing/{id} - single listing with owner and category
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusDataResponse<ListingDetail>>, ApiError> {
    let (listing, owner, category) = state
        .listing_service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found."))?;

    let detail = ListingDetail {
        listing: listing.into(),
        user: owner.map(|u| UserResponse::from_user(u, &state.images)),
        category: category.map(Into::into),
    };

    Ok(Json(StatusDataResponse::ok(
        "Listing fetched successfully.",
        detail,
    )))
}

/// POST /api/listings - create or update a listing (multipart form)
///
/// Fields: id (optional, update), title, desc, tags, email, link,
/// categoryId, image (file) or existingImage. The owner is the
/// authenticated caller; updates require ownership or the admin role.
pub async fn save_listing(
    State(state): State<AppState>,
    claims: AuthClaims,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut input = SaveListingInput {
        user_id: claims.0.user_id,
        ..SaveListingInput::default()
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read form: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "id" => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    let id = text
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| ApiError::validation_error("id must be a number."))?;
                    input.id = Some(id);
                }
            }
            "title" => input.title = read_text(field).await?,
            "desc" | "description" => input.description = read_text(field).await?,
            "tags" => input.tags = read_text(field).await?,
            "email" => input.email = read_text(field).await?,
            "link" => input.link = read_text(field).await?,
            "categoryId" => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    let id = text
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| ApiError::validation_error("categoryId must be a number."))?;
                    input.category_id = Some(id);
                }
            }
            "existingImage" => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    input.existing_image = Some(text);
                }
            }
            "image" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;
                if !bytes.is_empty() {
                    input.image = Some((filename, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    // Updates are restricted to the owner or an admin
    if let Some(id) = input.id {
        let existing = state
            .listing_service
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Listing not found."))?;

        if claims.0.role != UserRole::Admin && existing.user_id != claims.0.user_id {
            return Err(ApiError::forbidden("You do not own this listing."));
        }
    }

    state.listing_service.save(input).await?;

    Ok(Json(StatusResponse::ok("Listing saved successfully.")))
}

/// PUT /api/listing/approval?Id=&Approved= - set the approval state (admin)
pub async fn set_approval(
    State(state): State<AppState>,
    Query(query): Query<ApprovalQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let approval = ApprovalStatus::from_i64(query.approved)
        .ok_or_else(|| ApiError::validation_error("Approved must be 0, 1, or 2."))?;

    state.listing_service.set_approval(query.id, approval).await?;

    Ok(Json(StatusResponse::ok("Listing approval updated.")))
}

/// DELETE /api/listing/{id} - delete a listing (admin or owner)
pub async fn delete_listing(
    State(state): State<AppState>,
    claims: AuthClaims,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    let existing = state
        .listing_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found."))?;

    if claims.0.role != UserRole::Admin && existing.user_id != claims.0.user_id {
        return Err(ApiError::forbidden("You do not own this listing."));
    }

    state.listing_service.delete(id).await?;

    Ok(Json(StatusResponse::ok("Listing deleted successfully.")))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read form field: {}", e)))
}
