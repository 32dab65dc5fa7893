//! Profile and dashboard API endpoints
//!
//! - GET /api/users/profile - claims-derived profile (authenticated)
//! - POST /api/users/profile/update-picture - replace the profile picture
//! - POST /api/users/profile/update/{userid} - update name and email
//! - GET /api/users/dashboard - the caller's own listings, paginated

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::common::ListingsQuery;
use crate::api::middleware::{ApiError, AppState, AuthClaims};
use crate::api::responses::{
    ListingResponse, ListingsData, Paginated, ProfileResponse, ProfileUser, StatusResponse,
};
use crate::models::ListParams;
use crate::services::UserServiceError;

/// Request body for profile updates
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// GET /api/users/profile - identity derived from the validated claims
pub async fn profile(
    State(state): State<AppState>,
    claims: AuthClaims,
) -> Result<Json<ProfileResponse>, ApiError> {
    let claims = claims.0;

    Ok(Json(ProfileResponse {
        status: true,
        user: ProfileUser {
            id: claims.user_id,
            name: claims.name,
            email: claims.email,
            role: claims.role.to_string(),
            profile_picture: state
                .images
                .profile_picture_url(claims.profile_picture.as_deref()),
        },
    }))
}

/// POST /api/users/profile/update-picture - multipart `file` field
pub async fn update_picture(
    State(state): State<AppState>,
    claims: AuthClaims,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read form: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        if !bytes.is_empty() {
            upload = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) = upload
        .ok_or_else(|| ApiError::validation_error("File not provided."))?;

    state
        .user_service
        .update_profile_picture(claims.0.user_id, &filename, &bytes)
        .await?;

    Ok(Json(StatusResponse::ok(
        "Profile picture updated successfully.",
    )))
}

/// POST /api/users/profile/update/{userid} - update name and email
pub async fn update_profile(
    State(state): State<AppState>,
    Path(userid): Path<i64>,
    Json(body): Json<ProfileUpdateRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    if userid == 0 {
        return Err(ApiError::unauthorized("You are not authorized!"));
    }
    if body.email.trim().is_empty() {
        return Err(ApiError::validation_error("Email is required."));
    }
    if body.name.trim().is_empty() {
        return Err(ApiError::validation_error("Name is required."));
    }

    state
        .user_service
        .update_profile(userid, &body.name, &body.email)
        .await
        .map_err(|e| match e {
            UserServiceError::EmailExists => ApiError::conflict("Email already exist"),
            other => other.into(),
        })?;

    Ok(Json(StatusResponse::ok("Your profile is updated")))
}

/// GET /api/users/dashboard - the caller's own listings, newest first
///
/// Restricted to the `user` role by the router; admins moderate listings
/// but do not own dashboard listings.
pub async fn dashboard(
    State(state): State<AppState>,
    claims: AuthClaims,
    Query(query): Query<ListingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = ListParams::new(query.page, query.page_size);

    let result = state
        .listing_service
        .list_by_user(claims.0.user_id, &params, &query.search)
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
