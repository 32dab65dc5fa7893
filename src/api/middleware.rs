//! API middleware
//!
//! Contains:
//! - `AppState` shared by all handlers
//! - `ApiError`, the `{ status: false, message }` error body with its
//!   HTTP status mapping
//! - Bearer-token authentication middleware and role guards

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::models::UserRole;
use crate::services::{
    CategoryService, CategoryServiceError, Claims, ImageStore, ImageStoreError, ListingService,
    ListingServiceError, TokenError, TokenService, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub listing_service: Arc<ListingService>,
    pub category_service: Arc<CategoryService>,
    pub token_service: Arc<TokenService>,
    pub images: Arc<ImageStore>,
}

/// Validated identity claims extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthClaims>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("User not authenticated."))
    }
}

/// Error response body: `{ "status": false, "message": "..." }`
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub status: bool,
    pub message: String,
}

/// API error with an HTTP status code
#[derive(Debug)]
pub struct ApiError {
    pub status_code: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            status: false,
            message: self.message,
        };
        (self.status_code, Json(body)).into_response()
    }
}

// Service errors carry the taxonomy; underlying causes are logged here and
// never echoed into responses.

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::EmailExists => ApiError::conflict(e.to_string()),
            UserServiceError::EmailNotFound
            | UserServiceError::EmailUnverified
            | UserServiceError::InvalidPassword
            | UserServiceError::InvalidToken => ApiError::unauthorized(e.to_string()),
            UserServiceError::AlreadyVerified => ApiError::validation_error(e.to_string()),
            UserServiceError::NotFound => ApiError::not_found(e.to_string()),
            UserServiceError::Image(img) => img.into(),
            UserServiceError::InternalError(cause) => {
                tracing::error!("User service error: {:#}", cause);
                ApiError::internal_error("Something went wrong. Please try again later.")
            }
        }
    }
}

impl From<ListingServiceError> for ApiError {
    fn from(e: ListingServiceError) -> Self {
        match e {
            ListingServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ListingServiceError::NotFound => ApiError::not_found(e.to_string()),
            ListingServiceError::Image(img) => img.into(),
            ListingServiceError::InternalError(cause) => {
                tracing::error!("Listing service error: {:#}", cause);
                ApiError::internal_error("Something went wrong. Please try again later.")
            }
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CategoryServiceError::InternalError(cause) => {
                tracing::error!("Category service error: {:#}", cause);
                ApiError::internal_error("Something went wrong. Please try again later.")
            }
        }
    }
}

impl From<ImageStoreError> for ApiError {
    fn from(e: ImageStoreError) -> Self {
        match e {
            ImageStoreError::InvalidExtension | ImageStoreError::FileTooLarge(_) => {
                ApiError::validation_error(e.to_string())
            }
            ImageStoreError::Io(cause) => {
                tracing::error!("Image store error: {}", cause);
                ApiError::internal_error("Failed to store the uploaded file.")
            }
        }
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Authentication middleware: validates the bearer token and stores the
/// claims as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token."))?;

    let claims = state.token_service.validate(&token).map_err(|e| match e {
        TokenError::Expired => ApiError::unauthorized("Token has expired."),
        _ => ApiError::unauthorized("Invalid authentication token."),
    })?;

    request.extensions_mut().insert(AuthClaims(claims));
    Ok(next.run(request).await)
}

/// Admin authorization middleware (layered inside `require_auth`)
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let claims = request
        .extensions()
        .get::<AuthClaims>()
        .ok_or_else(|| ApiError::unauthorized("User not authenticated."))?;

    if claims.0.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin privileges required."));
    }

    Ok(next.run(request).await)
}

/// Member (role = user) authorization middleware. Admins are deliberately
/// excluded: the dashboard shows listings the caller owns.
pub async fn require_member(request: Request, next: Next) -> Result<Response, ApiError> {
    let claims = request
        .extensions()
        .get::<AuthClaims>()
        .ok_or_else(|| ApiError::unauthorized("User not authenticated."))?;

    if claims.0.role != UserRole::User {
        return Err(ApiError::forbidden("This endpoint is for user accounts."));
    }

    Ok(next.run(request).await)
}
