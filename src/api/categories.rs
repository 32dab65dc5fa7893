//! Category API endpoints
//!
//! - GET /api/categories?search= - searchable category list
//! - POST /api/categories?name=&description= - create category

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::api::common::{CategorySearchQuery, CreateCategoryQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{CategoriesData, CategoryResponse, NotFoundEnvelope, StatusResponse};
use crate::services::CategoryServiceError;

/// Build the categories router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_categories).post(create_category))
}

/// GET /api/categories - list categories matching the search term
///
/// Returns the matching categories, or a 404 envelope with an empty list
/// when nothing matches.
async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategorySearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.category_service.list(&query.search).await?;

    if categories.is_empty() {
        let body =
            NotFoundEnvelope::new("No categories found.", CategoriesData { categories: vec![] });
        return Ok((StatusCode::NOT_FOUND, Json(body)).into_response());
    }

    let categories: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
    Ok(Json(categories).into_response())
}

/// POST /api/categories - create a category
///
/// Name and description are required query parameters; 400 when missing,
/// 500 on store failure.
async fn create_category(
    State(state): State<AppState>,
    Query(query): Query<CreateCategoryQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let name = query
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::validation_error("category name is required."))?;
    let description = query
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::validation_error("category description is required."))?;

    state
        .category_service
        .create(name, description)
        .await
        .map_err(|e| match e {
            CategoryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CategoryServiceError::InternalError(cause) => {
                tracing::error!("Category creation failed: {:#}", cause);
                ApiError::internal_error("Category creation failed.")
            }
        })?;

    Ok(Json(StatusResponse::ok("Category is created successfully")))
}
