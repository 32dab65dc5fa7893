//! User account API endpoints
//!
//! - GET /api/users - accounts with the user role
//! - POST /api/users/register - registration with verification email
//! - POST /api/users/login - authentication, issues the claims token
//! - POST /api/users/verify-account - consume the verification token
//! - POST /api/users/forgot-password - request a reset token
//! - POST /api/users/reset-password - consume the reset token

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{LoginResponse, StatusResponse, UserResponse};
use crate::models::RegisterInput;
use crate::services::UserServiceError;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for account verification
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
}

/// Request body for requesting a password reset
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Request body for resetting the password
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

/// GET /api/users - list accounts with the `user` role
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.user_service.list_members().await?;

    let users = users
        .into_iter()
        .map(|u| UserResponse::from_user(u, &state.images))
        .collect();

    Ok(Json(users))
}

/// POST /api/users/register - register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation_error(
            "Name, email, and password are required.",
        ));
    }

    state
        .user_service
        .register(RegisterInput::new(body.name, body.email, body.password))
        .await
        .map_err(|e| match e {
            UserServiceError::EmailExists => ApiError::conflict("User already exists."),
            UserServiceError::InternalError(cause) => {
                tracing::error!("Registration failed: {:#}", cause);
                ApiError::internal_error("User registration failed.")
            }
            other => other.into(),
        })?;

    Ok(Json(StatusResponse::ok(
        "You have successfully registered. Please check your email for verification.",
    )))
}

/// POST /api/users/login - authenticate and issue a claims token
///
/// Fails distinctly for unknown email, unverified account, and password
/// mismatch; all three are 401.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation_error("Email and password are required."));
    }

    let user = state
        .user_service
        .authenticate(&body.email, &body.password)
        .await?;

    let token = state.token_service.issue(&user).map_err(|e| {
        tracing::error!("Token issuance failed: {}", e);
        ApiError::internal_error("Login failed.")
    })?;

    Ok(Json(LoginResponse {
        status: true,
        message: "Login successful.".to_string(),
        token,
        user: UserResponse::from_user(user, &state.images),
    }))
}

/// POST /api/users/verify-account - consume the emailed verification token
pub async fn verify_account(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    if body.email.trim().is_empty() || body.token.trim().is_empty() {
        return Err(ApiError::validation_error("Email and token are required."));
    }

    state
        .user_service
        .verify_email(&body.email, &body.token)
        .await?;

    Ok(Json(StatusResponse::ok("Email verified successfully.")))
}

/// POST /api/users/forgot-password - store a reset token and email the link
///
/// The response does not reveal whether the account exists beyond the
/// failure status itself.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::validation_error("Email is required."));
    }

    state
        .user_service
        .request_password_reset(&body.email)
        .await
        .map_err(|e| match e {
            UserServiceError::EmailNotFound => {
                ApiError::validation_error("Unable to send reset email.")
            }
            other => other.into(),
        })?;

    Ok(Json(StatusResponse::ok(
        "Password reset email sent. Please check your inbox.",
    )))
}

/// POST /api/users/reset-password - consume the reset token
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    if body.email.trim().is_empty() || body.token.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation_error(
            "Email, token, and password are required.",
        ));
    }

    state
        .user_service
        .reset_password(&body.email, &body.token, &body.password)
        .await?;

    Ok(Json(StatusResponse::ok(
        "Password has been reset successfully.",
    )))
}
