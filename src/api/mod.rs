//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Listly backend:
//! - Listing endpoints (paginated search, joined detail, multipart save,
//!   approval, deletion)
//! - Category endpoints
//! - User account endpoints (register/login/verify/reset)
//! - Profile and dashboard endpoints
//! - Static serving of uploaded files under /uploads

pub mod categories;
pub mod common;
pub mod listings;
pub mod middleware;
pub mod profile;
pub mod responses;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthClaims};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .route("/listing/approval", put(listings::set_approval))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Dashboard is restricted to the user role
    let member_routes = Router::new()
        .route("/users/dashboard", get(profile::dashboard))
        .route_layer(axum_middleware::from_fn(middleware::require_member))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not a specific role)
    let protected_routes = Router::new()
        .route("/listings", post(listings::save_listing))
        .route("/listing/{id}", delete(listings::delete_listing))
        .route("/users/profile", get(profile::profile))
        .route(
            "/users/profile/update-picture",
            post(profile::update_picture),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/categories", categories::router())
        .route("/listings", get(listings::list_listings))
        .route("/listing/{id}", get(listings::get_listing))
        .route("/users", get(users::list_users))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/verify-account", post(users::verify_account))
        .route("/users/forgot-password", post(users::forgot_password))
        .route("/users/reset-password", post(users::reset_password))
        .route(
            "/users/profile/update/{userid}",
            post(profile::update_profile),
        )
        .merge(admin_routes)
        .merge(member_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware and static file serving
pub fn build_router(state: AppState, cors_origin: &str, upload_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        // Uploaded files are served as static assets
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, EmailConfig, UploadConfig};
    use crate::db::repositories::{
        SqlxCategoryRepository, SqlxListingRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;
    use crate::services::{
        CategoryService, EmailService, ImageStore, ListingService, TokenService, UserService,
    };
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct TestApp {
        server: TestServer,
        state: AppState,
        _dir: TempDir,
    }

    async fn spawn_app() -> TestApp {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let upload = UploadConfig {
            path: dir.path().to_path_buf(),
            max_file_size: 1024 * 1024,
        };
        let images = Arc::new(ImageStore::new(&upload, "http://localhost:5067"));
        let email = Arc::new(EmailService::new(EmailConfig::default()));

        let auth = AuthConfig {
            secret: "api-test-secret".to_string(),
            ..AuthConfig::default()
        };
        let token_service = Arc::new(TokenService::new(&auth));

        let users = SqlxUserRepository::boxed(pool.clone());
        let categories = SqlxCategoryRepository::boxed(pool.clone());
        let listings = SqlxListingRepository::boxed(pool.clone());

        let state = AppState {
            user_service: Arc::new(UserService::new(users.clone(), email, images.clone())),
            listing_service: Arc::new(ListingService::new(
                listings,
                users,
                categories.clone(),
                images.clone(),
            )),
            category_service: Arc::new(CategoryService::new(categories)),
            token_service,
            images,
        };

        let app = build_router(state.clone(), "http://localhost:4000", dir.path());
        let server = TestServer::new(app).expect("Failed to start test server");

        TestApp {
            server,
            state,
            _dir: dir,
        }
    }

    async fn register_and_verify(app: &TestApp, name: &str, email: &str, password: &str) {
        let response = app
            .server
            .post("/api/users/register")
            .json(&json!({ "name": name, "email": email, "password": password }))
            .await;
        response.assert_status_ok();

        let token = app
            .state
            .user_service
            .get_by_email(email)
            .await
            .expect("Failed to get user")
            .expect("User exists")
            .verification_token
            .expect("Token stored");

        let response = app
            .server
            .post("/api/users/verify-account")
            .json(&json!({ "email": email, "token": token }))
            .await;
        response.assert_status_ok();
    }

    async fn login(app: &TestApp, email: &str, password: &str) -> String {
        let response = app
            .server
            .post("/api/users/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["token"].as_str().expect("Token in response").to_string()
    }

    fn listing_form(title: &str) -> MultipartForm {
        MultipartForm::new()
            .add_text("title", title.to_string())
            .add_text("desc", format!("Description of {}", title))
            .add_text("tags", "tag1,tag2")
            .add_text("email", "seller@example.com")
            .add_text("link", "https://example.com")
            .add_part(
                "image",
                Part::bytes(b"fake image bytes".to_vec())
                    .file_name("photo.jpg")
                    .mime_type("image/jpeg"),
            )
    }

    #[tokio::test]
    async fn test_register_login_profile_flow() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        let token = login(&app, "a@x.com", "secret").await;

        let response = app
            .server
            .get("/api/users/profile")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], true);
        assert_eq!(body["user"]["email"], "a@x.com");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"]["profilePicture"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost:5067/"));
    }

    #[tokio::test]
    async fn test_login_before_verification_says_unverified() {
        let app = spawn_app().await;

        app.server
            .post("/api/users/register")
            .json(&json!({ "name": "A", "email": "a@x.com", "password": "secret" }))
            .await
            .assert_status_ok();

        let response = app
            .server
            .post("/api/users/login")
            .json(&json!({ "email": "a@x.com", "password": "secret" }))
            .await;

        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert_eq!(body["status"], false);
        assert_eq!(body["message"], "Please verify your email before logging in.");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let app = spawn_app().await;

        app.server
            .post("/api/users/register")
            .json(&json!({ "name": "A", "email": "a@x.com", "password": "secret" }))
            .await
            .assert_status_ok();

        let response = app
            .server
            .post("/api/users/register")
            .json(&json!({ "name": "B", "email": "a@x.com", "password": "other" }))
            .await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_missing_fields_rejected() {
        let app = spawn_app().await;

        let response = app
            .server
            .post("/api/users/register")
            .json(&json!({ "name": "", "email": "a@x.com", "password": "secret" }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_profile_requires_token() {
        let app = spawn_app().await;

        let response = app.server.get("/api/users/profile").await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_profile_rejects_garbage_token() {
        let app = spawn_app().await;

        let response = app
            .server
            .get("/api/users/profile")
            .authorization_bearer("not-a-real-token")
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_listings_empty_returns_404_envelope() {
        let app = spawn_app().await;

        let response = app.server.get("/api/listings").await;
        response.assert_status_not_found();

        let body: Value = response.json();
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["totalCount"], 0);
        assert_eq!(body["totalPages"], 0);
        assert_eq!(body["hasPrevious"], false);
        assert_eq!(body["hasNext"], false);
        assert!(body["data"]["listings"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_list_listing() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        let token = login(&app, "a@x.com", "secret").await;

        let response = app
            .server
            .post("/api/listings")
            .authorization_bearer(&token)
            .multipart(listing_form("Red Shoe"))
            .await;
        response.assert_status_ok();

        let response = app.server.get("/api/listings").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["totalCount"], 1);
        let listings = body["data"]["listings"].as_array().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0]["title"], "Red Shoe");
        // Pending until an admin approves
        assert_eq!(listings[0]["approved"], 0);
        assert!(listings[0]["image"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost:5067/uploads/listing_pictures/"));
    }

    #[tokio::test]
    async fn test_listing_search_filters() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        let token = login(&app, "a@x.com", "secret").await;

        for title in ["Red Shoe", "Blue Hat"] {
            app.server
                .post("/api/listings")
                .authorization_bearer(&token)
                .multipart(listing_form(title))
                .await
                .assert_status_ok();
        }

        let response = app.server.get("/api/listings?search=shoe").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["totalCount"], 1);
        assert_eq!(body["data"]["listings"][0]["title"], "Red Shoe");
    }

    #[tokio::test]
    async fn test_create_listing_requires_auth() {
        let app = spawn_app().await;

        let response = app
            .server
            .post("/api/listings")
            .multipart(listing_form("Red Shoe"))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_get_single_listing_with_owner() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        let token = login(&app, "a@x.com", "secret").await;

        app.server
            .post("/api/listings")
            .authorization_bearer(&token)
            .multipart(listing_form("Red Shoe"))
            .await
            .assert_status_ok();

        let response = app.server.get("/api/listing/1").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], true);
        assert_eq!(body["data"]["listing"]["title"], "Red Shoe");
        assert_eq!(body["data"]["user"]["email"], "a@x.com");

        let response = app.server.get("/api/listing/999").await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_dashboard_shows_own_listings_only() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        register_and_verify(&app, "B", "b@x.com", "secret").await;
        let token_a = login(&app, "a@x.com", "secret").await;
        let token_b = login(&app, "b@x.com", "secret").await;

        app.server
            .post("/api/listings")
            .authorization_bearer(&token_a)
            .multipart(listing_form("Mine"))
            .await
            .assert_status_ok();

        let response = app
            .server
            .get("/api/users/dashboard")
            .authorization_bearer(&token_a)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["totalCount"], 1);

        // The other user has no listings: the 404 envelope
        let response = app
            .server
            .get("/api/users/dashboard")
            .authorization_bearer(&token_b)
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_approval_requires_admin() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        let token = login(&app, "a@x.com", "secret").await;

        app.server
            .post("/api/listings")
            .authorization_bearer(&token)
            .multipart(listing_form("Red Shoe"))
            .await
            .assert_status_ok();

        let response = app
            .server
            .put("/api/listing/approval?Id=1&Approved=1")
            .authorization_bearer(&token)
            .await;
        response.assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_admin_can_approve() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        let user_token = login(&app, "a@x.com", "secret").await;

        app.server
            .post("/api/listings")
            .authorization_bearer(&user_token)
            .multipart(listing_form("Red Shoe"))
            .await
            .assert_status_ok();

        // Promote a second account to admin directly in the store, then
        // issue its token
        register_and_verify(&app, "Root", "admin@x.com", "secret").await;
        let mut admin = app
            .state
            .user_service
            .get_by_email("admin@x.com")
            .await
            .expect("Failed to get")
            .expect("User exists");
        admin.role = UserRole::Admin;
        let admin_token = app
            .state
            .token_service
            .issue(&admin)
            .expect("Failed to issue");

        let response = app
            .server
            .put("/api/listing/approval?Id=1&Approved=1")
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status_ok();

        let response = app.server.get("/api/listing/1").await;
        let body: Value = response.json();
        assert_eq!(body["data"]["listing"]["approved"], 1);
    }

    #[tokio::test]
    async fn test_delete_listing_requires_ownership() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        register_and_verify(&app, "B", "b@x.com", "secret").await;
        let token_a = login(&app, "a@x.com", "secret").await;
        let token_b = login(&app, "b@x.com", "secret").await;

        app.server
            .post("/api/listings")
            .authorization_bearer(&token_a)
            .multipart(listing_form("Mine"))
            .await
            .assert_status_ok();

        let response = app
            .server
            .delete("/api/listing/1")
            .authorization_bearer(&token_b)
            .await;
        response.assert_status_forbidden();

        let response = app
            .server
            .delete("/api/listing/1")
            .authorization_bearer(&token_a)
            .await;
        response.assert_status_ok();

        app.server.get("/api/listing/1").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_categories_crud() {
        let app = spawn_app().await;

        // Empty list is a 404 with an empty-list payload
        let response = app.server.get("/api/categories").await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert!(body["data"]["categories"].as_array().unwrap().is_empty());

        let response = app
            .server
            .post("/api/categories?name=Electronics&description=Gadgets")
            .await;
        response.assert_status_ok();

        let response = app.server.get("/api/categories").await;
        response.assert_status_ok();
        let body: Value = response.json();
        let categories = body.as_array().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0]["name"], "Electronics");
        assert_eq!(categories[0]["slug"], "electronics");

        // Missing description is a validation error
        let response = app.server.post("/api/categories?name=OnlyName").await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_forgot_and_reset_password_flow() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;

        app.server
            .post("/api/users/forgot-password")
            .json(&json!({ "email": "a@x.com" }))
            .await
            .assert_status_ok();

        let token = app
            .state
            .user_service
            .get_by_email("a@x.com")
            .await
            .expect("Failed to get")
            .expect("User exists")
            .verification_token
            .expect("Reset token stored");

        // Wrong token fails
        let response = app
            .server
            .post("/api/users/reset-password")
            .json(&json!({ "email": "a@x.com", "token": "bogus", "password": "new-secret" }))
            .await;
        response.assert_status_unauthorized();

        // Correct token succeeds
        app.server
            .post("/api/users/reset-password")
            .json(&json!({ "email": "a@x.com", "token": token, "password": "new-secret" }))
            .await
            .assert_status_ok();

        // And the token is single-use
        let response = app
            .server
            .post("/api/users/reset-password")
            .json(&json!({ "email": "a@x.com", "token": token, "password": "again" }))
            .await;
        response.assert_status_unauthorized();

        login(&app, "a@x.com", "new-secret").await;
    }

    #[tokio::test]
    async fn test_update_profile_picture_flow() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        let token = login(&app, "a@x.com", "secret").await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"pixels".to_vec())
                .file_name("me.png")
                .mime_type("image/png"),
        );
        let response = app
            .server
            .post("/api/users/profile/update-picture")
            .authorization_bearer(&token)
            .multipart(form)
            .await;
        response.assert_status_ok();

        let user = app
            .state
            .user_service
            .get_by_email("a@x.com")
            .await
            .expect("Failed to get")
            .expect("User exists");
        let stored = user.profile_picture.expect("Picture stored");
        assert!(app.state.images.exists(&stored));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;
        register_and_verify(&app, "B", "b@x.com", "secret").await;

        let user_a = app
            .state
            .user_service
            .get_by_email("a@x.com")
            .await
            .expect("Failed to get")
            .expect("User exists");

        let response = app
            .server
            .post(&format!("/api/users/profile/update/{}", user_a.id))
            .json(&json!({ "name": "A", "email": "b@x.com" }))
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_users_list_returns_members() {
        let app = spawn_app().await;
        register_and_verify(&app, "A", "a@x.com", "secret").await;

        let response = app.server.get("/api/users").await;
        response.assert_status_ok();
        let body: Value = response.json();
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["email"], "a@x.com");
        // Password material never leaves the API
        assert!(users[0].get("passwordHash").is_none());
        assert!(users[0].get("password_hash").is_none());
    }
}
