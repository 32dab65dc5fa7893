//! Listly - A lightweight listings directory backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use listly::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxCategoryRepository, SqlxListingRepository, SqlxUserRepository},
    },
    services::{
        CategoryService, EmailService, ImageStore, ListingService, TokenService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "listly=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Listly backend...");

    // Load configuration; the signing secret has no default and startup
    // fails without it
    let config = Config::load_with_env(Path::new("config.yml"))?;
    config.validate()?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let listing_repo = SqlxListingRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());

    // Collaborators
    let images = Arc::new(ImageStore::new(&config.upload, &config.server.public_url));
    let email_service = Arc::new(EmailService::new(config.email.clone()));
    if !email_service.is_enabled() {
        tracing::warn!("SMTP host not configured; outbound email is disabled");
    }
    let token_service = Arc::new(TokenService::new(&config.auth));

    // Initialize services
    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        email_service,
        images.clone(),
    ));
    let listing_service = Arc::new(ListingService::new(
        listing_repo,
        user_repo,
        category_repo.clone(),
        images.clone(),
    ));
    let category_service = Arc::new(CategoryService::new(category_repo));

    // Build application state
    let state = AppState {
        user_service,
        listing_service,
        category_service,
        token_service,
        images,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin, &config.upload.path);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
