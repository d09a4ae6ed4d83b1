//! services/api/src/bin/api.rs

use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use palabra_api::{
    adapters::{DbAdapter, HttpJobEnqueuer, ObjectStoreAdapter},
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use palabra_core::upload::UploadCoordinator;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Storage and Worker Adapters ---
    let blob_adapter = Arc::new(
        ObjectStoreAdapter::from_settings(&config.object_store)
            .map_err(|e| ApiError::Internal(format!("Object store setup failed: {}", e)))?,
    );
    info!(
        "Object store configured: {} (bucket {})",
        config.object_store.endpoint_url(),
        config.object_store.bucket
    );

    let enqueuer = Arc::new(
        HttpJobEnqueuer::new(config.worker_enqueue_url.clone(), config.enqueue_timeout)
            .map_err(|e| ApiError::Internal(format!("HTTP client setup failed: {}", e)))?,
    );

    // --- 4. Build the Shared AppState ---
    let uploads = UploadCoordinator::new(blob_adapter, db_adapter.clone(), enqueuer);
    let app_state = Arc::new(AppState {
        books: db_adapter.clone(),
        word_frequencies: db_adapter,
        uploads,
        config: config.clone(),
    });

    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
