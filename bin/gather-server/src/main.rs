//! Gather Platform Server
//!
//! Production server for the event-management REST APIs:
//! - Auth API: register, login, profile
//! - Events API: catalog, registration, favorites
//! - Admin API: platform events, users, dashboard, reports
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATHER_API_PORT` | `5000` | HTTP API port |
//! | `GATHER_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `GATHER_MONGO_DB` | `eventmanager` | MongoDB database name |
//! | `GATHER_JWT_SECRET` | - | HS256 token signing secret (required) |
//! | `GATHER_TOKEN_EXPIRY_SECS` | `604800` | Access token lifetime |
//! | `GATHER_PUBLIC_DIR` | `public` | Root of served upload directories |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gather_platform::api::{admin_router, auth_router, events_router, ApiDoc, AppState};
use gather_platform::repository::{ensure_indexes, EventRepository, UserRepository};
use gather_platform::service::{AuthService, PasswordService, RegistrationService, UploadService};
use gather_platform::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting Gather Platform Server");

    let config = AppConfig::from_env()?;

    // Connect to MongoDB
    info!("Connecting to MongoDB: {}/{}", config.mongo_url, config.mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_url).await?;
    let db = mongo_client.database(&config.mongo_db);
    ensure_indexes(&db).await?;

    // Initialize repositories and services
    let users = Arc::new(UserRepository::new(&db));
    let events = Arc::new(EventRepository::new(&db));
    let auth_service = Arc::new(AuthService::new(&config.jwt_secret, config.token_expiry_secs));
    let password_service = Arc::new(PasswordService::new());
    let registration_service = Arc::new(RegistrationService::new(events.clone(), users.clone()));
    let upload_service = Arc::new(UploadService::new(&config.public_dir));
    upload_service.ensure_directories().await?;
    info!("Repositories and services initialized");

    let state = AppState {
        auth_service,
        password_service,
        registration_service,
        upload_service,
        users,
        events,
    };

    let app = Router::new()
        .nest("/api", auth_router())
        .nest("/api/events", events_router())
        .nest("/api/admin", admin_router())
        .nest_service("/uploads", ServeDir::new(config.uploads_dir()))
        .nest_service("/profiles", ServeDir::new(config.profiles_dir()))
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state);

    let api_addr = format!("0.0.0.0:{}", config.api_port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gather Platform Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
