/*!
 * Shopbook Core - Appointment Scheduling Backend
 *
 * Main application entry point for the Axum-based REST API server.
 */

// Module declarations
mod config;
mod db;
mod domain;
mod handlers;
mod middleware;
mod models;
mod repository;
mod routes;
mod services;
mod state;
mod utils;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use db::create_pool;
use middleware::cors::cors_from_env;
use repository::{postgres::PgBookingRepository, BookingRepository};
use routes::create_api_v1_routes;
use services::{AgendaService, LifecycleService, ReservationService};
use state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    timestamp: String,
    database: String,
}

/// API version info response
#[derive(Debug, Serialize, Deserialize)]
struct VersionResponse {
    name: String,
    version: String,
    rust_version: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for health check CLI flag
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 && args[1] == "--health-check" {
        return perform_health_check().await;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug,axum::rejection=trace,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Shopbook Core API server...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");
    tracing::info!("Environment: {}", config.server.environment);

    // Warn if debug/trace logging is enabled in production
    let log_level = std::env::var("RUST_LOG").unwrap_or_default();
    if config.server.environment == "production"
        && (log_level.contains("debug") || log_level.contains("trace"))
    {
        tracing::warn!(
            "RUST_LOG={} in production environment — consider setting to 'info' or 'warn' \
             to avoid exposing sensitive data in logs",
            log_level
        );
    }

    // Create database connection pool
    let pool = create_pool(&config.database).await?;
    tracing::info!("Database connection pool created successfully");

    // Build the repository facade and the three services on top of it
    let repo: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(pool.clone()));
    let reservation_service = Arc::new(ReservationService::new(repo.clone(), config.booking.clone()));
    let lifecycle_service = Arc::new(LifecycleService::new(repo.clone(), config.booking.clone()));
    let agenda_service = Arc::new(AgendaService::new(repo.clone()));
    tracing::info!("Booking services initialized");

    // Record server start time
    let start_time = std::time::SystemTime::now();

    // Create application state
    let app_state = AppState {
        pool: pool.clone(),
        reservation_service,
        lifecycle_service,
        agenda_service,
        booking: config.booking.clone(),
        security: config.security.clone(),
        start_time,
        environment: config.server.environment.clone(),
    };

    // Build application router
    let app = create_app(app_state, start_time);

    // Start the HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("Invalid server address");

    tracing::info!("HTTP server listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the Axum application router
///
/// # Arguments
///
/// * `state` - Application state containing database pool and services
/// * `start_time` - Server start timestamp for uptime calculation
fn create_app(state: AppState, start_time: std::time::SystemTime) -> Router {
    // Clone pool for health check handlers
    let pool_for_health1 = state.pool.clone();
    let pool_for_health2 = state.pool.clone();

    Router::new()
        // Health check endpoints
        .route(
            "/health",
            get(move || health_handler(pool_for_health1.clone(), start_time)),
        )
        .route(
            "/api/health",
            get(move || health_handler(pool_for_health2.clone(), start_time)),
        )
        // API version endpoint
        .route("/api/version", get(version_handler))
        // Root endpoint
        .route("/", get(root_handler))
        // API v1 routes
        .nest("/api/v1", create_api_v1_routes(state))
        // Add middleware (CORS must be added before other middleware)
        .layer(cors_from_env())
        .layer(TraceLayer::new_for_http())
}

/// Root handler - API information
async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Shopbook Core API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multi-service appointment scheduling backend",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "api_v1": "/api/v1"
        }
    }))
}

/// Health check handler
async fn health_handler(
    pool: sqlx::PgPool,
    start_time: std::time::SystemTime,
) -> impl IntoResponse {
    let uptime = start_time.elapsed().unwrap_or_default().as_secs();

    // Test database connection
    let db_status = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
    };

    let response = HealthResponse {
        status: if db_status == "connected" {
            "healthy"
        } else {
            "unhealthy"
        }
        .to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: db_status.to_string(),
    };

    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// Version info handler
async fn version_handler() -> impl IntoResponse {
    let response = VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
    };

    Json(response)
}

/// Perform health check for Docker healthcheck
async fn perform_health_check() -> anyhow::Result<()> {
    let port = env::var("SERVER_PORT").unwrap_or_else(|_| "8000".to_string());
    let url = format!("http://127.0.0.1:{}/health", port);

    let client = reqwest::Client::new();

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            println!("Health check passed");
            std::process::exit(0);
        }
        Ok(response) => {
            eprintln!("Health check failed with status: {}", response.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}
