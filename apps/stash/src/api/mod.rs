//! # Stash HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Registry record counts
//! - `GET /inventory` - List inventory records (`?disposal=true` for disposal candidates)
//! - `POST /inventory` - Create an inventory record (allocates its asset number)
//! - `GET|PUT|DELETE /inventory/{asset_number}` - Show, update or delete one record
//! - `GET /assigned-asset` - List assignments
//! - `POST /assigned-asset` - Add an asset and assign it to an employee
//! - `GET /maintenance` - Maintenance log joined with inventory (`asset_number`, `from`, `to` filters)
//! - `POST /maintenance` - Log a maintenance event (allocates its reference)
//! - `DELETE /maintenance/{reference}` - Delete a maintenance entry
//!
//! ## Security Configuration
//!
//! Taken from the `[security]` table of [`crate::config::StashConfig`]:
//!
//! - `cors_origins`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `rate_limit`: Requests per second (default: 100, 0 to disable)
//! - `api_key`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{ApiKey, api_key_auth_middleware};
pub use middleware::{GlobalRateLimiter, create_rate_limiter, rate_limit_middleware};
// Re-export handlers and types for integration tests (via `stash::api::*`)
pub use handlers::{
    assign_asset_handler, create_asset_handler, delete_asset_handler, delete_maintenance_handler,
    error_status, get_asset_handler, health_handler, list_assets_handler,
    list_assignments_handler, list_maintenance_handler, log_maintenance_handler,
    status_handler, update_asset_handler,
};
pub use types::{
    AssetListResponse, AssetResponse, AssignAssetRequest, AssignmentListResponse,
    AssignmentResponse, CreateAssetRequest, ErrorResponse, HealthResponse, InventoryQuery,
    LogMaintenanceRequest, MaintenanceListResponse, MaintenanceQuery, MaintenanceResponse,
    StatusResponse, UpdateAssetRequest,
};

use crate::config::{SecurityConfig, StashConfig};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get},
};
use stash_core::{Registry, StashError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body (2 MB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the registry.
#[derive(Clone)]
pub struct AppState {
    /// Every allocation runs under the write lock.
    pub registry: Arc<RwLock<Registry>>,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from the configured origins.
///
/// - `"*"`: allows all origins
/// - `None`: localhost only
/// - otherwise: the comma-separated list, falling back to localhost when
///   none of the entries parse
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (cors_origins = \"*\")");
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(ALLOWED_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if `rate_limit > 0`)
/// 5. Authentication (if an API key is configured)
pub fn create_router(state: AppState, security: &SecurityConfig) -> Router {
    let cors = build_cors_layer(security.cors_origins.as_deref());

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/inventory",
            get(handlers::list_assets_handler).post(handlers::create_asset_handler),
        )
        .route(
            "/inventory/{asset_number}",
            get(handlers::get_asset_handler)
                .put(handlers::update_asset_handler)
                .delete(handlers::delete_asset_handler),
        )
        .route(
            "/assigned-asset",
            get(handlers::list_assignments_handler).post(handlers::assign_asset_handler),
        )
        .route(
            "/maintenance",
            get(handlers::list_maintenance_handler).post(handlers::log_maintenance_handler),
        )
        .route(
            "/maintenance/{reference}",
            delete(handlers::delete_maintenance_handler),
        );

    match security.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            router = router.layer(axum_middleware::from_fn_with_state(
                ApiKey::new(key),
                auth::api_key_auth_middleware,
            ));
        }
        None => {
            tracing::warn!(
                "API key authentication DISABLED - all endpoints are publicly accessible. \
                 Set security.api_key or STASH_API_KEY to enable it."
            );
        }
    }

    if security.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", security.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(security.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(config: &StashConfig, registry: Registry) -> Result<(), StashError> {
    let addr = config.server.address();
    let router = create_router(AppState::new(registry), &config.security);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StashError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Stash HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StashError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

// =============================================================================
// TESTS
// =============================================================================
