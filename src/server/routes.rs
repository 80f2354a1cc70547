//! Router configuration for the fractal tile server.
//!
//! This module defines the HTTP routes and applies middleware for request
//! gating, CORS and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                 - Health check
//! /pyramid                - Pyramid metadata
//! /tiles/{*address}       - Tile endpoint (gated when patterns are set)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fractal_tiles::pyramid::load_pyramid;
//! use fractal_tiles::server::{create_router, RequestGate, RouterConfig};
//! use fractal_tiles::tile::TileService;
//!
//! let tile_service = TileService::new(load_pyramid("mandelbrot.conf")?);
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()])
//!     .with_gate(RequestGate::from_strings([r"^/tiles/mandelbrot/"])?);
//!
//! let router = create_router(tile_service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{middleware, routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::gate::{gate_middleware, RequestGate};
use super::handlers::{
    health_handler, pyramid_handler, tile_handler, AppState, DEFAULT_CACHE_MAX_AGE,
};
use crate::tile::TileService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Path patterns a tile request must match (empty = serve all)
    pub gate: RequestGate,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    /// - No request gating
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
            gate: RequestGate::default(),
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Only serve tile requests whose path the gate allows.
    pub fn with_gate(mut self, gate: RequestGate) -> Self {
        self.gate = gate;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - The tile route, behind the request gate when patterns are configured
/// - Metadata routes (health check, pyramid description)
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router(tile_service: TileService, config: RouterConfig) -> Router {
    let app_state = AppState::with_cache_max_age(tile_service, config.cache_max_age);
    let cors = build_cors_layer(&config);

    let tile_routes = Router::new()
        .route("/tiles/{*address}", get(tile_handler))
        .with_state(app_state.clone());

    // route_layer sees the full /tiles/... path and leaves unmatched paths to the 404 fallback
    let tile_routes = if config.gate.is_empty() {
        tile_routes
    } else {
        tile_routes.route_layer(middleware::from_fn_with_state(
            config.gate.clone(),
            gate_middleware,
        ))
    };

    let metadata_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/pyramid", get(pyramid_handler))
        .with_state(app_state);

    let router = Router::new()
        .merge(tile_routes)
        .merge(metadata_routes)
        .layer(cors);

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
