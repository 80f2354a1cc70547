//! HTTP request handlers for the fractal tile API.
//!
//! This module contains the Axum handlers for serving tiles, pyramid
//! metadata and health checks.
//!
//! # Endpoints
//!
//! - `GET /tiles/{*address}` - Serve a tile
//! - `GET /pyramid` - Pyramid metadata
//! - `GET /health` - Health check endpoint

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{AddressError, TileError};
use crate::pyramid::BoundingBox;
use crate::tile::TileService;

/// Default `Cache-Control` max-age in seconds.
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile service.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The tile service for processing tile requests
    pub tile_service: TileService,

    /// Cache control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,
}

impl AppState {
    /// Create a new application state with the given tile service.
    pub fn new(tile_service: TileService) -> Self {
        Self::with_cache_max_age(tile_service, DEFAULT_CACHE_MAX_AGE)
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(tile_service: TileService, cache_max_age: u32) -> Self {
        Self {
            tile_service,
            cache_max_age,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_address")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Metadata for a single visible pyramid level.
#[derive(Debug, Serialize)]
pub struct LevelMetadataResponse {
    /// Level index as used in tile addresses (0 = coarsest visible level)
    pub level: usize,

    /// Width of this level in pixels
    pub width: u64,

    /// Height of this level in pixels
    pub height: u64,

    /// Number of tiles in X direction
    pub tiles_x: u64,

    /// Number of tiles in Y direction
    pub tiles_y: u64,

    /// Plane distance covered by one pixel along x
    pub resolution_x: f64,

    /// Plane distance covered by one pixel along y
    pub resolution_y: f64,
}

/// Response from the pyramid metadata endpoint.
#[derive(Debug, Serialize)]
pub struct PyramidMetadataResponse {
    /// Width of the full-resolution raster in pixels
    pub width: u64,

    /// Height of the full-resolution raster in pixels
    pub height: u64,

    /// Extent of the extra axis (1 when addresses carry none)
    pub depth: u64,

    /// Tile edge length in pixels
    pub tile_size: u32,

    /// Plane extent of the raster
    pub bounding_box: BoundingBox,

    /// MIME type of every tile
    pub mime_type: String,

    /// Number of coarse levels hidden from clients
    pub skipped_levels: usize,

    /// Number of addressable levels
    pub level_count: usize,

    /// Metadata for each addressable level
    pub levels: Vec<LevelMetadataResponse>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// This implementation logs errors appropriately based on their severity:
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level (server errors)
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            // 400 Bad Request - the path does not spell an address
            TileError::Address(_) => (StatusCode::BAD_REQUEST, "invalid_address"),

            // 500 Internal Server Error - rendering and encoding failures
            TileError::InvalidLevel { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "invalid_level"),
            TileError::Allocation { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "allocation_error")
            }
            TileError::EncodeOverflow { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "encode_overflow")
            }
            TileError::Encode { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "encode_error"),
            TileError::Worker { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "worker_error"),
        };
        let message = self.to_string();

        // Log errors based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Wrapper for handler errors to implement IntoResponse.
pub struct HandlerError(pub TileError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<TileError> for HandlerError {
    fn from(err: TileError) -> Self {
        HandlerError(err)
    }
}

impl From<AddressError> for HandlerError {
    fn from(err: AddressError) -> Self {
        HandlerError(TileError::Address(err))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{*address}`
///
/// The address is `[{z}/]{level}/{row}/{column}[.ext]`, read from the end of
/// the path; `z` is present only when the pyramid has an extra axis and any
/// earlier segments are ignored.
///
/// # Response
///
/// - `200 OK`: the rendered tile, or the empty tile for addresses outside
///   the pyramid
/// - `400 Bad Request`: the path does not spell a tile address
/// - `500 Internal Server Error`: rendering or encoding failed
///
/// # Headers
///
/// - `Content-Type`: the pyramid's MIME type
/// - `Cache-Control: public, max-age={cache_max_age}`
pub async fn tile_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Response, HandlerError> {
    let response = state.tile_service.get_tile(&address).await?;

    let headers = [
        (header::CONTENT_TYPE, response.content_type.to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
    ];

    Ok((StatusCode::OK, headers, response.data).into_response())
}

/// Handle pyramid metadata requests.
///
/// # Endpoint
///
/// `GET /pyramid`
///
/// Levels are listed in client numbering: skipped levels are omitted and
/// level 0 is the coarsest visible one.
pub async fn pyramid_handler(State(state): State<AppState>) -> Json<PyramidMetadataResponse> {
    let pyramid = state.tile_service.pyramid();
    let size = pyramid.size();

    let levels = pyramid
        .levels()
        .iter()
        .skip(pyramid.skip_levels())
        .enumerate()
        .map(|(level, set)| LevelMetadataResponse {
            level,
            width: set.width,
            height: set.height,
            tiles_x: set.tiles_x,
            tiles_y: set.tiles_y,
            resolution_x: set.resolution_x,
            resolution_y: set.resolution_y,
        })
        .collect();

    Json(PyramidMetadataResponse {
        width: size.x,
        height: size.y,
        depth: size.z,
        tile_size: pyramid.tile_size(),
        bounding_box: *pyramid.bounding_box(),
        mime_type: pyramid.mime_type().to_string(),
        skipped_levels: pyramid.skip_levels(),
        level_count: pyramid.visible_level_count(),
        levels,
    })
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
