//! Test utilities for integration tests.
//!
//! Helpers for building pyramids, routers and configuration files, and for
//! checking encoded tiles.

use std::path::PathBuf;

use axum::body::{Body, Bytes};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use fractal_tiles::pyramid::{BoundingBox, PyramidConfig, PyramidSettings, RasterSize};
use fractal_tiles::tile::TileService;
use fractal_tiles::{create_router, RouterConfig};

// =============================================================================
// Pyramids
// =============================================================================

/// Settings for the reference pyramid: 2048x2048 px, 512 px tiles, 3 levels,
/// plane box (-2, -1.5) - (1, 1.5).
pub fn example_settings() -> PyramidSettings {
    PyramidSettings::new(RasterSize::square(2048))
        .with_page_size(512)
        .with_bounding_box(BoundingBox::new(-2.0, -1.5, 1.0, 1.5))
        .with_mime_type("image/png")
}

pub fn example_pyramid() -> PyramidConfig {
    PyramidConfig::new(example_settings()).unwrap()
}

/// Router over `settings` with tracing disabled.
pub fn router_for(settings: PyramidSettings, config: RouterConfig) -> Router {
    let pyramid = PyramidConfig::new(settings).unwrap();
    create_router(TileService::new(pyramid), config.with_tracing(false))
}

/// Router over the reference pyramid.
pub fn example_router() -> Router {
    router_for(example_settings(), RouterConfig::new())
}

// =============================================================================
// Requests
// =============================================================================

/// Send a request with `method` to `uri`.
pub async fn send(router: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    router.oneshot(request).await.unwrap()
}

/// Send a GET request to `uri`.
pub async fn get(router: Router, uri: &str) -> Response<Body> {
    send(router, Method::GET, uri).await
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Collect a JSON response body.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// =============================================================================
// Configuration Files
// =============================================================================

/// Write a configuration file (and optional side files) into a temp dir.
pub fn write_config(text: &str, files: &[(&str, &[u8])]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    for (name, data) in files {
        std::fs::write(dir.path().join(name), data).unwrap();
    }

    let path = dir.path().join("pyramid.conf");
    std::fs::write(&path, text).unwrap();
    (dir, path)
}

// =============================================================================
// Validation Helpers
// =============================================================================

/// Check if data is a valid PNG.
pub fn is_valid_png(data: &[u8]) -> bool {
    data.starts_with(b"\x89PNG\r\n\x1a\n")
        && image::load_from_memory_with_format(data, image::ImageFormat::Png).is_ok()
}

/// Check if data is a valid JPEG.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }

    // Check SOI marker
    if data[0] != 0xFF || data[1] != 0xD8 {
        return false;
    }

    // Check EOI marker at end
    if data[data.len() - 2] != 0xFF || data[data.len() - 1] != 0xD9 {
        return false;
    }

    image::load_from_memory_with_format(data, image::ImageFormat::Jpeg).is_ok()
}

/// Decode an 8-bit grayscale tile.
pub fn decode_luma(data: &[u8]) -> image::GrayImage {
    image::load_from_memory(data).unwrap().to_luma8()
}
