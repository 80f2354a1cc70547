//! API integration tests for tile retrieval and error handling.
//!
//! Tests verify:
//! - Rendered tiles and empty tiles for the reference pyramid
//! - Skipped levels and the extra axis
//! - Error cases (malformed address, wrong method, encode overflow)
//! - HTTP response codes and headers

use axum::http::{header, Method, StatusCode};

use fractal_tiles::pyramid::RasterSize;
use fractal_tiles::tile::{escape_time, MAX_ITERATIONS};
use fractal_tiles::RouterConfig;

use super::test_utils::{
    body_bytes, body_json, decode_luma, example_pyramid, example_router, example_settings, get,
    is_valid_jpeg, is_valid_png, router_for, send,
};

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_retrieval_success() {
    let response = get(example_router(), "/tiles/2/1/3.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600"
    );

    let body = body_bytes(response).await;
    assert!(is_valid_png(&body), "Response should be a valid PNG");

    let tile = decode_luma(&body);
    assert_eq!(tile.dimensions(), (512, 512));
}

#[tokio::test]
async fn test_tile_pixels_follow_plane_mapping() {
    let body = body_bytes(get(example_router(), "/tiles/2/1/3").await).await;
    let tile = decode_luma(&body);

    // Level 2 is native resolution: 3 / 2048 plane units per pixel
    let resolution = 3.0 / 2048.0;
    for (px, py) in [(0u32, 0u32), (100, 200), (511, 511)] {
        let cx = -2.0 + f64::from(3 * 512 + px) * resolution;
        let cy = 1.5 - f64::from(512 + py) * resolution;
        assert_eq!(tile.get_pixel(px, py).0[0], escape_time(cx, cy));
    }
}

#[tokio::test]
async fn test_coarsest_tile_covers_whole_box() {
    let body = body_bytes(get(example_router(), "/tiles/0/0/0").await).await;
    let tile = decode_luma(&body);

    // Top-left corner (-2, 1.5) lies outside radius 2 and escapes at once
    assert_eq!(tile.get_pixel(0, 0).0[0], 1);

    // Pixel (341, 256) maps to about (-0.002, 0.0), inside the set
    assert_eq!(tile.get_pixel(341, 256).0[0], MAX_ITERATIONS);
}

#[tokio::test]
async fn test_leading_segments_are_ignored() {
    let plain = body_bytes(get(example_router(), "/tiles/2/1/3").await).await;
    let named = body_bytes(get(example_router(), "/tiles/mandelbrot/2/1/3.png").await).await;
    assert_eq!(plain, named);
}

#[tokio::test]
async fn test_jpeg_output() {
    let router = router_for(
        example_settings().with_mime_type("image/jpeg"),
        RouterConfig::new(),
    );

    let response = get(router, "/tiles/1/0/1.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    assert!(is_valid_jpeg(&body_bytes(response).await));
}

#[tokio::test]
async fn test_cache_max_age_header() {
    let router = router_for(
        example_settings(),
        RouterConfig::new().with_cache_max_age(60),
    );

    let response = get(router, "/tiles/0/0/0").await;
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=60"
    );
}

#[tokio::test]
async fn test_head_request() {
    let response = send(example_router(), Method::HEAD, "/tiles/0/0/0").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
}

// =============================================================================
// Empty Tiles
// =============================================================================

#[tokio::test]
async fn test_out_of_bounds_column_returns_empty_tile() {
    let empty = example_pyramid().empty_tile().clone();

    let response = get(example_router(), "/tiles/2/0/4.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600"
    );

    let body = body_bytes(response).await;
    assert_eq!(body, empty);
    assert!(decode_luma(&body).pixels().all(|p| p.0[0] == 0));
}

#[tokio::test]
async fn test_out_of_bounds_level_and_row_return_empty_tile() {
    let empty = example_pyramid().empty_tile().clone();

    for uri in ["/tiles/3/0/0", "/tiles/1/2/0", "/tiles/0/0/1", "/tiles/99/99/99"] {
        let response = get(example_router(), uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(body_bytes(response).await, empty, "{}", uri);
    }
}

#[tokio::test]
async fn test_configured_empty_tile() {
    let router = router_for(
        example_settings().with_empty_tile(b"EMPTY".to_vec()),
        RouterConfig::new(),
    );

    let body = body_bytes(get(router, "/tiles/5/0/0").await).await;
    assert_eq!(body.as_ref(), b"EMPTY");
}

// =============================================================================
// Skipped Levels and Extra Axis
// =============================================================================

#[tokio::test]
async fn test_skipped_levels() {
    let skipped = router_for(example_settings().with_skip_levels(2), RouterConfig::new());

    // Visible level 0 is full level 2
    let shifted = body_bytes(get(skipped.clone(), "/tiles/0/1/3").await).await;
    let direct = body_bytes(get(example_router(), "/tiles/2/1/3").await).await;
    assert_eq!(shifted, direct);

    // Only one level remains visible
    let empty = example_pyramid().empty_tile().clone();
    assert_eq!(body_bytes(get(skipped, "/tiles/1/0/0").await).await, empty);
}

#[tokio::test]
async fn test_extra_axis() {
    let mut settings = example_settings();
    settings.size = Some(RasterSize::square(2048).with_depth(4));
    let router = router_for(settings, RouterConfig::new());

    // Four segments are required; z does not change the picture
    let z0 = body_bytes(get(router.clone(), "/tiles/0/2/1/3").await).await;
    let z3 = body_bytes(get(router.clone(), "/tiles/3/2/1/3").await).await;
    let flat = body_bytes(get(example_router(), "/tiles/2/1/3").await).await;
    assert_eq!(z0, z3);
    assert_eq!(z0, flat);

    let response = get(router, "/tiles/2/1/3").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_malformed_address() {
    for uri in ["/tiles/2/one/3", "/tiles/1/3", "/tiles/2/1/-3", "/tiles/2/1/3.5.png"] {
        let response = get(example_router(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_address");
        assert_eq!(json["status"], 400);
        assert!(json["message"].is_string());
    }
}

#[tokio::test]
async fn test_non_read_methods_are_declined() {
    for method in [Method::POST, Method::PUT, Method::DELETE] {
        let response = send(example_router(), method.clone(), "/tiles/0/0/0").await;
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{}",
            method
        );
    }
}

#[tokio::test]
async fn test_encode_overflow_is_server_error() {
    let blank_len = example_pyramid().empty_tile().len();
    let router = router_for(
        example_settings().with_max_tile_size(blank_len),
        RouterConfig::new(),
    );

    let response = get(router.clone(), "/tiles/2/1/1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "encode_overflow");

    // Empty tiles are still served
    let response = get(router, "/tiles/2/9/9").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route() {
    let response = get(example_router(), "/levels").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Metadata Endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let response = get(example_router(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert!(health["version"].is_string());
}

#[tokio::test]
async fn test_pyramid_endpoint() {
    let response = get(example_router(), "/pyramid").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["width"], 2048);
    assert_eq!(json["height"], 2048);
    assert_eq!(json["depth"], 1);
    assert_eq!(json["tile_size"], 512);
    assert_eq!(json["mime_type"], "image/png");
    assert_eq!(json["skipped_levels"], 0);
    assert_eq!(json["level_count"], 3);
    assert_eq!(json["bounding_box"]["x_min"], -2.0);
    assert_eq!(json["bounding_box"]["y_max"], 1.5);

    let levels = json["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[0]["tiles_x"], 1);
    assert_eq!(levels[1]["tiles_x"], 2);
    assert_eq!(levels[2]["tiles_x"], 4);
    assert_eq!(levels[2]["width"], 2048);
    assert_eq!(levels[0]["resolution_x"], 3.0 / 512.0);
}

#[tokio::test]
async fn test_pyramid_endpoint_with_skipped_levels() {
    let router = router_for(example_settings().with_skip_levels(1), RouterConfig::new());

    let json = body_json(get(router, "/pyramid").await).await;
    assert_eq!(json["skipped_levels"], 1);
    assert_eq!(json["level_count"], 2);
    assert_eq!(json["levels"][0]["level"], 0);
    assert_eq!(json["levels"][0]["tiles_x"], 2);
}
