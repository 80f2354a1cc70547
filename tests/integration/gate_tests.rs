//! Request gating integration tests.
//!
//! Tests verify:
//! - Tile paths matching a configured pattern are served
//! - Tile paths matching no pattern get a 404 JSON error
//! - Metadata routes are never gated

use axum::http::StatusCode;

use fractal_tiles::{RequestGate, RouterConfig};

use super::test_utils::{body_bytes, body_json, example_settings, get, is_valid_png, router_for};

fn gated_router(patterns: &[&str]) -> axum::Router {
    let gate = RequestGate::from_strings(patterns).unwrap();
    router_for(example_settings(), RouterConfig::new().with_gate(gate))
}

#[tokio::test]
async fn test_matching_path_is_served() {
    let router = gated_router(&[r"^/tiles/mandelbrot/"]);

    let response = get(router, "/tiles/mandelbrot/1/1/1.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(is_valid_png(&body_bytes(response).await));
}

#[tokio::test]
async fn test_non_matching_path_is_not_found() {
    let router = gated_router(&[r"^/tiles/mandelbrot/"]);

    let response = get(router, "/tiles/julia/1/1/1.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_gate_runs_before_address_parsing() {
    let router = gated_router(&[r"^/tiles/mandelbrot/"]);

    // Malformed, but declined by the gate first
    let response = get(router, "/tiles/other/x/y/z").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_any_pattern_admits() {
    let router = gated_router(&[r"^/tiles/a/", r"\.png$"]);

    assert_eq!(
        get(router.clone(), "/tiles/a/0/0/0").await.status(),
        StatusCode::OK
    );
    assert_eq!(
        get(router.clone(), "/tiles/b/0/0/0.png").await.status(),
        StatusCode::OK
    );
    assert_eq!(
        get(router, "/tiles/b/0/0/0").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_metadata_routes_are_not_gated() {
    let router = gated_router(&[r"^/tiles/mandelbrot/"]);

    assert_eq!(get(router.clone(), "/health").await.status(), StatusCode::OK);
    assert_eq!(get(router, "/pyramid").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_gate_serves_everything() {
    let router = gated_router(&[]);
    assert_eq!(
        get(router, "/tiles/anything/0/0/0").await.status(),
        StatusCode::OK
    );
}
