//! Configuration file integration tests.
//!
//! Tests verify:
//! - A configuration file on disk produces a working pyramid and router
//! - Empty tiles are read relative to the configuration file
//! - Invalid files are rejected with the matching `ConfigError`

use axum::http::StatusCode;

use fractal_tiles::error::ConfigError;
use fractal_tiles::pyramid::load_pyramid;
use fractal_tiles::tile::TileService;
use fractal_tiles::{create_router, RouterConfig};

use super::test_utils::{body_bytes, get, is_valid_png, write_config};

const EXAMPLE_CONFIG: &str = "\
# Reference pyramid
Size          2048 2048
PageSize      512 512
MimeType      image/png
SkippedLevels 0
BoundingBox   -2.0,-1.5,1.0,1.5
";

#[tokio::test]
async fn test_serve_from_config_file() {
    let (_dir, path) = write_config(EXAMPLE_CONFIG, &[]);

    let pyramid = load_pyramid(&path).unwrap();
    assert_eq!(pyramid.level_count(), 3);

    let router = create_router(
        TileService::new(pyramid),
        RouterConfig::new().with_tracing(false),
    );

    let response = get(router, "/tiles/2/3/3.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(is_valid_png(&body_bytes(response).await));
}

#[tokio::test]
async fn test_empty_tile_file_is_served() {
    let config = format!("{}EmptyTile blank.png\n", EXAMPLE_CONFIG);
    let (_dir, path) = write_config(&config, &[("blank.png", &b"blank tile bytes"[..])]);

    let router = create_router(
        TileService::new(load_pyramid(&path).unwrap()),
        RouterConfig::new().with_tracing(false),
    );

    let body = body_bytes(get(router, "/tiles/7/0/0").await).await;
    assert_eq!(body.as_ref(), b"blank tile bytes");
}

#[test]
fn test_minimal_config_defaults() {
    let (_dir, path) = write_config("Size 4096 4096\n", &[]);
    let pyramid = load_pyramid(&path).unwrap();

    assert_eq!(pyramid.tile_size(), 512);
    assert_eq!(pyramid.level_count(), 4);
    assert_eq!(pyramid.mime_type(), "image/jpeg");
    assert_eq!(pyramid.skip_levels(), 0);
}

fn load_error(text: &str) -> ConfigError {
    let (_dir, path) = write_config(text, &[]);
    match load_pyramid(&path) {
        Err(e) => e,
        Ok(_) => panic!("{:?} was accepted", text),
    }
}

#[test]
fn test_rejected_configs() {
    assert_eq!(
        load_error("PageSize 512 512\n"),
        ConfigError::MissingDirective("Size")
    );
    assert!(matches!(
        load_error("Size 2048 2048\nPageSize 512 256\n"),
        ConfigError::NonSquareTile {
            width: 512,
            height: 256
        }
    ));
    assert!(matches!(
        load_error("Size 2048 2048 1 3\n"),
        ConfigError::UnsupportedPixelFormat(_)
    ));
    assert!(matches!(
        load_error("Size 2048 2048\nMimeType image/gif\n"),
        ConfigError::UnsupportedFormat(_)
    ));
    assert!(matches!(
        load_error("Size 2048 2048\nSkippedLevels 3\n"),
        ConfigError::InvalidSkipLevels {
            skip_levels: 3,
            level_count: 3
        }
    ));
    assert!(matches!(
        load_error("Size 2048 two\n"),
        ConfigError::InvalidValue { key: "Size", .. }
    ));
    assert!(matches!(
        load_error("Size 2048 2048\nBoundingBox 1,1,-1,-1\n"),
        ConfigError::InvalidBoundingBox(_)
    ));
    assert!(matches!(
        load_error("Size 2048 2048\nEmptyTile nowhere.png\n"),
        ConfigError::Read { .. }
    ));
}
