//! Fractal Tiles - A tile server for on-demand Mandelbrot pyramids.
//!
//! This binary loads a pyramid configuration and starts the HTTP server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fractal_tiles::{
    config::{CheckConfig, Cli, Command, ServeConfig},
    pyramid::{load_pyramid, PyramidConfig},
    server::{create_router, RequestGate, RouterConfig},
    tile::TileService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let gate = match config.request_gate() {
        Ok(gate) => gate,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pyramid = match load_pyramid(&config.config) {
        Ok(pyramid) => pyramid,
        Err(e) => {
            error!("Pyramid configuration {}: {}", config.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    info!("Fractal Tiles v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Pyramid: {}", config.config.display());
    info!(
        "  Raster: {}x{} px, {} px tiles, {}",
        pyramid.size().x,
        pyramid.size().y,
        pyramid.tile_size(),
        pyramid.mime_type()
    );
    info!(
        "  Levels: {} visible ({} skipped)",
        pyramid.visible_level_count(),
        pyramid.skip_levels()
    );
    info!("  Max tile size: {} bytes", pyramid.max_tile_size());
    if gate.is_empty() {
        info!("  Gating: none");
    } else {
        info!("  Gating: {} pattern(s)", gate.len());
    }

    let tile_service = TileService::new(pyramid);
    let router = create_router(tile_service, build_router_config(&config, gate));

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/pyramid", addr);
    info!("    curl http://{}/tiles/0/0/0 -o tile", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "fractal_tiles=debug,tower_http=debug"
    } else {
        "fractal_tiles=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig, gate: RequestGate) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing)
        .with_gate(gate);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Fractal Tiles Configuration Check");
    println!("═════════════════════════════════");
    println!();

    let pyramid = match load_pyramid(&config.config) {
        Ok(pyramid) => {
            println!("✓ Pyramid: {}", config.config.display());
            pyramid
        }
        Err(e) => {
            println!("✗ Pyramid: {}", config.config.display());
            println!();
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_pyramid(&pyramid);

    println!();
    println!("═════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}

/// Print the pyramid summary and visible level table.
fn print_pyramid(pyramid: &PyramidConfig) {
    let size = pyramid.size();
    let bbox = pyramid.bounding_box();

    println!(
        "  Raster: {}x{} px, depth {}, {} band(s)",
        size.x, size.y, size.z, size.bands
    );
    println!("  Tile size: {} px", pyramid.tile_size());
    println!(
        "  Bounding box: ({}, {}) - ({}, {})",
        bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max
    );
    println!("  Format: {}", pyramid.mime_type());
    println!("  Max tile size: {} bytes", pyramid.max_tile_size());
    println!("  Empty tile: {} bytes", pyramid.empty_tile().len());
    println!(
        "  Levels: {} ({} skipped)",
        pyramid.level_count(),
        pyramid.skip_levels()
    );
    println!();
    println!("  level        size         tiles    resolution");
    println!("  ─────────────────────────────────────────────────");

    for (level, set) in pyramid
        .levels()
        .iter()
        .skip(pyramid.skip_levels())
        .enumerate()
    {
        println!(
            "  {:>5} {:>12} {:>13} {:>13.6e}",
            level,
            format!("{}x{}", set.width, set.height),
            format!("{}x{}", set.tiles_x, set.tiles_y),
            set.resolution_x
        );
    }
}
