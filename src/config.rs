//! Command-line configuration for the fractal tile server.
//!
//! Two subcommands are provided:
//! - `serve`: load a pyramid configuration file and serve its tiles
//! - `check`: load and validate a pyramid configuration file, then print its
//!   level table
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use fractal_tiles::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Checking {}", config.config.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! Every `serve` option can also be set via an environment variable with the
//! `FRACTAL_` prefix:
//!
//! - `FRACTAL_CONFIG` - Pyramid configuration file (required)
//! - `FRACTAL_HOST` - Server bind address (default: 0.0.0.0)
//! - `FRACTAL_PORT` - Server port (default: 3000)
//! - `FRACTAL_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `FRACTAL_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)
//! - `FRACTAL_REGEXP` - Path pattern a tile request must match
//! - `FRACTAL_VERBOSE` - Enable debug logging
//! - `FRACTAL_NO_TRACING` - Disable request tracing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::server::{RequestGate, DEFAULT_CACHE_MAX_AGE};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Fractal Tiles - A tile server for on-demand Mandelbrot pyramids.
///
/// Tiles are computed per request from a pyramid configuration file and
/// returned as size-bounded PNG or JPEG images.
#[derive(Parser, Debug, Clone)]
#[command(name = "fractal-tiles")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// The selected subcommand.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve tiles over HTTP
    Serve(ServeConfig),

    /// Validate a pyramid configuration file and print its levels
    Check(CheckConfig),
}

// =============================================================================
// Serve Command
// =============================================================================

/// Options of the `serve` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Pyramid Configuration
    // =========================================================================
    /// Pyramid configuration file.
    #[arg(short, long, env = "FRACTAL_CONFIG")]
    pub config: PathBuf,

    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "FRACTAL_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "FRACTAL_PORT")]
    pub port: u16,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "FRACTAL_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "FRACTAL_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Request Gating
    // =========================================================================
    /// Regular expression a tile request path must match (repeatable).
    ///
    /// When given, requests matching none of the patterns get 404.
    #[arg(long = "regexp", env = "FRACTAL_REGEXP")]
    pub regexps: Vec<String>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false, env = "FRACTAL_VERBOSE")]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false, env = "FRACTAL_NO_TRACING")]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.config.as_os_str().is_empty() {
            return Err(
                "Pyramid configuration file is required. Set --config or FRACTAL_CONFIG"
                    .to_string(),
            );
        }

        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }

        if let Some(origins) = &self.cors_origins {
            if let Some(origin) = origins.iter().find(|o| o.trim().is_empty()) {
                return Err(format!("Invalid CORS origin: {:?}", origin));
            }
        }

        self.request_gate()?;

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Compile the configured gating patterns.
    pub fn request_gate(&self) -> Result<RequestGate, String> {
        RequestGate::from_strings(&self.regexps)
            .map_err(|e| format!("Invalid --regexp pattern: {}", e))
    }
}

// =============================================================================
// Check Command
// =============================================================================

/// Options of the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Pyramid configuration file.
    #[arg(short, long, env = "FRACTAL_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
