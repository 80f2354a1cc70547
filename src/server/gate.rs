//! Regular-expression request gating.
//!
//! When patterns are configured, a tile request is served only if its path
//! matches at least one of them; other requests are answered with 404 as if
//! the route did not exist. With no patterns every request passes.
//!
//! # Example
//!
//! ```ignore
//! let gate = RequestGate::new(vec![Regex::new(r"^/tiles/mandelbrot/")?]);
//! assert!(gate.allows("/tiles/mandelbrot/0/0/0.png"));
//! assert!(!gate.allows("/tiles/julia/0/0/0.png"));
//! ```

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::handlers::ErrorResponse;

// =============================================================================
// Gate
// =============================================================================

/// Set of path patterns a request must match to be served.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    patterns: Arc<Vec<Regex>>,
}

impl RequestGate {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self {
            patterns: Arc::new(patterns),
        }
    }

    /// Compile patterns from strings.
    pub fn from_strings<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns))
    }

    /// Whether no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether `path` may be served.
    pub fn allows(&self, path: &str) -> bool {
        self.is_empty() || self.patterns.iter().any(|re| re.is_match(path))
    }
}

// =============================================================================
// Error
// =============================================================================

/// A request declined by the gate.
#[derive(Debug, Clone, Error)]
#[error("No route for {path}")]
pub struct GateError {
    pub path: String,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = StatusCode::NOT_FOUND;
        let message = self.to_string();

        debug!(
            error_type = "not_found",
            status = status.as_u16(),
            "Request declined by gate: {}",
            self.path
        );

        let error_response = ErrorResponse::with_status("not_found", message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Axum middleware that declines requests the gate does not allow.
///
/// The full request path is matched (via `OriginalUri`), so patterns see the
/// `/tiles/` prefix even when the router is nested.
pub async fn gate_middleware(
    State(gate): State<RequestGate>,
    OriginalUri(original_uri): OriginalUri,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let path = original_uri.path();
    if !gate.allows(path) {
        return Err(GateError {
            path: path.to_string(),
        });
    }

    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
