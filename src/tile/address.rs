//! Tile address parsing and resolution.
//!
//! Clients address tiles in the *visible* pyramid, where level 0 is the
//! coarsest level that was not skipped. Resolution re-expresses an address
//! in the *full* pyramid and classifies it:
//!
//! ```text
//! ".../{z}/{level}/{row}/{column}[.ext]"
//!         │
//!         ▼  TileAddress::from_path
//!   TileAddress (visible numbering)
//!         │
//!         ▼  check_visible_bounds
//!         ▼  to_full_pyramid        level + skip_levels
//!         ▼  check_full_bounds
//!   ResolvedTile::InBounds(PyramidTile) | ResolvedTile::OutOfBounds
//! ```
//!
//! Out-of-bounds is an ordinary outcome, answered with the empty tile.

use tracing::debug;

use crate::error::AddressError;
use crate::pyramid::PyramidConfig;

// =============================================================================
// Addresses
// =============================================================================

/// A tile address as sent by a client, in visible-pyramid numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub column: u64,
    pub row: u64,
    pub level: u64,

    /// Extra-axis (z) coordinate; 0 when the pyramid has no extra axis
    pub extra: u64,
}

impl TileAddress {
    pub fn new(column: u64, row: u64, level: u64, extra: u64) -> Self {
        Self {
            column,
            row,
            level,
            extra,
        }
    }

    /// Parse the trailing tokens of a request path.
    ///
    /// Tokens are read right to left as column, row, level and, when
    /// `has_extra_axis` is set, the extra-axis coordinate. Earlier tokens are
    /// ignored. A file extension on the column token is dropped.
    pub fn parse(tokens: &[&str], has_extra_axis: bool) -> Result<Self, AddressError> {
        let required = if has_extra_axis { 4 } else { 3 };
        if tokens.len() < required {
            return Err(AddressError::TooFewTokens {
                required,
                actual: tokens.len(),
            });
        }

        let n = tokens.len();
        let column = parse_token("column", strip_extension(tokens[n - 1]))?;
        let row = parse_token("row", tokens[n - 2])?;
        let level = parse_token("level", tokens[n - 3])?;
        let extra = if has_extra_axis {
            parse_token("extra axis", tokens[n - 4])?
        } else {
            0
        };

        Ok(Self::new(column, row, level, extra))
    }

    /// Parse a `/`-separated request path.
    ///
    /// Empty segments (leading, trailing or doubled slashes) are skipped.
    pub fn from_path(path: &str, has_extra_axis: bool) -> Result<Self, AddressError> {
        let tokens: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        Self::parse(&tokens, has_extra_axis)
    }
}

/// A tile of the full pyramid, safe to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PyramidTile {
    pub column: u64,
    pub row: u64,

    /// Level in full-pyramid numbering (skipped levels included)
    pub level: usize,

    pub extra: u64,
}

impl PyramidTile {
    pub fn new(column: u64, row: u64, level: usize, extra: u64) -> Self {
        Self {
            column,
            row,
            level,
            extra,
        }
    }
}

/// Classification of a parsed address against a pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTile {
    /// Both bounds checks passed
    InBounds(PyramidTile),

    /// The address lies outside the pyramid
    OutOfBounds,
}

impl ResolvedTile {
    pub fn is_in_bounds(&self) -> bool {
        matches!(self, ResolvedTile::InBounds(_))
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve a visible-pyramid address against `pyramid`.
pub fn resolve(address: &TileAddress, pyramid: &PyramidConfig) -> ResolvedTile {
    if !check_visible_bounds(address, pyramid) {
        debug!(
            level = address.level,
            row = address.row,
            column = address.column,
            "Tile address outside visible pyramid"
        );
        return ResolvedTile::OutOfBounds;
    }

    let Some(tile) = to_full_pyramid(address, pyramid) else {
        return ResolvedTile::OutOfBounds;
    };

    if !check_full_bounds(&tile, pyramid) {
        debug!(
            level = tile.level,
            row = tile.row,
            column = tile.column,
            "Tile address outside full pyramid"
        );
        return ResolvedTile::OutOfBounds;
    }

    debug!(
        level = tile.level,
        row = tile.row,
        column = tile.column,
        extra = tile.extra,
        "Resolved tile"
    );
    ResolvedTile::InBounds(tile)
}

/// Parse request path tokens and resolve them in one step.
pub fn resolve_tokens(
    tokens: &[&str],
    pyramid: &PyramidConfig,
) -> Result<ResolvedTile, AddressError> {
    let address = TileAddress::parse(tokens, pyramid.has_extra_axis())?;
    Ok(resolve(&address, pyramid))
}

/// First bounds check, in visible numbering.
///
/// The level must be visible, and column and row must fall inside the grid
/// of the full level it stands for.
pub fn check_visible_bounds(address: &TileAddress, pyramid: &PyramidConfig) -> bool {
    let Ok(level) = usize::try_from(address.level) else {
        return false;
    };
    if level >= pyramid.visible_level_count() {
        return false;
    }

    match pyramid.level(level + pyramid.skip_levels()) {
        Some(set) => address.column < set.tiles_x && address.row < set.tiles_y,
        None => false,
    }
}

/// Second bounds check, against the full pyramid.
pub fn check_full_bounds(tile: &PyramidTile, pyramid: &PyramidConfig) -> bool {
    match pyramid.level(tile.level) {
        Some(set) => tile.column < set.tiles_x && tile.row < set.tiles_y,
        None => false,
    }
}

/// Translate a visible address to full-pyramid numbering.
fn to_full_pyramid(address: &TileAddress, pyramid: &PyramidConfig) -> Option<PyramidTile> {
    let level = usize::try_from(address.level)
        .ok()?
        .checked_add(pyramid.skip_levels())?;

    Some(PyramidTile::new(
        address.column,
        address.row,
        level,
        address.extra,
    ))
}

fn strip_extension(token: &str) -> &str {
    token
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(token)
}

fn parse_token(component: &'static str, token: &str) -> Result<u64, AddressError> {
    token.parse().map_err(|_| AddressError::InvalidToken {
        component,
        token: token.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
