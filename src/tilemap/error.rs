//! Error taxonomy for the tile/strip random-access engine.
//!
//! Mirrors the shape of [`crate::error::TiffError`]: a flat `enum` with a
//! `Display` impl and no panics on the library's public paths. Variants
//! carry the offending [`TileIndex`](crate::tilemap::index::TileIndex) where
//! one is known, so callers can report which tile failed without threading
//! extra context through every call site.

use std::fmt;
use std::io;

use crate::tilemap::index::TileIndex;

/// Failure of a tile-engine operation.
#[derive(Debug)]
#[non_exhaustive]
pub enum TileError {
    /// The backing file or buffer does not hold well-formed TIFF structure
    /// at the point the engine inspected it (bad tag, inconsistent array
    /// length, corrupt header).
    Format(String),

    /// A requested coordinate, tile, or byte range falls outside the image
    /// or the file.
    OutOfBounds { detail: String, tile: Option<TileIndex> },

    /// The requested operation cannot be satisfied given the image's
    /// current configuration (e.g. writing to a read-only map, a codec
    /// that cannot represent the requested sample layout).
    Incompatible(String),

    /// A tile or map was asked to perform an operation invalid for its
    /// current lifecycle state (e.g. reading a disposed tile).
    InvalidState { detail: String, tile: Option<TileIndex> },

    /// A size (tile byte count, requested buffer, array length) exceeds a
    /// hard limit the engine enforces to avoid unbounded allocation.
    TooLarge { detail: String, requested: u64, limit: u64 },

    /// Propagated I/O failure from the underlying stream.
    Io(io::Error),
}

impl TileError {
    pub fn format(detail: impl Into<String>) -> Self {
        TileError::Format(detail.into())
    }

    pub fn out_of_bounds(detail: impl Into<String>, tile: Option<TileIndex>) -> Self {
        TileError::OutOfBounds {
            detail: detail.into(),
            tile,
        }
    }

    pub fn incompatible(detail: impl Into<String>) -> Self {
        TileError::Incompatible(detail.into())
    }

    pub fn invalid_state(detail: impl Into<String>, tile: Option<TileIndex>) -> Self {
        TileError::InvalidState {
            detail: detail.into(),
            tile,
        }
    }

    pub fn too_large(detail: impl Into<String>, requested: u64, limit: u64) -> Self {
        TileError::TooLarge {
            detail: detail.into(),
            requested,
            limit,
        }
    }

    /// The [`TileIndex`] this error is about, if any.
    pub fn tile(&self) -> Option<&TileIndex> {
        match self {
            TileError::OutOfBounds { tile, .. } | TileError::InvalidState { tile, .. } => {
                tile.as_ref()
            }
            _ => None,
        }
    }
}

impl fmt::Display for TileError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileError::Format(detail) => write!(fmt, "malformed tile data: {}", detail),
            TileError::OutOfBounds { detail, tile } => {
                write!(fmt, "out of bounds: {}", detail)?;
                if let Some(tile) = tile {
                    write!(fmt, " ({})", tile)?;
                }
                Ok(())
            }
            TileError::Incompatible(detail) => write!(fmt, "incompatible operation: {}", detail),
            TileError::InvalidState { detail, tile } => {
                write!(fmt, "invalid tile state: {}", detail)?;
                if let Some(tile) = tile {
                    write!(fmt, " ({})", tile)?;
                }
                Ok(())
            }
            TileError::TooLarge {
                detail,
                requested,
                limit,
            } => write!(
                fmt,
                "{}: requested {} exceeds limit {}",
                detail, requested, limit
            ),
            TileError::Io(e) => write!(fmt, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TileError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TileError {
    fn from(err: io::Error) -> Self {
        TileError::Io(err)
    }
}

/// Result type used throughout the tile engine.
pub type TileResult<T> = Result<T, TileError>;
