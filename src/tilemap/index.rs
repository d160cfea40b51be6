//! [`TileIndex`] identifies a single tile or strip within a particular IFD's
//! chunk grid.
//!
//! An IFD is identified by [`IfdId`], a monotonically increasing counter
//! handed out when a [`Map`](crate::tilemap::map::Map) is constructed. The
//! origin Java engine this crate's behavior is modeled after used
//! `System.identityHashCode` on the in-memory IFD object for the same
//! purpose (distinguishing two IFDs with identical tag content but distinct
//! identity, e.g. the same image cloned into two different files); a
//! monotonic counter gives the same "distinct unless literally the same
//! object" semantics without relying on object addresses.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity of a particular in-memory IFD.
///
/// Two `IfdId`s are equal only if they were handed out for the same IFD
/// instance; content equality of the underlying tags is irrelevant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IfdId(u64);

static NEXT_IFD_ID: AtomicU64 = AtomicU64::new(1);

impl IfdId {
    /// Allocates a fresh, never-before-returned id.
    pub fn fresh() -> Self {
        IfdId(NEXT_IFD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for IfdId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ifd#{}", self.0)
    }
}

/// Coordinates of one tile (or strip, treated as a tile one row-of-tiles
/// tall) in a `Map`'s chunk grid.
///
/// `plane` distinguishes samples under `PlanarConfiguration::Separate`
/// (one plane per sample); it is always `0` for chunky-interleaved images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub ifd: IfdId,
    pub plane: u16,
    pub grid_x: u32,
    pub grid_y: u32,
}

impl TileIndex {
    pub fn new(ifd: IfdId, plane: u16, grid_x: u32, grid_y: u32) -> Self {
        TileIndex {
            ifd,
            plane,
            grid_x,
            grid_y,
        }
    }

    /// Linear chunk index in the strip/tile-offsets array order TIFF uses:
    /// rows of tiles, left to right, top to bottom, with planes concatenated
    /// for `PlanarConfiguration::Separate` images.
    pub fn linear_index(&self, tiles_across: u32, tiles_down: u32) -> u64 {
        let per_plane = u64::from(tiles_across) * u64::from(tiles_down);
        u64::from(self.plane) * per_plane
            + u64::from(self.grid_y) * u64::from(tiles_across)
            + u64::from(self.grid_x)
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "tile({}, plane={}, x={}, y={})",
            self.ifd, self.plane, self.grid_x, self.grid_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        let a = IfdId::fresh();
        let b = IfdId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn linear_index_orders_row_major() {
        let ifd = IfdId::fresh();
        let a = TileIndex::new(ifd, 0, 1, 0);
        let b = TileIndex::new(ifd, 0, 0, 1);
        // 3 tiles across: (1,0) comes before (0,1)
        assert!(a.linear_index(3, 2) < b.linear_index(3, 2));
    }

    #[test]
    fn linear_index_separates_planes() {
        let ifd = IfdId::fresh();
        let plane0 = TileIndex::new(ifd, 0, 0, 0);
        let plane1 = TileIndex::new(ifd, 1, 0, 0);
        assert_eq!(plane0.linear_index(2, 2), 0);
        assert_eq!(plane1.linear_index(2, 2), 4);
    }
}
