//! [`Tile`]: the in-memory handle for one chunk's pixel data, plus its
//! lifecycle state machine.
//!
//! A tile starts `Empty` (no pixel data loaded), becomes `Decoded` once its
//! compressed bytes have been read from the backing stream and decompressed,
//! or `Encoded` once freshly-written pixel data has been compressed and is
//! waiting to be flushed. Either populated state can be disposed back to
//! `Empty` to free memory (the engine's single-threaded, cooperative
//! concurrency model means this is always safe: no other reader can be
//! mid-access when a tile is disposed).

use crate::tilemap::error::{TileError, TileResult};
use crate::tilemap::index::TileIndex;
use crate::tilemap::unset_area::UnsetArea;

/// What a [`Tile`] currently holds.
#[derive(Clone, Debug)]
enum TileState {
    /// No pixel data in memory; must be (re)populated before sample access.
    Empty,
    /// Decompressed pixel data read from the backing stream, ready for
    /// sample extraction.
    Decoded(Vec<u8>),
    /// Decompressed pixel data written by the caller, not yet compressed
    /// and flushed to the backing stream.
    Encoded(Vec<u8>),
}

/// One chunk's (tile or strip) pixel data and bookkeeping.
///
/// Holds a non-owning [`TileIndex`] back-reference to its position within
/// the owning [`Map`](crate::tilemap::map::Map) rather than a pointer to the
/// map itself, so tiles never form an ownership cycle with their map.
#[derive(Clone, Debug)]
pub struct Tile {
    index: TileIndex,
    width: u32,
    height: u32,
    row_stride: usize,
    state: TileState,
    unset: UnsetArea,
    dirty: bool,
}

impl Tile {
    /// Creates a fresh, empty tile of the given pixel dimensions.
    ///
    /// `row_stride` is the number of bytes one row of this tile occupies
    /// once decoded (accounting for bits-per-sample and samples-per-pixel,
    /// rounded up to a whole byte for sub-byte sample packing).
    pub fn empty(index: TileIndex, width: u32, height: u32, row_stride: usize) -> Self {
        Tile {
            index,
            width,
            height,
            row_stride,
            state: TileState::Empty,
            unset: UnsetArea::new(height),
            dirty: false,
        }
    }

    pub fn index(&self) -> TileIndex {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, TileState::Empty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rows of this tile that have never been written (read as all `byteFiller`,
    /// per [`Options::byte_filler`](crate::tilemap::Options)).
    pub fn unset_area(&self) -> &UnsetArea {
        &self.unset
    }

    /// Populates the tile with decoded pixel bytes read from the backing
    /// stream. The whole tile is considered "set" afterward — a tile that
    /// came from the file has no unwritten rows by definition.
    pub fn store_decoded(&mut self, data: Vec<u8>) -> TileResult<()> {
        self.check_len(&data)?;
        self.unset.mark_rows(0, self.height);
        self.state = TileState::Decoded(data);
        self.dirty = false;
        Ok(())
    }

    /// Ensures the tile has a writable buffer, allocating one filled with
    /// `filler` if currently `Empty`, and returns it.
    pub fn data_mut_for_write(&mut self, filler: u8) -> &mut Vec<u8> {
        if matches!(self.state, TileState::Empty) {
            let size = self.row_stride * self.height as usize;
            self.state = TileState::Encoded(vec![filler; size]);
        }
        self.dirty = true;
        match &mut self.state {
            TileState::Decoded(data) | TileState::Encoded(data) => data,
            TileState::Empty => unreachable!("just populated above"),
        }
    }

    /// Read-only view of the tile's decoded bytes, if any are loaded.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.state {
            TileState::Decoded(data) | TileState::Encoded(data) => Some(data),
            TileState::Empty => None,
        }
    }

    /// Marks `[y0, y0 + count)` as written, for `WriteMap` to call after
    /// injecting sample bytes into one or more rows.
    pub fn mark_rows_written(&mut self, y0: u32, count: u32) {
        self.unset.mark_rows(y0, count);
    }

    /// Frees the tile's in-memory buffer, returning it to `Empty`.
    ///
    /// Errors if the tile is dirty (holds writes not yet flushed to the
    /// backing stream) — disposing those would silently discard data.
    pub fn dispose(&mut self) -> TileResult<()> {
        if self.dirty {
            return Err(TileError::invalid_state(
                "cannot dispose a tile with unflushed writes",
                Some(self.index),
            ));
        }
        self.state = TileState::Empty;
        Ok(())
    }

    /// Forcibly frees the tile's buffer regardless of dirty state, used
    /// once a dirty tile's bytes have actually been flushed.
    pub fn clear_after_flush(&mut self) {
        self.state = TileState::Empty;
        self.dirty = false;
    }

    fn check_len(&self, data: &[u8]) -> TileResult<()> {
        let expected = self.row_stride * self.height as usize;
        if data.len() != expected {
            return Err(TileError::format(format!(
                "decoded tile has {} bytes, expected {}",
                data.len(),
                expected
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::index::IfdId;

    fn idx() -> TileIndex {
        TileIndex::new(IfdId::fresh(), 0, 0, 0)
    }

    #[test]
    fn fresh_tile_is_empty() {
        let tile = Tile::empty(idx(), 4, 4, 4);
        assert!(tile.is_empty());
        assert!(tile.unset_area().is_fully_unset());
    }

    #[test]
    fn writing_allocates_and_marks_dirty() {
        let mut tile = Tile::empty(idx(), 4, 4, 4);
        let data = tile.data_mut_for_write(0xAA);
        assert_eq!(data.len(), 16);
        assert!(data.iter().all(|&b| b == 0xAA));
        assert!(tile.is_dirty());
    }

    #[test]
    fn dispose_rejects_dirty_tile() {
        let mut tile = Tile::empty(idx(), 2, 2, 2);
        tile.data_mut_for_write(0);
        assert!(tile.dispose().is_err());
        tile.clear_after_flush();
        assert!(tile.dispose().is_ok());
    }

    #[test]
    fn store_decoded_rejects_wrong_length() {
        let mut tile = Tile::empty(idx(), 2, 2, 2);
        assert!(tile.store_decoded(vec![0u8; 3]).is_err());
        assert!(tile.store_decoded(vec![0u8; 4]).is_ok());
    }
}
