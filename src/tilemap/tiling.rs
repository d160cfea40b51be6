//! Chunk geometry: how an image's pixel grid is carved into tiles or
//! strips, and the arithmetic for mapping pixel coordinates to a chunk and
//! an offset within it.

use crate::tilemap::error::{TileError, TileResult};

/// How an image is divided into independently encoded chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TilingMode {
    /// Rectangular tiles, `TileWidth` x `TileLength`. Both dimensions are
    /// required by the TIFF spec to be multiples of 16, but this engine
    /// does not itself enforce that (an out-of-scope IFD validation
    /// concern); it only requires them to be non-zero.
    Tiled { tile_width: u32, tile_length: u32 },
    /// Strips: each chunk is the full image width and `rows_per_strip`
    /// rows tall, except possibly the last strip which may be shorter.
    Stripped { rows_per_strip: u32 },
}

impl TilingMode {
    pub fn chunk_width(self, image_width: u32) -> u32 {
        match self {
            TilingMode::Tiled { tile_width, .. } => tile_width,
            TilingMode::Stripped { .. } => image_width,
        }
    }

    pub fn chunk_length(self, image_height: u32) -> u32 {
        match self {
            TilingMode::Tiled { tile_length, .. } => tile_length,
            TilingMode::Stripped { rows_per_strip } => rows_per_strip.min(image_height.max(1)),
        }
    }

    pub fn tiles_across(self, image_width: u32) -> u32 {
        let w = self.chunk_width(image_width).max(1);
        (image_width + w - 1) / w
    }

    pub fn tiles_down(self, image_height: u32) -> u32 {
        match self {
            TilingMode::Tiled { tile_length, .. } => {
                let h = tile_length.max(1);
                (image_height + h - 1) / h
            }
            TilingMode::Stripped { rows_per_strip } => {
                let h = rows_per_strip.max(1);
                (image_height + h - 1) / h
            }
        }
    }

    /// Pixel-space rectangle `(x0, y0, width, height)` of the chunk at grid
    /// position `(grid_x, grid_y)`, cropped to the image boundary if `crop`
    /// is true ([`Options::crop_tiles_to_image_boundaries`](crate::tilemap::Options));
    /// otherwise the full, possibly-overhanging chunk rectangle is
    /// returned.
    pub fn chunk_rect(
        self,
        image_width: u32,
        image_height: u32,
        grid_x: u32,
        grid_y: u32,
        crop: bool,
    ) -> TileResult<(u32, u32, u32, u32)> {
        if grid_x >= self.tiles_across(image_width) || grid_y >= self.tiles_down(image_height) {
            return Err(TileError::out_of_bounds(
                format!(
                    "grid position ({}, {}) outside {}x{} chunk grid",
                    grid_x,
                    grid_y,
                    self.tiles_across(image_width),
                    self.tiles_down(image_height)
                ),
                None,
            ));
        }
        let cw = self.chunk_width(image_width);
        let cl = match self {
            TilingMode::Tiled { tile_length, .. } => tile_length,
            TilingMode::Stripped { rows_per_strip } => rows_per_strip,
        };
        let x0 = grid_x * cw;
        let y0 = grid_y * cl;
        let (mut w, mut h) = (cw, cl);
        if crop {
            w = w.min(image_width.saturating_sub(x0));
            h = h.min(image_height.saturating_sub(y0));
        }
        Ok((x0, y0, w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_counts_round_up() {
        let tiling = TilingMode::Tiled {
            tile_width: 16,
            tile_length: 16,
        };
        assert_eq!(tiling.tiles_across(33), 3);
        assert_eq!(tiling.tiles_down(32), 2);
    }

    #[test]
    fn strip_count_matches_rows_per_strip() {
        let tiling = TilingMode::Stripped { rows_per_strip: 8 };
        assert_eq!(tiling.tiles_down(20), 3);
        assert_eq!(tiling.tiles_across(100), 1);
    }

    #[test]
    fn cropped_last_tile_is_shorter() {
        let tiling = TilingMode::Tiled {
            tile_width: 16,
            tile_length: 16,
        };
        let (x0, y0, w, h) = tiling.chunk_rect(33, 32, 2, 0, true).unwrap();
        assert_eq!((x0, y0, w, h), (32, 0, 1, 16));
    }

    #[test]
    fn uncropped_last_tile_overhangs() {
        let tiling = TilingMode::Tiled {
            tile_width: 16,
            tile_length: 16,
        };
        let (x0, y0, w, h) = tiling.chunk_rect(33, 32, 2, 0, false).unwrap();
        assert_eq!((x0, y0, w, h), (32, 0, 16, 16));
    }

    #[test]
    fn out_of_range_grid_position_errors() {
        let tiling = TilingMode::Tiled {
            tile_width: 16,
            tile_length: 16,
        };
        assert!(tiling.chunk_rect(33, 32, 5, 0, true).is_err());
    }
}
