//! [`Map`]: the tile/strip grid and the bit-copy engine that reads and
//! writes individual samples within one chunk's decoded bytes.
//!
//! `Map` itself knows nothing about files or compression — it is pure
//! geometry and bit arithmetic, shared by both [`ReadMap`](crate::tilemap::read_map::ReadMap)
//! and [`WriteMap`](crate::tilemap::write_map::WriteMap). Given a pixel
//! coordinate and a sample index it can tell you which chunk holds that
//! sample and exactly which bits within that chunk's decoded row represent
//! it, using [`bitcopy`](crate::tilemap::bitcopy) so that bit widths which
//! don't divide evenly into a byte (1-bit bilevel images, the 17-24 bit
//! unusual precisions) work the same way whole-byte samples do.

use crate::tags::PlanarConfiguration;
use crate::tilemap::bitcopy::{read_bits_u64, write_bits_u64};
use crate::tilemap::error::{TileError, TileResult};
use crate::tilemap::index::{IfdId, TileIndex};
use crate::tilemap::sample_type::SampleType;
use crate::tilemap::tiling::TilingMode;

/// Configuration knobs a [`Map`] is constructed with.
#[derive(Clone, Debug)]
pub struct Options {
    /// Crop chunk rectangles at the right/bottom edge of the image instead
    /// of exposing the full, possibly-overhanging chunk.
    pub crop_tiles_to_image_boundaries: bool,
    /// Byte value used to fill a tile's never-written rows when reading.
    pub byte_filler: u8,
    /// Widen 17-24 bit ints and 16-24 bit floats to the next native width
    /// automatically on read.
    pub auto_unpack_unusual_precisions: bool,
    /// When widening sample bit depth on write, scale the value
    /// proportionally rather than left-justifying the bit pattern.
    pub auto_scale_when_increasing_bit_depth: bool,
    /// Reject opening non-BigTIFF files larger than 4 GiB instead of
    /// silently truncating offsets.
    pub require_32_bit_file: bool,
    /// Always append rewritten chunks at EOF, even when they would fit
    /// back in their previous location.
    pub always_write_to_file_end: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            crop_tiles_to_image_boundaries: true,
            byte_filler: 0,
            auto_unpack_unusual_precisions: true,
            auto_scale_when_increasing_bit_depth: false,
            require_32_bit_file: false,
            always_write_to_file_end: false,
        }
    }
}

impl Options {
    pub fn with_crop_tiles_to_image_boundaries(mut self, value: bool) -> Self {
        self.crop_tiles_to_image_boundaries = value;
        self
    }

    pub fn with_byte_filler(mut self, value: u8) -> Self {
        self.byte_filler = value;
        self
    }

    pub fn with_auto_unpack_unusual_precisions(mut self, value: bool) -> Self {
        self.auto_unpack_unusual_precisions = value;
        self
    }

    pub fn with_auto_scale_when_increasing_bit_depth(mut self, value: bool) -> Self {
        self.auto_scale_when_increasing_bit_depth = value;
        self
    }

    pub fn with_require_32_bit_file(mut self, value: bool) -> Self {
        self.require_32_bit_file = value;
        self
    }

    pub fn with_always_write_to_file_end(mut self, value: bool) -> Self {
        self.always_write_to_file_end = value;
        self
    }
}

/// The tile/strip grid for one image plane set, plus the bit-copy engine
/// for reading and writing individual samples.
#[derive(Clone, Debug)]
pub struct Map {
    ifd_id: IfdId,
    image_width: u32,
    image_height: u32,
    tiling: TilingMode,
    samples_per_pixel: u16,
    sample_type: SampleType,
    planar_configuration: PlanarConfiguration,
    options: Options,
}

impl Map {
    pub fn new(
        ifd_id: IfdId,
        image_width: u32,
        image_height: u32,
        tiling: TilingMode,
        samples_per_pixel: u16,
        sample_type: SampleType,
        planar_configuration: PlanarConfiguration,
        options: Options,
    ) -> TileResult<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(TileError::incompatible(
                "image dimensions must be non-zero",
            ));
        }
        if samples_per_pixel == 0 {
            return Err(TileError::incompatible("samples per pixel must be non-zero"));
        }
        Self::check_chunk_geometry_fits(
            tiling,
            image_width,
            samples_per_pixel,
            sample_type,
            planar_configuration,
        )?;
        Ok(Map {
            ifd_id,
            image_width,
            image_height,
            tiling,
            samples_per_pixel,
            sample_type,
            planar_configuration,
            options,
        })
    }

    /// Enforces `((chunkWidth+7)&~7) * chunkHeight * bitsPerPixel <= 2^31`
    /// (spec.md §3's `Tile`/`Map` invariant, and §4.2's `setSizes`): the
    /// geometry a single chunk's decoded buffer would need to hold must fit
    /// in an i32 bit count, or a row-stride/byte-length computation
    /// downstream (`row_stride`, `Tile::fillWhenEmpty`-equivalent
    /// allocation) could silently wrap or panic on overflow instead of
    /// failing cleanly at construction.
    fn check_chunk_geometry_fits(
        tiling: TilingMode,
        image_width: u32,
        samples_per_pixel: u16,
        sample_type: SampleType,
        planar_configuration: PlanarConfiguration,
    ) -> TileResult<()> {
        let chunk_width = tiling.chunk_width(image_width) as u64;
        let chunk_height = match tiling {
            TilingMode::Tiled { tile_length, .. } => tile_length,
            TilingMode::Stripped { rows_per_strip } => rows_per_strip,
        } as u64;
        let samples_per_pixel_in_plane = match planar_configuration {
            PlanarConfiguration::Chunky => samples_per_pixel,
            PlanarConfiguration::Planar => 1,
        } as u64;
        let bits_per_pixel = samples_per_pixel_in_plane * sample_type.bits() as u64;
        let byte_aligned_width = (chunk_width + 7) & !7u64;
        const MAX_CHUNK_BITS: u64 = 1u64 << 31;
        let total_bits = byte_aligned_width
            .checked_mul(chunk_height)
            .and_then(|v| v.checked_mul(bits_per_pixel));
        match total_bits {
            Some(bits) if bits <= MAX_CHUNK_BITS => Ok(()),
            Some(bits) => Err(TileError::too_large(
                "chunk_width * chunk_height * bits_per_pixel exceeds 2^31 bits",
                bits,
                MAX_CHUNK_BITS,
            )),
            None => Err(TileError::too_large(
                "chunk geometry overflows 64-bit bit-count arithmetic",
                u64::MAX,
                MAX_CHUNK_BITS,
            )),
        }
    }

    pub fn ifd_id(&self) -> IfdId {
        self.ifd_id
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn tiling(&self) -> TilingMode {
        self.tiling
    }

    pub fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn tiles_across(&self) -> u32 {
        self.tiling.tiles_across(self.image_width)
    }

    pub fn tiles_down(&self) -> u32 {
        self.tiling.tiles_down(self.image_height)
    }

    /// Number of sample planes a chunk grid has: 1 for chunky interleaving,
    /// `samples_per_pixel` for separate planar storage.
    pub fn plane_count(&self) -> u16 {
        match self.planar_configuration {
            PlanarConfiguration::Chunky => 1,
            PlanarConfiguration::Planar => self.samples_per_pixel,
        }
    }

    /// Samples stored per pixel within one chunk of the given plane: all of
    /// them for chunky storage, exactly one for planar storage.
    fn samples_per_pixel_in_plane(&self) -> u16 {
        match self.planar_configuration {
            PlanarConfiguration::Chunky => self.samples_per_pixel,
            PlanarConfiguration::Planar => 1,
        }
    }

    /// Which chunk (and which plane) holds the sample at image coordinate
    /// `(x, y)`, channel `sample_index`.
    pub fn locate(&self, x: u32, y: u32, sample_index: u16) -> TileResult<TileIndex> {
        if x >= self.image_width || y >= self.image_height {
            return Err(TileError::out_of_bounds(
                format!(
                    "pixel ({}, {}) outside {}x{} image",
                    x, y, self.image_width, self.image_height
                ),
                None,
            ));
        }
        if sample_index >= self.samples_per_pixel {
            return Err(TileError::out_of_bounds(
                format!(
                    "sample index {} outside {} samples per pixel",
                    sample_index, self.samples_per_pixel
                ),
                None,
            ));
        }
        let chunk_width = self.tiling.chunk_width(self.image_width);
        let chunk_height = match self.tiling {
            TilingMode::Tiled { tile_length, .. } => tile_length,
            TilingMode::Stripped { rows_per_strip } => rows_per_strip,
        };
        let grid_x = x / chunk_width;
        let grid_y = y / chunk_height;
        let plane = match self.planar_configuration {
            PlanarConfiguration::Chunky => 0,
            PlanarConfiguration::Planar => sample_index,
        };
        Ok(TileIndex::new(self.ifd_id, plane, grid_x, grid_y))
    }

    /// Bytes per decoded row of a chunk, rounded up to a whole byte.
    pub fn row_stride(&self) -> usize {
        let chunk_width = self.tiling.chunk_width(self.image_width) as usize;
        let bits = chunk_width * self.samples_per_pixel_in_plane() as usize * self.sample_type.bits() as usize;
        (bits + 7) / 8
    }

    /// Full (uncropped) pixel dimensions of every chunk in the grid.
    pub fn chunk_dimensions(&self) -> (u32, u32) {
        (
            self.tiling.chunk_width(self.image_width),
            match self.tiling {
                TilingMode::Tiled { tile_length, .. } => tile_length,
                TilingMode::Stripped { rows_per_strip } => rows_per_strip,
            },
        )
    }

    /// Bit offset, from the start of a decoded row, of sample
    /// `sample_index` at local column `local_x` within a chunk.
    fn bit_offset_in_row(&self, local_x: u32, sample_index: u16) -> usize {
        let samples_per_pixel = self.samples_per_pixel_in_plane() as usize;
        let sample_in_pixel = match self.planar_configuration {
            PlanarConfiguration::Chunky => sample_index as usize,
            PlanarConfiguration::Planar => 0,
        };
        (local_x as usize * samples_per_pixel + sample_in_pixel) * self.sample_type.bits() as usize
    }

    /// Reads the raw (not yet sign/float-interpreted) bits of one sample
    /// from a chunk's decoded buffer, at local coordinates `(local_x,
    /// local_y)` within the chunk.
    pub fn extract_sample_bits(
        &self,
        chunk_data: &[u8],
        row_stride: usize,
        local_x: u32,
        local_y: u32,
        sample_index: u16,
    ) -> u64 {
        let row_start_bit = local_y as usize * row_stride * 8;
        let bit_offset = row_start_bit + self.bit_offset_in_row(local_x, sample_index);
        read_bits_u64(chunk_data, bit_offset, self.sample_type.bits() as usize)
    }

    /// Writes the raw bits of one sample into a chunk's decoded buffer, at
    /// local coordinates `(local_x, local_y)` within the chunk.
    pub fn inject_sample_bits(
        &self,
        chunk_data: &mut [u8],
        row_stride: usize,
        local_x: u32,
        local_y: u32,
        sample_index: u16,
        value: u64,
    ) {
        let row_start_bit = local_y as usize * row_stride * 8;
        let bit_offset = row_start_bit + self.bit_offset_in_row(local_x, sample_index);
        write_bits_u64(chunk_data, bit_offset, self.sample_type.bits() as usize, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::PlanarConfiguration;
    use crate::tilemap::index::IfdId;

    fn chunky_map(bits: u8) -> Map {
        Map::new(
            IfdId::fresh(),
            8,
            8,
            TilingMode::Tiled {
                tile_width: 4,
                tile_length: 4,
            },
            3,
            SampleType::UnsignedInt { bits },
            PlanarConfiguration::Chunky,
            Options::default(),
        )
        .unwrap()
    }

    #[test]
    fn locate_picks_correct_grid_cell() {
        let map = chunky_map(8);
        let idx = map.locate(5, 6, 1).unwrap();
        assert_eq!((idx.grid_x, idx.grid_y, idx.plane), (1, 1, 0));
    }

    #[test]
    fn out_of_bounds_pixel_errors() {
        let map = chunky_map(8);
        assert!(map.locate(100, 0, 0).is_err());
    }

    #[test]
    fn planar_layout_selects_plane_per_sample() {
        let map = Map::new(
            IfdId::fresh(),
            8,
            8,
            TilingMode::Tiled {
                tile_width: 4,
                tile_length: 4,
            },
            3,
            SampleType::UnsignedInt { bits: 8 },
            PlanarConfiguration::Planar,
            Options::default(),
        )
        .unwrap();
        let idx0 = map.locate(0, 0, 0).unwrap();
        let idx2 = map.locate(0, 0, 2).unwrap();
        assert_eq!(idx0.plane, 0);
        assert_eq!(idx2.plane, 2);
    }

    #[test]
    fn sample_round_trips_through_chunk_buffer_8bit() {
        let map = chunky_map(8);
        let row_stride = map.row_stride();
        let mut buf = vec![0u8; row_stride * 4];
        map.inject_sample_bits(&mut buf, row_stride, 2, 1, 1, 200);
        assert_eq!(map.extract_sample_bits(&buf, row_stride, 2, 1, 1), 200);
    }

    #[test]
    fn sample_round_trips_for_sub_byte_depth() {
        let map = Map::new(
            IfdId::fresh(),
            8,
            8,
            TilingMode::Tiled {
                tile_width: 8,
                tile_length: 8,
            },
            1,
            SampleType::UnsignedInt { bits: 1 },
            PlanarConfiguration::Chunky,
            Options::default(),
        )
        .unwrap();
        let row_stride = map.row_stride();
        let mut buf = vec![0u8; row_stride * 8];
        map.inject_sample_bits(&mut buf, row_stride, 3, 0, 0, 1);
        map.inject_sample_bits(&mut buf, row_stride, 4, 0, 0, 0);
        assert_eq!(map.extract_sample_bits(&buf, row_stride, 3, 0, 0), 1);
        assert_eq!(map.extract_sample_bits(&buf, row_stride, 4, 0, 0), 0);
        assert_eq!(map.extract_sample_bits(&buf, row_stride, 2, 0, 0), 0);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let result = Map::new(
            IfdId::fresh(),
            0,
            8,
            TilingMode::Tiled {
                tile_width: 4,
                tile_length: 4,
            },
            1,
            SampleType::UnsignedInt { bits: 8 },
            PlanarConfiguration::Chunky,
            Options::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn oversized_chunk_geometry_is_rejected() {
        // 65536 x 65536 x 32 bits/pixel is far past the 2^31-bit ceiling.
        let result = Map::new(
            IfdId::fresh(),
            65536,
            65536,
            TilingMode::Tiled {
                tile_width: 65536,
                tile_length: 65536,
            },
            1,
            SampleType::Float { bits: 32 },
            PlanarConfiguration::Chunky,
            Options::default(),
        );
        assert!(matches!(result, Err(TileError::TooLarge { .. })));
    }

    #[test]
    fn chunk_geometry_at_the_limit_is_accepted() {
        // 16384 x 16384 x 8 bits/pixel == 2^31 bits exactly.
        let result = Map::new(
            IfdId::fresh(),
            16384,
            16384,
            TilingMode::Tiled {
                tile_width: 16384,
                tile_length: 16384,
            },
            1,
            SampleType::UnsignedInt { bits: 8 },
            PlanarConfiguration::Chunky,
            Options::default(),
        );
        assert!(result.is_ok());
    }
}
