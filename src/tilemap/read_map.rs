//! [`ReadMap`]: the read path. Resolves a pixel coordinate to a chunk via
//! [`Map`], obtains that chunk's decoded bytes from a [`TileSupplier`]
//! (reading and decompressing from the backing stream on a cache miss), and
//! extracts the requested sample.
//!
//! Two access patterns are both supported through the same cache: repeated
//! reads within one chunk hit the cache (`read_sample`), while a single
//! scan over the whole image can use `read_sample_uncached` to avoid
//! growing the cache unboundedly when every chunk is visited exactly once.

use std::collections::HashMap;

use crate::tilemap::codec::Codec;
use crate::tilemap::error::{TileError, TileResult};
use crate::tilemap::ifd::IfdView;
use crate::tilemap::index::TileIndex;
use crate::tilemap::map::Map;
use crate::tilemap::sample_type::SampleType;
use crate::tilemap::stream::SeekableStream;
use crate::tilemap::tile::Tile;
use crate::tilemap::tile_io::TileIO;
use crate::tilemap::unusual_precisions::{widen_to_f64, widen_to_i64};

/// Supplies decoded tile data for a [`TileIndex`] on demand.
///
/// The default implementation backing [`ReadMap`] reads the chunk's bytes
/// from the stream at the location its `IFD` records and runs them through
/// a `Codec`; a chunk with no recorded location (never written) supplies an
/// all-filler tile instead of erroring, matching a freshly-created image
/// that has gaps in its chunk grid.
pub trait TileSupplier {
    fn supply(&mut self, index: TileIndex, width: u32, height: u32, row_stride: usize)
        -> TileResult<Tile>;
}

/// [`TileSupplier`] backed by a live stream, IFD, and codec.
pub struct StreamTileSupplier<'a, S, I, C> {
    stream: &'a mut S,
    ifd: &'a I,
    codec: C,
    byte_filler: u8,
}

impl<'a, S: SeekableStream, I: IfdView, C: Codec> StreamTileSupplier<'a, S, I, C> {
    pub fn new(stream: &'a mut S, ifd: &'a I, codec: C, byte_filler: u8) -> Self {
        StreamTileSupplier {
            stream,
            ifd,
            codec,
            byte_filler,
        }
    }
}

impl<'a, S: SeekableStream, I: IfdView, C: Codec> TileSupplier for StreamTileSupplier<'a, S, I, C> {
    fn supply(
        &mut self,
        index: TileIndex,
        width: u32,
        height: u32,
        row_stride: usize,
    ) -> TileResult<Tile> {
        let tiling = self.ifd.tiling();
        let linear = index.linear_index(
            tiling.tiles_across(self.ifd.image_width()),
            tiling.tiles_down(self.ifd.image_height()),
        );
        let mut tile = Tile::empty(index, width, height, row_stride);
        match self.ifd.chunk_location(index.plane, linear) {
            Some(location) => {
                let mut io = TileIO::new(self.stream, false);
                let compressed = io.read_chunk(location)?;
                let expected_len = row_stride * height as usize;
                let decoded = self.codec.decode(&compressed, expected_len)?;
                tile.store_decoded(decoded)?;
            }
            None => {
                let filler = vec![self.byte_filler; row_stride * height as usize];
                tile.store_decoded(filler)?;
            }
        }
        Ok(tile)
    }
}

/// A small fixed-capacity tile cache, evicting the least-recently-used
/// entry once full.
struct TileCache {
    capacity: usize,
    entries: HashMap<TileIndex, Tile>,
    recency: Vec<TileIndex>,
}

impl TileCache {
    fn new(capacity: usize) -> Self {
        TileCache {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: Vec::new(),
        }
    }

    fn touch(&mut self, index: TileIndex) {
        self.recency.retain(|i| *i != index);
        self.recency.push(index);
    }

    fn insert(&mut self, index: TileIndex, tile: Tile) {
        if !self.entries.contains_key(&index) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.recency.first().copied() {
                self.entries.remove(&oldest);
                self.recency.remove(0);
            }
        }
        self.entries.insert(index, tile);
        self.touch(index);
    }

    fn get(&mut self, index: &TileIndex) -> Option<&Tile> {
        if self.entries.contains_key(index) {
            self.touch(*index);
        }
        self.entries.get(index)
    }
}

/// Reads samples from an image through its chunk grid, caching decoded
/// tiles across calls.
pub struct ReadMap<Supplier> {
    map: Map,
    supplier: Supplier,
    cache: TileCache,
}

impl<Supplier: TileSupplier> ReadMap<Supplier> {
    pub fn new(map: Map, supplier: Supplier, cache_capacity: usize) -> Self {
        ReadMap {
            map,
            supplier,
            cache: TileCache::new(cache_capacity),
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    fn chunk_geometry(&self, index: TileIndex) -> (u32, u32) {
        let (full_w, full_h) = self.map.chunk_dimensions();
        if self.map.options().crop_tiles_to_image_boundaries {
            let w = full_w.min(self.map.image_width().saturating_sub(index.grid_x * full_w));
            let h = full_h.min(self.map.image_height().saturating_sub(index.grid_y * full_h));
            (w.max(1), h.max(1))
        } else {
            (full_w, full_h)
        }
    }

    fn load(&mut self, index: TileIndex) -> TileResult<()> {
        if self.cache.get(&index).is_some() {
            return Ok(());
        }
        let (width, height) = self.chunk_geometry(index);
        let row_stride = self.map.row_stride();
        let tile = self.supplier.supply(index, width, height, row_stride)?;
        self.cache.insert(index, tile);
        Ok(())
    }

    /// Reads the raw bits of one sample, using (and populating) the tile
    /// cache.
    pub fn read_sample_raw(&mut self, x: u32, y: u32, sample_index: u16) -> TileResult<u64> {
        let index = self.map.locate(x, y, sample_index)?;
        self.load(index)?;
        let tiling = self.map.tiling();
        let chunk_width = tiling.chunk_width(self.map.image_width());
        let chunk_height = match tiling {
            crate::tilemap::tiling::TilingMode::Tiled { tile_length, .. } => tile_length,
            crate::tilemap::tiling::TilingMode::Stripped { rows_per_strip } => rows_per_strip,
        };
        let local_x = x % chunk_width;
        let local_y = y % chunk_height;
        let row_stride = self.map.row_stride();
        let tile = self
            .cache
            .get(&index)
            .ok_or_else(|| TileError::invalid_state("tile missing from cache after load", Some(index)))?;
        let data = tile
            .data()
            .ok_or_else(|| TileError::invalid_state("tile has no decoded data", Some(index)))?;
        Ok(self
            .map
            .extract_sample_bits(data, row_stride, local_x, local_y, sample_index))
    }

    /// Reads one sample and interprets it as a signed integer, widening per
    /// [`crate::tilemap::unusual_precisions`] if the sample type calls for
    /// it. Fails with *Incompatible* for an unusual-precision sample type
    /// when `Options::auto_unpack_unusual_precisions` is disabled, since
    /// this accessor has no other way to hand back such a value — callers
    /// that disable the option read [`Self::read_sample_raw`] instead and
    /// interpret the packed bits themselves.
    pub fn read_sample_i64(&mut self, x: u32, y: u32, sample_index: u16) -> TileResult<i64> {
        let sample_type = self.map.sample_type();
        if sample_type.is_unusual_precision() && !self.map.options().auto_unpack_unusual_precisions
        {
            return Err(TileError::incompatible(
                "sample type needs unusual-precision widening, which auto_unpack_unusual_precisions disables; use read_sample_raw",
            ));
        }
        let raw = self.read_sample_raw(x, y, sample_index)?;
        match sample_type {
            SampleType::Float { .. } => Err(TileError::incompatible(
                "read_sample_i64 called on a floating-point image",
            )),
            sample_type => Ok(widen_to_i64(raw, sample_type)),
        }
    }

    /// Reads one sample and interprets it as a floating-point value. See
    /// [`Self::read_sample_i64`] for `auto_unpack_unusual_precisions`
    /// behavior.
    pub fn read_sample_f64(&mut self, x: u32, y: u32, sample_index: u16) -> TileResult<f64> {
        let sample_type = self.map.sample_type();
        if sample_type.is_unusual_precision() && !self.map.options().auto_unpack_unusual_precisions
        {
            return Err(TileError::incompatible(
                "sample type needs unusual-precision widening, which auto_unpack_unusual_precisions disables; use read_sample_raw",
            ));
        }
        let raw = self.read_sample_raw(x, y, sample_index)?;
        match sample_type {
            SampleType::Float { .. } => Ok(widen_to_f64(raw, sample_type)),
            _ => Err(TileError::incompatible(
                "read_sample_f64 called on an integer image",
            )),
        }
    }

    /// Reads one sample without retaining its tile in the cache afterward —
    /// the "uncached" path for a single full-image scan.
    pub fn read_sample_raw_uncached(
        &mut self,
        x: u32,
        y: u32,
        sample_index: u16,
    ) -> TileResult<u64> {
        let value = self.read_sample_raw(x, y, sample_index)?;
        let index = self.map.locate(x, y, sample_index)?;
        self.cache.entries.remove(&index);
        self.cache.recency.retain(|i| *i != index);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{CompressionMethod, PhotometricInterpretation, PlanarConfiguration};
    use crate::tilemap::byte_order::ByteOrder;
    use crate::tilemap::codec::Uncompressed;
    use crate::tilemap::ifd::{GenericIfd, IfdKind, IfdUpdate};
    use crate::tilemap::index::IfdId;
    use crate::tilemap::map::Options;
    use crate::tilemap::tiling::TilingMode;
    use std::io::Cursor;

    fn small_ifd() -> GenericIfd {
        GenericIfd::new(
            IfdKind::Classic,
            ByteOrder::LittleEndian,
            4,
            4,
            TilingMode::Tiled {
                tile_width: 2,
                tile_length: 2,
            },
            1,
            SampleType::UnsignedInt { bits: 8 },
            PlanarConfiguration::Chunky,
            PhotometricInterpretation::BlackIsZero,
            CompressionMethod::None,
        )
    }

    #[test]
    fn reads_filler_for_never_written_tiles() {
        let ifd = small_ifd();
        let ifd_id = IfdId::fresh();
        let map = Map::new(
            ifd_id,
            4,
            4,
            ifd.tiling(),
            1,
            ifd.sample_type(),
            PlanarConfiguration::Chunky,
            Options::default().with_byte_filler(0x7F),
        )
        .unwrap();
        let mut stream = Cursor::new(Vec::new());
        let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0x7F);
        let mut read_map = ReadMap::new(map, supplier, 4);
        assert_eq!(read_map.read_sample_raw(0, 0, 0).unwrap(), 0x7F);
    }

    #[test]
    fn reads_stored_tile_bytes() {
        let mut ifd = small_ifd();
        let mut stream = Cursor::new(Vec::new());
        let data = [1u8, 2, 3, 4]; // 2x2 tile
        {
            let mut io = TileIO::new(&mut stream, false);
            let loc = io.write_new_chunk(&data).unwrap();
            ifd.set_chunk_location(0, 0, loc);
        }
        let ifd_id = IfdId::fresh();
        let map = Map::new(
            ifd_id,
            4,
            4,
            ifd.tiling(),
            1,
            ifd.sample_type(),
            PlanarConfiguration::Chunky,
            Options::default(),
        )
        .unwrap();
        let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0);
        let mut read_map = ReadMap::new(map, supplier, 4);
        assert_eq!(read_map.read_sample_raw(0, 0, 0).unwrap(), 1);
        assert_eq!(read_map.read_sample_raw(1, 0, 0).unwrap(), 2);
        assert_eq!(read_map.read_sample_raw(0, 1, 0).unwrap(), 3);
        assert_eq!(read_map.read_sample_raw(1, 1, 0).unwrap(), 4);
    }

    #[test]
    fn typed_accessor_rejects_unusual_precision_when_auto_unpack_disabled() {
        let ifd = GenericIfd::new(
            IfdKind::Classic,
            ByteOrder::LittleEndian,
            4,
            4,
            TilingMode::Tiled {
                tile_width: 2,
                tile_length: 2,
            },
            1,
            SampleType::UnsignedInt { bits: 20 },
            PlanarConfiguration::Chunky,
            PhotometricInterpretation::BlackIsZero,
            CompressionMethod::None,
        );
        let ifd_id = IfdId::fresh();
        let map = Map::new(
            ifd_id,
            4,
            4,
            ifd.tiling(),
            1,
            ifd.sample_type(),
            PlanarConfiguration::Chunky,
            Options::default().with_auto_unpack_unusual_precisions(false),
        )
        .unwrap();
        let mut stream = Cursor::new(Vec::new());
        let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0);
        let mut read_map = ReadMap::new(map, supplier, 4);
        assert!(matches!(
            read_map.read_sample_i64(0, 0, 0),
            Err(TileError::Incompatible(_))
        ));
        // the raw accessor still works regardless of the option.
        assert!(read_map.read_sample_raw(0, 0, 0).is_ok());
    }

    #[test]
    fn typed_accessor_widens_unusual_precision_when_enabled() {
        let mut ifd = GenericIfd::new(
            IfdKind::Classic,
            ByteOrder::LittleEndian,
            2,
            2,
            TilingMode::Tiled {
                tile_width: 2,
                tile_length: 2,
            },
            1,
            SampleType::SignedInt { bits: 20 },
            PlanarConfiguration::Chunky,
            PhotometricInterpretation::BlackIsZero,
            CompressionMethod::None,
        );
        let mut stream = Cursor::new(Vec::new());
        {
            let mut write_map = crate::tilemap::write_map::WriteMap::new(
                Map::new(
                    IfdId::fresh(),
                    2,
                    2,
                    ifd.tiling(),
                    1,
                    ifd.sample_type(),
                    PlanarConfiguration::Chunky,
                    Options::default(),
                )
                .unwrap(),
                &mut stream,
                &mut ifd,
                Uncompressed,
            );
            write_map.update_sample_i64(0, 0, 0, -1, 20).unwrap();
            write_map.complete_writing().unwrap();
        }
        let map = Map::new(
            IfdId::fresh(),
            2,
            2,
            ifd.tiling(),
            1,
            ifd.sample_type(),
            PlanarConfiguration::Chunky,
            Options::default(),
        )
        .unwrap();
        let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0);
        let mut read_map = ReadMap::new(map, supplier, 4);
        assert_eq!(read_map.read_sample_i64(0, 0, 0).unwrap(), -1);
    }
}
