//! [`WriteMap`]: the write path. Injects sample values into in-memory tile
//! buffers, preloading a tile's existing on-disk content first when a
//! partial write would otherwise clobber untouched samples, then flushes
//! every dirty tile to the backing stream and brings the `IFD` up to date.

use std::collections::HashMap;

use crate::tilemap::codec::Codec;
use crate::tilemap::error::{TileError, TileResult};
use crate::tilemap::ifd::IfdUpdate;
use crate::tilemap::index::TileIndex;
use crate::tilemap::map::Map;
use crate::tilemap::sample_type::SampleType;
use crate::tilemap::stream::SeekableStream;
use crate::tilemap::tile::Tile;
use crate::tilemap::tile_io::TileIO;
use crate::tilemap::tiling::TilingMode;
use crate::tilemap::unusual_precisions::{narrow_from_f64, narrow_from_i64, scale_unsigned};

/// Drives writes through a [`Map`]'s chunk grid, keeping dirty tiles
/// resident until [`WriteMap::complete_writing`] flushes them.
pub struct WriteMap<'a, S, I, C> {
    map: Map,
    stream: &'a mut S,
    ifd: &'a mut I,
    codec: C,
    tiles: HashMap<TileIndex, Tile>,
}

impl<'a, S: SeekableStream, I: IfdUpdate, C: Codec> WriteMap<'a, S, I, C> {
    pub fn new(map: Map, stream: &'a mut S, ifd: &'a mut I, codec: C) -> Self {
        WriteMap {
            map,
            stream,
            ifd,
            codec,
            tiles: HashMap::new(),
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

    fn linear_index(&self, index: TileIndex) -> u64 {
        index.linear_index(self.map.tiles_across(), self.map.tiles_down())
    }

    /// Ensures `index` is resident in the in-memory tile table, reading and
    /// decoding its existing on-disk bytes first if it has any — so a write
    /// that only touches part of a tile does not discard the rest of it.
    /// This is the engine's `preload_and_store` operation.
    pub fn preload_and_store(&mut self, index: TileIndex) -> TileResult<()> {
        if self.tiles.contains_key(&index) {
            return Ok(());
        }
        let (width, height) = self.chunk_geometry(index);
        let row_stride = self.map.row_stride();
        let linear = self.linear_index(index);
        let tile = match self.ifd.chunk_location(index.plane, linear) {
            Some(location) => {
                let mut io = TileIO::new(self.stream, false);
                let compressed = io.read_chunk(location)?;
                let expected_len = row_stride * height as usize;
                let decoded = self.codec.decode(&compressed, expected_len)?;
                let mut tile = Tile::empty(index, width, height, row_stride);
                tile.store_decoded(decoded)?;
                tile
            }
            None => Tile::empty(index, width, height, row_stride),
        };
        self.tiles.insert(index, tile);
        Ok(())
    }

    fn local_coords(&self, x: u32, y: u32) -> (u32, u32) {
        let tiling = self.map.tiling();
        let chunk_width = tiling.chunk_width(self.map.image_width());
        let chunk_height = match tiling {
            TilingMode::Tiled { tile_length, .. } => tile_length,
            TilingMode::Stripped { rows_per_strip } => rows_per_strip,
        };
        (x % chunk_width, y % chunk_height)
    }

    /// Writes the raw bits of one sample, preloading its tile first.
    pub fn update_sample_bits(
        &mut self,
        x: u32,
        y: u32,
        sample_index: u16,
        raw: u64,
    ) -> TileResult<()> {
        let index = self.map.locate(x, y, sample_index)?;
        self.preload_and_store(index)?;
        let (local_x, local_y) = self.local_coords(x, y);
        let byte_filler = self.map.options().byte_filler;
        let row_stride = self.map.row_stride();
        let tile = self
            .tiles
            .get_mut(&index)
            .expect("just preloaded above");
        let data = tile.data_mut_for_write(byte_filler);
        self.map
            .inject_sample_bits(data, row_stride, local_x, local_y, sample_index, raw);
        tile.mark_rows_written(local_y, 1);
        Ok(())
    }

    /// Writes one integer sample, narrowing to the image's sample type and
    /// optionally rescaling proportionally
    /// (`Options::auto_scale_when_increasing_bit_depth`) if `source_bits`
    /// is narrower than the stored type.
    pub fn update_sample_i64(
        &mut self,
        x: u32,
        y: u32,
        sample_index: u16,
        value: i64,
        source_bits: u8,
    ) -> TileResult<()> {
        let sample_type = self.map.sample_type();
        if matches!(sample_type, SampleType::Float { .. }) {
            return Err(TileError::incompatible(
                "update_sample_i64 called on a floating-point image",
            ));
        }
        let target_bits = sample_type.bits();
        let raw_value = if self.map.options().auto_scale_when_increasing_bit_depth
            && source_bits < target_bits
            && value >= 0
        {
            scale_unsigned(value as u64, source_bits, target_bits) as i64
        } else {
            value
        };
        let raw = narrow_from_i64(raw_value, sample_type);
        self.update_sample_bits(x, y, sample_index, raw)
    }

    /// Writes one floating-point sample.
    pub fn update_sample_f64(
        &mut self,
        x: u32,
        y: u32,
        sample_index: u16,
        value: f64,
    ) -> TileResult<()> {
        let sample_type = self.map.sample_type();
        if !matches!(sample_type, SampleType::Float { .. }) {
            return Err(TileError::incompatible(
                "update_sample_f64 called on an integer image",
            ));
        }
        let raw = narrow_from_f64(value, sample_type);
        self.update_sample_bits(x, y, sample_index, raw)
    }

    /// Compresses and flushes every dirty tile to the backing stream,
    /// updating the `IFD`'s chunk-location table as each one lands, and
    /// frees the in-memory tile table. Clean (never-written) tiles are left
    /// untouched on disk.
    pub fn complete_writing(&mut self) -> TileResult<()> {
        let mut indices: Vec<TileIndex> = self.tiles.keys().copied().collect();
        // Deterministic order makes repeated runs byte-for-byte
        // reproducible, which the idempotent-overwrite property relies on.
        indices.sort_by_key(|i| (i.plane, i.grid_y, i.grid_x));
        for index in indices {
            let tile = self.tiles.get_mut(&index).expect("index came from keys()");
            if !tile.is_dirty() {
                continue;
            }
            let data = tile
                .data()
                .ok_or_else(|| {
                    TileError::invalid_state("dirty tile has no data to flush", Some(index))
                })?
                .to_vec();
            let encoded = self.codec.encode(&data)?;
            let linear = self.linear_index(index);
            let mut io = TileIO::with_size_limit(
                self.stream,
                self.map.options().always_write_to_file_end,
                self.map.options().require_32_bit_file,
                self.ifd.is_big(),
            );
            let location = match self.ifd.chunk_location(index.plane, linear) {
                Some(existing) => io.rewrite_chunk(existing, &encoded)?,
                None => io.write_new_chunk(&encoded)?,
            };
            self.ifd.set_chunk_location(index.plane, linear, location);
            tile.clear_after_flush();
        }
        Ok(())
    }

}

impl<'a, S: SeekableStream, I: crate::tilemap::ifd::IfdSerialize, C: Codec> WriteMap<'a, S, I, C> {
    /// Serializes the current state of the `IFD` (including chunk locations
    /// updated by `complete_writing`) and appends it to the stream,
    /// returning the offset it was written at — the engine's `update_ifd`
    /// operation for rewriting an existing file's directory after edits.
    pub fn update_ifd(&mut self) -> TileResult<u64> {
        let bytes = self.ifd.serialize_bytes()?;
        self.stream.append(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{CompressionMethod, PhotometricInterpretation, PlanarConfiguration};
    use crate::tilemap::byte_order::ByteOrder;
    use crate::tilemap::codec::Uncompressed;
    use crate::tilemap::ifd::{GenericIfd, IfdKind, IfdView};
    use crate::tilemap::index::IfdId;
    use crate::tilemap::map::Options;
    use crate::tilemap::tiling::TilingMode;
    use std::io::Cursor;

    fn fresh_ifd() -> GenericIfd {
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
    fn writing_one_sample_preserves_the_rest_of_the_tile() {
        let mut ifd = fresh_ifd();
        let mut stream = Cursor::new(Vec::new());
        let ifd_id = IfdId::fresh();
        let map = Map::new(
            ifd_id,
            4,
            4,
            ifd.tiling(),
            1,
            ifd.sample_type(),
            PlanarConfiguration::Chunky,
            Options::default().with_byte_filler(9),
        )
        .unwrap();
        {
            let mut write_map = WriteMap::new(map.clone(), &mut stream, &mut ifd, Uncompressed);
            write_map.update_sample_i64(0, 0, 0, 42, 8).unwrap();
            write_map.complete_writing().unwrap();
        }

        let supplier = crate::tilemap::read_map::StreamTileSupplier::new(
            &mut stream, &ifd, Uncompressed, 9,
        );
        let mut read_map = crate::tilemap::read_map::ReadMap::new(map, supplier, 4);
        assert_eq!(read_map.read_sample_raw(0, 0, 0).unwrap(), 42);
        // untouched samples in the same tile keep the filler value.
        assert_eq!(read_map.read_sample_raw(1, 0, 0).unwrap(), 9);
        assert_eq!(read_map.read_sample_raw(0, 1, 0).unwrap(), 9);
    }

    #[test]
    fn overwriting_twice_with_same_value_is_idempotent() {
        let mut ifd = fresh_ifd();
        let mut stream = Cursor::new(Vec::new());
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

        {
            let mut write_map = WriteMap::new(map.clone(), &mut stream, &mut ifd, Uncompressed);
            write_map.update_sample_i64(0, 0, 0, 7, 8).unwrap();
            write_map.complete_writing().unwrap();
        }
        let first_len = stream.get_ref().len();

        {
            let mut write_map = WriteMap::new(map, &mut stream, &mut ifd, Uncompressed);
            write_map.update_sample_i64(0, 0, 0, 7, 8).unwrap();
            write_map.complete_writing().unwrap();
        }
        assert_eq!(stream.get_ref().len(), first_len);
    }

    /// Reports a caller-chosen length without actually holding that many
    /// bytes, so the size-limit test below doesn't allocate a ~4 GiB buffer.
    struct FakeLenStream {
        fake_len: u64,
    }

    impl SeekableStream for FakeLenStream {
        fn read_at(&mut self, _offset: u64, _buf: &mut [u8]) -> TileResult<()> {
            Ok(())
        }

        fn write_at(&mut self, _offset: u64, _buf: &[u8]) -> TileResult<()> {
            Ok(())
        }

        fn len(&mut self) -> TileResult<u64> {
            Ok(self.fake_len)
        }

        fn append(&mut self, buf: &[u8]) -> TileResult<u64> {
            let offset = self.fake_len;
            self.fake_len += buf.len() as u64;
            Ok(offset)
        }
    }

    #[test]
    fn complete_writing_enforces_require_32_bit_file_on_classic_tiff() {
        let mut ifd = fresh_ifd();
        let mut stream = FakeLenStream {
            fake_len: 0xFFFF_FFF0,
        };
        let ifd_id = IfdId::fresh();
        let map = Map::new(
            ifd_id,
            4,
            4,
            ifd.tiling(),
            1,
            ifd.sample_type(),
            PlanarConfiguration::Chunky,
            Options::default().with_require_32_bit_file(true),
        )
        .unwrap();
        let mut write_map = WriteMap::new(map, &mut stream, &mut ifd, Uncompressed);
        write_map.update_sample_i64(0, 0, 0, 1, 8).unwrap();
        let err = write_map.complete_writing().unwrap_err();
        assert!(matches!(err, TileError::TooLarge { .. }));
    }

    #[test]
    fn complete_writing_ignores_require_32_bit_file_on_bigtiff() {
        let mut ifd = GenericIfd::new(
            IfdKind::Big,
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
        );
        let mut stream = FakeLenStream {
            fake_len: 0xFFFF_FFF0,
        };
        let ifd_id = IfdId::fresh();
        let map = Map::new(
            ifd_id,
            4,
            4,
            ifd.tiling(),
            1,
            ifd.sample_type(),
            PlanarConfiguration::Chunky,
            Options::default().with_require_32_bit_file(true),
        )
        .unwrap();
        let mut write_map = WriteMap::new(map, &mut stream, &mut ifd, Uncompressed);
        write_map.update_sample_i64(0, 0, 0, 1, 8).unwrap();
        assert!(write_map.complete_writing().is_ok());
    }
}
