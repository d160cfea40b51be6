//! End-to-end scenarios for the tile/strip random-access engine, exercised
//! entirely against in-memory buffers (no fixture files, matching the rest
//! of this crate's dependence on `tests/images/*` assets this pack does not
//! carry).

use std::io::Cursor;

use tiff::tags::{CompressionMethod, PhotometricInterpretation, PlanarConfiguration};
use tiff::tilemap::byte_order::ByteOrder;
use tiff::tilemap::codec::{PackBitsCodec, Uncompressed};
use tiff::tilemap::ifd::{GenericIfd, IfdKind, IfdView};
use tiff::tilemap::index::IfdId;
use tiff::tilemap::map::{Map, Options};
use tiff::tilemap::read_map::{ReadMap, StreamTileSupplier};
use tiff::tilemap::sample_type::SampleType;
use tiff::tilemap::tiling::TilingMode;
use tiff::tilemap::write_map::WriteMap;

/// Small xorshift PRNG so scenario tests can exercise pseudo-random pixel
/// content deterministically, without depending on an external randomness
/// crate nothing else in this codebase uses.
struct XorShift(u32);

impl XorShift {
    fn new(seed: u32) -> Self {
        XorShift(seed.max(1))
    }

    fn next_u8(&mut self) -> u8 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x & 0xff) as u8
    }
}

fn single_tile_ifd(width: u32, height: u32, samples_per_pixel: u16) -> GenericIfd {
    GenericIfd::new(
        IfdKind::Classic,
        ByteOrder::LittleEndian,
        width,
        height,
        TilingMode::Tiled {
            tile_width: width,
            tile_length: height,
        },
        samples_per_pixel,
        SampleType::UnsignedInt { bits: 8 },
        PlanarConfiguration::Chunky,
        PhotometricInterpretation::RGB,
        CompressionMethod::None,
    )
}

// Single-tile RGB image: write every sample, read every sample back.
#[test]
fn single_tile_rgb_round_trip() {
    let mut ifd = single_tile_ifd(4, 4, 3);
    let mut stream = Cursor::new(Vec::new());
    let ifd_id = IfdId::fresh();
    let map = Map::new(
        ifd_id,
        4,
        4,
        ifd.tiling(),
        3,
        ifd.sample_type(),
        PlanarConfiguration::Chunky,
        Options::default(),
    )
    .unwrap();

    let mut rng = XorShift::new(12345);
    let mut expected = vec![[0u8; 3]; 16];
    {
        let mut write_map = WriteMap::new(map.clone(), &mut stream, &mut ifd, Uncompressed);
        for y in 0..4 {
            for x in 0..4 {
                let pixel = [rng.next_u8(), rng.next_u8(), rng.next_u8()];
                expected[(y * 4 + x) as usize] = pixel;
                for (s, &value) in pixel.iter().enumerate() {
                    write_map
                        .update_sample_i64(x, y, s as u16, value as i64, 8)
                        .unwrap();
                }
            }
        }
        write_map.complete_writing().unwrap();
    }

    let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0);
    let mut read_map = ReadMap::new(map, supplier, 4);
    for y in 0..4 {
        for x in 0..4 {
            let pixel = expected[(y * 4 + x) as usize];
            for (s, &value) in pixel.iter().enumerate() {
                let read = read_map.read_sample_i64(x, y, s as u16).unwrap();
                assert_eq!(read, value as i64);
            }
        }
    }
}

// A diagonal line crossing multiple tiles, verifying stitching at tile
// boundaries produces the same result as single-tile access.
#[test]
fn diagonal_line_crosses_tile_boundaries() {
    let mut ifd = GenericIfd::new(
        IfdKind::Classic,
        ByteOrder::LittleEndian,
        8,
        8,
        TilingMode::Tiled {
            tile_width: 4,
            tile_length: 4,
        },
        1,
        SampleType::UnsignedInt { bits: 8 },
        PlanarConfiguration::Chunky,
        PhotometricInterpretation::BlackIsZero,
        CompressionMethod::None,
    );
    let mut stream = Cursor::new(Vec::new());
    let ifd_id = IfdId::fresh();
    let map = Map::new(
        ifd_id,
        8,
        8,
        ifd.tiling(),
        1,
        ifd.sample_type(),
        PlanarConfiguration::Chunky,
        Options::default(),
    )
    .unwrap();

    {
        let mut write_map = WriteMap::new(map.clone(), &mut stream, &mut ifd, Uncompressed);
        for i in 0..8u32 {
            write_map.update_sample_i64(i, i, 0, 255, 8).unwrap();
        }
        write_map.complete_writing().unwrap();
    }

    let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0);
    let mut read_map = ReadMap::new(map, supplier, 16);
    for i in 0..8u32 {
        assert_eq!(read_map.read_sample_i64(i, i, 0).unwrap(), 255);
        if i > 0 {
            assert_eq!(read_map.read_sample_i64(i, i - 1, 0).unwrap(), 0);
        }
    }
}

// A 1-bit monochrome checkerboard, exercising sub-byte bit packing.
#[test]
fn one_bit_checkerboard_round_trips() {
    let mut ifd = GenericIfd::new(
        IfdKind::Classic,
        ByteOrder::LittleEndian,
        8,
        8,
        TilingMode::Tiled {
            tile_width: 8,
            tile_length: 8,
        },
        1,
        SampleType::UnsignedInt { bits: 1 },
        PlanarConfiguration::Chunky,
        PhotometricInterpretation::WhiteIsZero,
        CompressionMethod::None,
    );
    let mut stream = Cursor::new(Vec::new());
    let ifd_id = IfdId::fresh();
    let map = Map::new(
        ifd_id,
        8,
        8,
        ifd.tiling(),
        1,
        ifd.sample_type(),
        PlanarConfiguration::Chunky,
        Options::default(),
    )
    .unwrap();

    {
        let mut write_map = WriteMap::new(map.clone(), &mut stream, &mut ifd, Uncompressed);
        for y in 0..8u32 {
            for x in 0..8u32 {
                let value = if (x + y) % 2 == 0 { 1 } else { 0 };
                write_map.update_sample_i64(x, y, 0, value, 1).unwrap();
            }
        }
        write_map.complete_writing().unwrap();
    }

    let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0);
    let mut read_map = ReadMap::new(map, supplier, 4);
    for y in 0..8u32 {
        for x in 0..8u32 {
            let expected = if (x + y) % 2 == 0 { 1 } else { 0 };
            assert_eq!(read_map.read_sample_i64(x, y, 0).unwrap(), expected);
        }
    }
}

// Overwriting part of an already-written file in place must leave
// untouched bytes (and untouched samples) exactly as they were, and must not
// grow the file when the new data fits in the old chunk's capacity.
#[test]
fn in_place_overwrite_preserves_untouched_bytes() {
    let mut ifd = single_tile_ifd(4, 4, 1);
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
        for y in 0..4u32 {
            for x in 0..4u32 {
                write_map
                    .update_sample_i64(x, y, 0, (x + y * 4) as i64, 8)
                    .unwrap();
            }
        }
        write_map.complete_writing().unwrap();
    }
    let file_len_after_first_write = stream.get_ref().len();

    {
        let mut write_map = WriteMap::new(map.clone(), &mut stream, &mut ifd, Uncompressed);
        write_map.update_sample_i64(1, 1, 0, 99, 8).unwrap();
        write_map.complete_writing().unwrap();
    }

    // same-size overwrite reuses the existing chunk location: file does not
    // grow.
    assert_eq!(stream.get_ref().len(), file_len_after_first_write);

    let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0);
    let mut read_map = ReadMap::new(map, supplier, 4);
    assert_eq!(read_map.read_sample_i64(1, 1, 0).unwrap(), 99);
    // every other sample in the tile is untouched.
    for y in 0..4u32 {
        for x in 0..4u32 {
            if (x, y) == (1, 1) {
                continue;
            }
            assert_eq!(
                read_map.read_sample_i64(x, y, 0).unwrap(),
                (x + y * 4) as i64
            );
        }
    }
}

// A stripped (not tiled) layout with PackBits compression, covering the
// strip-geometry path and a real (non-identity) codec together.
#[test]
fn stripped_layout_with_packbits_round_trips() {
    let mut ifd = GenericIfd::new(
        IfdKind::Classic,
        ByteOrder::BigEndian,
        6,
        10,
        TilingMode::Stripped { rows_per_strip: 4 },
        1,
        SampleType::UnsignedInt { bits: 8 },
        PlanarConfiguration::Chunky,
        PhotometricInterpretation::BlackIsZero,
        CompressionMethod::PackBits,
    );
    let mut stream = Cursor::new(Vec::new());
    let ifd_id = IfdId::fresh();
    let map = Map::new(
        ifd_id,
        6,
        10,
        ifd.tiling(),
        1,
        ifd.sample_type(),
        PlanarConfiguration::Chunky,
        Options::default(),
    )
    .unwrap();

    let mut rng = XorShift::new(9001);
    let mut expected = vec![0u8; 60];
    {
        let mut write_map = WriteMap::new(map.clone(), &mut stream, &mut ifd, PackBitsCodec);
        for y in 0..10u32 {
            for x in 0..6u32 {
                let value = rng.next_u8();
                expected[(y * 6 + x) as usize] = value;
                write_map
                    .update_sample_i64(x, y, 0, value as i64, 8)
                    .unwrap();
            }
        }
        write_map.complete_writing().unwrap();
    }

    let supplier = StreamTileSupplier::new(&mut stream, &ifd, PackBitsCodec, 0);
    let mut read_map = ReadMap::new(map, supplier, 8);
    for y in 0..10u32 {
        for x in 0..6u32 {
            let expected_value = expected[(y * 6 + x) as usize] as i64;
            assert_eq!(read_map.read_sample_i64(x, y, 0).unwrap(), expected_value);
        }
    }

    // the last strip is only 2 rows tall (10 = 2*4 + 2); uncropped chunk
    // geometry would overhang the image, so cropping must have kicked in.
    assert_eq!(ifd.tiling().tiles_down(10), 3);
}

#[test]
fn unwritten_tile_reads_as_configured_filler() {
    let ifd = single_tile_ifd(4, 4, 1);
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
        Options::default().with_byte_filler(0x42),
    )
    .unwrap();
    let supplier = StreamTileSupplier::new(&mut stream, &ifd, Uncompressed, 0x42);
    let mut read_map = ReadMap::new(map, supplier, 1);
    assert_eq!(read_map.read_sample_i64(0, 0, 0).unwrap(), 0x42);
}
