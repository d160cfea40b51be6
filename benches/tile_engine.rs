extern crate criterion;
extern crate tiff;

use std::io::Cursor;

use criterion::{black_box, measurement::Measurement, BenchmarkGroup, Criterion, Throughput};
use tiff::tags::{CompressionMethod, PhotometricInterpretation, PlanarConfiguration};
use tiff::tilemap::byte_order::ByteOrder;
use tiff::tilemap::codec::Uncompressed;
use tiff::tilemap::ifd::{GenericIfd, IfdKind, IfdView};
use tiff::tilemap::index::IfdId;
use tiff::tilemap::map::{Map, Options};
use tiff::tilemap::read_map::{ReadMap, StreamTileSupplier};
use tiff::tilemap::sample_type::SampleType;
use tiff::tilemap::tiling::TilingMode;
use tiff::tilemap::write_map::WriteMap;

const SIDE: u32 = 512;
const TILE: u32 = 64;

fn build_ifd() -> GenericIfd {
    GenericIfd::new(
        IfdKind::Classic,
        ByteOrder::LittleEndian,
        SIDE,
        SIDE,
        TilingMode::Tiled {
            tile_width: TILE,
            tile_length: TILE,
        },
        1,
        SampleType::UnsignedInt { bits: 8 },
        PlanarConfiguration::Chunky,
        PhotometricInterpretation::BlackIsZero,
        CompressionMethod::None,
    )
}

fn build_map(ifd: &GenericIfd) -> Map {
    Map::new(
        IfdId::fresh(),
        SIDE,
        SIDE,
        ifd.tiling(),
        1,
        ifd.sample_type(),
        PlanarConfiguration::Chunky,
        Options::default(),
    )
    .unwrap()
}

fn write_full_image() -> (Cursor<Vec<u8>>, GenericIfd) {
    let mut ifd = build_ifd();
    let map = build_map(&ifd);
    let mut stream = Cursor::new(Vec::new());
    {
        let mut write_map = WriteMap::new(map, &mut stream, &mut ifd, Uncompressed);
        for y in 0..SIDE {
            for x in 0..SIDE {
                write_map
                    .update_sample_i64(x, y, 0, ((x ^ y) & 0xff) as i64, 8)
                    .unwrap();
            }
        }
        write_map.complete_writing().unwrap();
    }
    (stream, ifd)
}

fn sequential_scan(mut stream: Cursor<Vec<u8>>, ifd: GenericIfd) {
    let map = build_map(&ifd);
    let supplier = StreamTileSupplier::new(black_box(&mut stream), &ifd, Uncompressed, 0);
    let mut read_map = ReadMap::new(map, supplier, 8);
    for y in 0..SIDE {
        for x in 0..SIDE {
            black_box(read_map.read_sample_i64(x, y, 0).unwrap());
        }
    }
}

fn random_access_scan(mut stream: Cursor<Vec<u8>>, ifd: GenericIfd) {
    let map = build_map(&ifd);
    let supplier = StreamTileSupplier::new(black_box(&mut stream), &ifd, Uncompressed, 0);
    let mut read_map = ReadMap::new(map, supplier, 8);
    // a stride that is coprime with SIDE, so every coordinate is visited
    // exactly once but never in raster order.
    let stride = 131u32;
    let total = SIDE * SIDE;
    let mut i = 0u32;
    for _ in 0..total {
        let y = i / SIDE;
        let x = i % SIDE;
        black_box(read_map.read_sample_i64(x, y, 0).unwrap());
        i = (i + stride) % total;
    }
}

fn run_bench<M: Measurement>(
    group: &mut BenchmarkGroup<M>,
    id: &str,
    sample_size: usize,
    f: impl Fn() + 'static,
) {
    group
        .sample_size(sample_size)
        .throughput(Throughput::Bytes((SIDE * SIDE) as u64))
        .bench_function(id, move |b| b.iter(|| f()));
}

fn main() {
    let mut c = Criterion::default().configure_from_args();
    let mut group = c.benchmark_group("tiff-tilemap");

    run_bench(&mut group, "write-512x512-tiled-64", 20, || {
        let (_stream, _ifd) = write_full_image();
    });

    run_bench(&mut group, "read-sequential-512x512-tiled-64", 20, || {
        let (stream, ifd) = write_full_image();
        sequential_scan(stream, ifd);
    });

    run_bench(&mut group, "read-random-access-512x512-tiled-64", 10, || {
        let (stream, ifd) = write_full_image();
        random_access_scan(stream, ifd);
    });
}
