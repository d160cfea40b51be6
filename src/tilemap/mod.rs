//! A tile/strip random-access read/write engine for TIFF and BigTIFF
//! images: given an image's chunk geometry and a source of compressed chunk
//! bytes, lets a caller read or write individual samples at arbitrary pixel
//! coordinates without decoding or holding the whole image in memory.
//!
//! The engine is built from a small set of narrow, composable pieces:
//!
//! - [`TileIndex`](index::TileIndex) identifies one chunk (tile or strip,
//!   and plane for planar images) within a particular IFD's grid.
//! - [`Tile`](tile::Tile) is the in-memory handle for one chunk's pixel
//!   data, with an explicit lifecycle (`Empty` → `Decoded`/`Encoded` →
//!   disposed).
//! - [`TileIO`](tile_io::TileIO) reads and writes chunk byte ranges,
//!   choosing in-place overwrite vs. append-at-EOF.
//! - [`Map`](map::Map) is the chunk grid plus the bit-copy sample
//!   extraction/injection engine shared by the read and write paths.
//! - [`ReadMap`](read_map::ReadMap) and [`WriteMap`](write_map::WriteMap)
//!   are those two paths.
//! - [`IfdView`](ifd::IfdView) / [`IfdUpdate`](ifd::IfdUpdate) and
//!   [`Codec`](codec::Codec) are the narrow collaborator interfaces the
//!   engine programs against; [`GenericIfd`](ifd::GenericIfd) and the
//!   built-in codecs are concrete implementations sufficient to drive it.
//!
//! The engine assumes single-threaded, cooperative use: nothing here is
//! `Sync`, and callers are expected to finish one operation (in particular,
//! [`WriteMap::complete_writing`](write_map::WriteMap::complete_writing))
//! before starting another against the same map.

pub mod bitcopy;
pub mod byte_order;
pub mod codec;
pub mod error;
pub mod ifd;
pub mod index;
pub mod map;
pub mod read_map;
pub mod sample_type;
pub mod stream;
pub mod tile;
pub mod tile_io;
pub mod tiling;
pub mod unset_area;
pub mod unusual_precisions;
pub mod write_map;

pub use self::byte_order::ByteOrder;
pub use self::codec::Codec;
pub use self::error::{TileError, TileResult};
pub use self::ifd::{IfdSerialize, IfdUpdate, IfdView};
pub use self::index::{IfdId, TileIndex};
pub use self::map::{Map, Options};
pub use self::read_map::ReadMap;
pub use self::sample_type::SampleType;
pub use self::tile::Tile;
pub use self::tiling::TilingMode;
pub use self::write_map::WriteMap;
