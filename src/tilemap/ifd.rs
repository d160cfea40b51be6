//! The `IFD` collaborator seam.
//!
//! Full IFD tag parsing/serialization is an out-of-scope collaborator:
//! the engine only needs to ask an IFD for image geometry and
//! chunk locations, and to tell it when a chunk moves. [`IfdView`] and
//! [`IfdUpdate`] are that narrow seam, and [`GenericIfd`] is a minimal,
//! concrete IFD sufficient to drive the engine end-to-end — it understands
//! exactly the handful of tags ([`crate::tags::Tag`] values) the engine's
//! invariants reference, not the full TIFF tag set.
//!
//! `GenericIfd` writes both classic ("42") and BigTIFF ("43") headers,
//! choosing the offset field width the way [`crate::tiff_kind::TiffKind`]
//! does, but (unlike [`crate::encoder::writer::TiffWriter`], which always
//! writes in the host's native byte order) honors an explicit
//! [`ByteOrder`], since a TIFF file's declared byte order is a property of
//! the file, not of the machine writing it.

use crate::tags::{CompressionMethod, PhotometricInterpretation, PlanarConfiguration, Tag};
use crate::tilemap::byte_order::ByteOrder;
use crate::tilemap::error::{TileError, TileResult};
use crate::tilemap::sample_type::SampleType;
use crate::tilemap::tile_io::ChunkLocation;
use crate::tilemap::tiling::TilingMode;

/// Read-only geometry and chunk-location accessors an `IFD` must provide.
pub trait IfdView {
    fn byte_order(&self) -> ByteOrder;
    fn image_width(&self) -> u32;
    fn image_height(&self) -> u32;
    fn tiling(&self) -> TilingMode;
    fn samples_per_pixel(&self) -> u16;
    fn sample_type(&self) -> SampleType;
    fn planar_configuration(&self) -> PlanarConfiguration;
    fn photometric_interpretation(&self) -> PhotometricInterpretation;
    fn compression(&self) -> CompressionMethod;
    /// Current on-disk location of the chunk at `linear_index` within
    /// `plane`, or `None` if that chunk has never been written.
    fn chunk_location(&self, plane: u16, linear_index: u64) -> Option<ChunkLocation>;
    /// Whether this IFD is written as BigTIFF (8-byte offsets, no 4 GiB
    /// file-size ceiling) rather than classic TIFF.
    fn is_big(&self) -> bool;
}

/// Mutation hook an `IFD` must provide so `WriteMap` can record where a
/// chunk's bytes now live after a write.
pub trait IfdUpdate: IfdView {
    fn set_chunk_location(&mut self, plane: u16, linear_index: u64, location: ChunkLocation);
}

/// An `IFD` that can turn its current state (including chunk locations) back
/// into file bytes, needed for `WriteMap::update_ifd`'s existing-file
/// rewrite.
pub trait IfdSerialize: IfdUpdate {
    fn serialize_bytes(&self) -> TileResult<Vec<u8>>;
}

/// Whether a [`GenericIfd`] is written as classic TIFF or BigTIFF; mirrors
/// the distinction [`crate::tiff_kind::TiffKind`]'s two implementors make,
/// without requiring this module to depend on that trait's `TiffValue`
/// coupling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfdKind {
    Classic,
    Big,
}

/// A minimal, self-contained IFD sufficient to exercise the tile engine:
/// image/chunk geometry plus one offsets-and-byte-counts table per plane.
#[derive(Clone, Debug)]
pub struct GenericIfd {
    kind: IfdKind,
    byte_order: ByteOrder,
    image_width: u32,
    image_height: u32,
    tiling: TilingMode,
    samples_per_pixel: u16,
    sample_type: SampleType,
    planar_configuration: PlanarConfiguration,
    photometric_interpretation: PhotometricInterpretation,
    compression: CompressionMethod,
    // indexed by `TileIndex::linear_index`; `planes[p][i]` is plane `p`'s
    // chunk `i`.
    planes: Vec<Vec<Option<ChunkLocation>>>,
}

impl GenericIfd {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: IfdKind,
        byte_order: ByteOrder,
        image_width: u32,
        image_height: u32,
        tiling: TilingMode,
        samples_per_pixel: u16,
        sample_type: SampleType,
        planar_configuration: PlanarConfiguration,
        photometric_interpretation: PhotometricInterpretation,
        compression: CompressionMethod,
    ) -> Self {
        let chunks_per_plane = (tiling.tiles_across(image_width) as u64
            * tiling.tiles_down(image_height) as u64) as usize;
        let n_planes = match planar_configuration {
            PlanarConfiguration::Chunky => 1,
            PlanarConfiguration::Planar => samples_per_pixel as usize,
        };
        GenericIfd {
            kind,
            byte_order,
            image_width,
            image_height,
            tiling,
            samples_per_pixel,
            sample_type,
            planar_configuration,
            photometric_interpretation,
            compression,
            planes: vec![vec![None; chunks_per_plane]; n_planes],
        }
    }

    pub fn is_big(&self) -> bool {
        self.kind == IfdKind::Big
    }

    /// Serializes a classic or BigTIFF header plus one IFD describing the
    /// handful of tags this module understands, writing chunk offsets and
    /// byte counts from the current `planes` table. The IFD itself is
    /// placed immediately after the header; callers needing tile bytes
    /// placed first should write those before calling this and rely on
    /// `chunk_location` offsets already pointing past the header.
    pub fn serialize(&self) -> TileResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_header(&mut out);
        let ifd_offset = out.len() as u64;
        self.write_ifd(&mut out)?;
        // patch in the IFD offset field left blank by `write_header`.
        let offset_field_pos = if self.is_big() { 8 } else { 4 };
        self.patch_offset(&mut out, offset_field_pos, ifd_offset);
        Ok(out)
    }

    fn write_header(&self, out: &mut Vec<u8>) {
        let (b0, b1) = match self.byte_order {
            ByteOrder::LittleEndian => (b'I', b'I'),
            ByteOrder::BigEndian => (b'M', b'M'),
        };
        out.push(b0);
        out.push(b1);
        if self.is_big() {
            self.byte_order.write_u16(out, 43);
            self.byte_order.write_u16(out, 8); // offset byte size
            self.byte_order.write_u16(out, 0); // reserved
            self.byte_order.write_u64(out, 0); // IFD offset placeholder
        } else {
            self.byte_order.write_u16(out, 42);
            self.byte_order.write_u32(out, 0); // IFD offset placeholder
        }
    }

    fn patch_offset(&self, out: &mut [u8], pos: usize, value: u64) {
        let mut tmp = Vec::new();
        if self.is_big() {
            self.byte_order.write_u64(&mut tmp, value);
        } else {
            self.byte_order.write_u32(&mut tmp, value as u32);
        }
        out[pos..pos + tmp.len()].copy_from_slice(&tmp);
    }

    fn write_ifd(&self, out: &mut Vec<u8>) -> TileResult<()> {
        let bits_per_sample = self.sample_type.bits() as u16;
        // A conforming reader expects one BitsPerSample value per channel,
        // not one value shared across all of them.
        let bits_per_sample_values = vec![bits_per_sample as u64; self.samples_per_pixel as usize];
        let mut entries: Vec<(Tag, u16, Vec<u64>)> = vec![
            (Tag::ImageWidth, 4, vec![self.image_width as u64]),
            (Tag::ImageLength, 4, vec![self.image_height as u64]),
            (Tag::BitsPerSample, 3, bits_per_sample_values),
            (
                Tag::SamplesPerPixel,
                3,
                vec![self.samples_per_pixel as u64],
            ),
            (
                Tag::PlanarConfiguration,
                3,
                vec![self.planar_configuration.to_u16() as u64],
            ),
            (
                Tag::PhotometricInterpretation,
                3,
                vec![self.photometric_interpretation.to_u16() as u64],
            ),
            (Tag::Compression, 3, vec![self.compression.to_u16() as u64]),
        ];
        match self.tiling {
            TilingMode::Tiled {
                tile_width,
                tile_length,
            } => {
                entries.push((Tag::TileWidth, 4, vec![tile_width as u64]));
                entries.push((Tag::TileLength, 4, vec![tile_length as u64]));
            }
            TilingMode::Stripped { rows_per_strip } => {
                entries.push((Tag::RowsPerStrip, 4, vec![rows_per_strip as u64]));
            }
        }

        let offsets: Vec<u64> = self
            .planes
            .iter()
            .flat_map(|plane| plane.iter().map(|loc| loc.map_or(0, |l| l.offset)))
            .collect();
        let byte_counts: Vec<u64> = self
            .planes
            .iter()
            .flat_map(|plane| plane.iter().map(|loc| loc.map_or(0, |l| l.byte_count)))
            .collect();
        let offsets_tag = match self.tiling {
            TilingMode::Tiled { .. } => Tag::TileOffsets,
            TilingMode::Stripped { .. } => Tag::StripOffsets,
        };
        let counts_tag = match self.tiling {
            TilingMode::Tiled { .. } => Tag::TileByteCounts,
            TilingMode::Stripped { .. } => Tag::StripByteCounts,
        };
        let offset_type = if self.is_big() { 16 } else { 4 };
        entries.push((offsets_tag, offset_type, offsets));
        entries.push((counts_tag, 4, byte_counts));

        if self.is_big() {
            self.byte_order.write_u64(out, entries.len() as u64);
        } else {
            self.byte_order.write_u16(out, entries.len() as u16);
        }

        let entry_width = if self.is_big() { 20 } else { 12 };
        let inline_capacity = if self.is_big() { 8 } else { 4 };
        let overflow_area_start = out.len() + entries.len() * entry_width + inline_capacity;
        let mut overflow = Vec::new();

        for (tag, type_, values) in &entries {
            self.byte_order.write_u16(out, tag.to_u16());
            self.byte_order.write_u16(out, *type_);
            if self.is_big() {
                self.byte_order.write_u64(out, values.len() as u64);
            } else {
                self.byte_order.write_u32(out, values.len() as u32);
            }
            let value_bytes = self.encode_values(*type_, values);
            if value_bytes.len() <= inline_capacity {
                let mut padded = value_bytes.clone();
                padded.resize(inline_capacity, 0);
                out.extend_from_slice(&padded);
            } else {
                let overflow_offset = overflow_area_start + overflow.len();
                self.patch_offset_inline(out, overflow_offset as u64);
                overflow.extend_from_slice(&value_bytes);
            }
        }
        if !self.is_big() {
            self.byte_order.write_u32(out, 0); // next-IFD offset: none
        } else {
            self.byte_order.write_u64(out, 0);
        }
        out.extend_from_slice(&overflow);
        Ok(())
    }

    fn patch_offset_inline(&self, out: &mut Vec<u8>, value: u64) {
        let inline_capacity = if self.is_big() { 8 } else { 4 };
        let mut tmp = Vec::new();
        if self.is_big() {
            self.byte_order.write_u64(&mut tmp, value);
        } else {
            self.byte_order.write_u32(&mut tmp, value as u32);
        }
        tmp.resize(inline_capacity, 0);
        out.extend_from_slice(&tmp);
    }

    fn encode_values(&self, type_: u16, values: &[u64]) -> Vec<u8> {
        let mut out = Vec::new();
        for &v in values {
            match type_ {
                3 => self.byte_order.write_u16(&mut out, v as u16),
                4 => self.byte_order.write_u32(&mut out, v as u32),
                16 => self.byte_order.write_u64(&mut out, v),
                _ => self.byte_order.write_u32(&mut out, v as u32),
            }
        }
        out
    }

    fn plane_and_chunk(&self, plane: u16, linear_index: u64) -> TileResult<(usize, usize)> {
        let p = plane as usize;
        if p >= self.planes.len() {
            return Err(TileError::out_of_bounds(
                format!("plane {} out of range (have {})", plane, self.planes.len()),
                None,
            ));
        }
        let i = linear_index as usize;
        if i >= self.planes[p].len() {
            return Err(TileError::out_of_bounds(
                format!(
                    "chunk index {} out of range (have {})",
                    linear_index,
                    self.planes[p].len()
                ),
                None,
            ));
        }
        Ok((p, i))
    }
}

impl IfdView for GenericIfd {
    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn image_width(&self) -> u32 {
        self.image_width
    }

    fn image_height(&self) -> u32 {
        self.image_height
    }

    fn tiling(&self) -> TilingMode {
        self.tiling
    }

    fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    fn planar_configuration(&self) -> PlanarConfiguration {
        self.planar_configuration
    }

    fn photometric_interpretation(&self) -> PhotometricInterpretation {
        self.photometric_interpretation
    }

    fn compression(&self) -> CompressionMethod {
        self.compression
    }

    fn chunk_location(&self, plane: u16, linear_index: u64) -> Option<ChunkLocation> {
        let (p, i) = self.plane_and_chunk(plane, linear_index).ok()?;
        self.planes[p][i]
    }

    fn is_big(&self) -> bool {
        self.kind == IfdKind::Big
    }
}

impl IfdUpdate for GenericIfd {
    fn set_chunk_location(&mut self, plane: u16, linear_index: u64, location: ChunkLocation) {
        if let Ok((p, i)) = self.plane_and_chunk(plane, linear_index) {
            self.planes[p][i] = Some(location);
        }
    }
}

impl IfdSerialize for GenericIfd {
    fn serialize_bytes(&self) -> TileResult<Vec<u8>> {
        self.serialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ifd() -> GenericIfd {
        GenericIfd::new(
            IfdKind::Classic,
            ByteOrder::LittleEndian,
            4,
            4,
            TilingMode::Tiled {
                tile_width: 4,
                tile_length: 4,
            },
            1,
            SampleType::UnsignedInt { bits: 8 },
            PlanarConfiguration::Chunky,
            PhotometricInterpretation::BlackIsZero,
            CompressionMethod::None,
        )
    }

    #[test]
    fn fresh_ifd_has_no_chunk_locations() {
        let ifd = sample_ifd();
        assert_eq!(ifd.chunk_location(0, 0), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut ifd = sample_ifd();
        let loc = ChunkLocation::exact(100, 16);
        ifd.set_chunk_location(0, 0, loc);
        assert_eq!(ifd.chunk_location(0, 0), Some(loc));
    }

    #[test]
    fn serialize_starts_with_byte_order_marker() {
        let ifd = sample_ifd();
        let bytes = ifd.serialize().unwrap();
        assert_eq!(&bytes[0..2], b"II");
        assert_eq!(ifd.byte_order().read_u16(&bytes[2..4]), 42);
    }

    #[test]
    fn bigtiff_serialize_uses_43_and_eight_byte_offsets() {
        let mut ifd = sample_ifd();
        ifd.kind = IfdKind::Big;
        let bytes = ifd.serialize().unwrap();
        assert_eq!(ifd.byte_order().read_u16(&bytes[2..4]), 43);
        assert_eq!(ifd.byte_order().read_u16(&bytes[4..6]), 8);
    }

    #[test]
    fn out_of_range_plane_is_rejected() {
        let ifd = sample_ifd();
        assert_eq!(ifd.chunk_location(5, 0), None);
    }

    #[test]
    fn bits_per_sample_has_one_entry_per_channel() {
        let ifd = GenericIfd::new(
            IfdKind::Classic,
            ByteOrder::LittleEndian,
            4,
            4,
            TilingMode::Tiled {
                tile_width: 4,
                tile_length: 4,
            },
            3,
            SampleType::UnsignedInt { bits: 8 },
            PlanarConfiguration::Chunky,
            PhotometricInterpretation::RGB,
            CompressionMethod::None,
        );
        let bytes = ifd.serialize().unwrap();
        let entry_count = ifd.byte_order().read_u16(&bytes[8..10]) as usize;
        let mut found = false;
        for i in 0..entry_count {
            let entry = &bytes[10 + i * 12..10 + (i + 1) * 12];
            let tag = ifd.byte_order().read_u16(&entry[0..2]);
            if tag == Tag::BitsPerSample.to_u16() {
                let count = ifd.byte_order().read_u32(&entry[4..8]);
                assert_eq!(count, 3);
                found = true;
            }
        }
        assert!(found, "BitsPerSample entry not found");
    }
}
