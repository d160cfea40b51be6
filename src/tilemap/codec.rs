//! [`Codec`]: the narrow collaborator interface a `Map` uses to compress
//! and decompress one chunk's worth of pixel bytes.
//!
//! Codec internals are out of scope for the engine itself — the engine only
//! needs something that turns decoded bytes into encoded bytes and back.
//! This module defines that seam as a trait and supplies a
//! handful of concrete implementations exercising it, built from the same
//! compression crates the rest of this codebase already depends on
//! (`flate2` for Deflate, `weezl` for LZW); PackBits needs no external crate
//! and is implemented directly.

use std::io::{self, Read, Write};

use crate::tags::CompressionMethod;
use crate::tilemap::error::{TileError, TileResult};

/// Compresses and decompresses one chunk's pixel bytes.
///
/// Implementations are expected to be stateless (or cheaply `Clone`) since
/// a `Map` may hold one codec instance shared across every tile.
pub trait Codec {
    /// The `Compression` tag value this codec corresponds to.
    fn compression_method(&self) -> CompressionMethod;

    /// Decompresses `data` into exactly `expected_len` bytes of raw pixel
    /// data. An implementation that produces a different length must treat
    /// that as [`TileError::Format`], not silently truncate or pad.
    fn decode(&self, data: &[u8], expected_len: usize) -> TileResult<Vec<u8>>;

    /// Compresses a full chunk of raw pixel data.
    fn encode(&self, data: &[u8]) -> TileResult<Vec<u8>>;
}

/// No compression: the identity codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uncompressed;

impl Codec for Uncompressed {
    fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::None
    }

    fn decode(&self, data: &[u8], expected_len: usize) -> TileResult<Vec<u8>> {
        if data.len() != expected_len {
            return Err(TileError::format(format!(
                "uncompressed chunk has {} bytes, expected {}",
                data.len(),
                expected_len
            )));
        }
        Ok(data.to_vec())
    }

    fn encode(&self, data: &[u8]) -> TileResult<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// Apple `PackBits` run-length encoding, as used by TIFF's `Compression = 32773`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PackBitsCodec;

impl Codec for PackBitsCodec {
    fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::PackBits
    }

    fn decode(&self, data: &[u8], expected_len: usize) -> TileResult<Vec<u8>> {
        let mut out = Vec::with_capacity(expected_len);
        let mut pos = 0usize;
        while pos < data.len() && out.len() < expected_len {
            let header = data[pos] as i8;
            pos += 1;
            if header >= 0 {
                let count = header as usize + 1;
                let end = pos + count;
                if end > data.len() {
                    return Err(TileError::format("PackBits literal run overruns buffer"));
                }
                out.extend_from_slice(&data[pos..end]);
                pos = end;
            } else if header != -128 {
                let count = (1 - header as isize) as usize;
                if pos >= data.len() {
                    return Err(TileError::format("PackBits repeat run missing value byte"));
                }
                let value = data[pos];
                pos += 1;
                out.resize(out.len() + count, value);
            }
            // header == -128 is a documented no-op.
        }
        if out.len() != expected_len {
            return Err(TileError::format(format!(
                "PackBits stream decoded to {} bytes, expected {}",
                out.len(),
                expected_len
            )));
        }
        Ok(out)
    }

    fn encode(&self, data: &[u8]) -> TileResult<Vec<u8>> {
        // Simple, correct (if not maximally compact) encoder: emit runs of
        // identical bytes as repeats when at least 3 long, literal
        // sequences otherwise, never spanning more than 128 bytes per
        // packet as the format requires.
        let mut out = Vec::new();
        let mut i = 0usize;
        while i < data.len() {
            let run_len = run_length(data, i);
            if run_len >= 3 {
                let mut remaining = run_len;
                while remaining > 0 {
                    let chunk = remaining.min(128);
                    out.push((1 - chunk as isize) as i8 as u8);
                    out.push(data[i]);
                    remaining -= chunk;
                }
                i += run_len;
            } else {
                let start = i;
                let mut len = 0usize;
                while i < data.len() && len < 128 {
                    let next_run = run_length(data, i);
                    if next_run >= 3 {
                        break;
                    }
                    i += 1;
                    len += 1;
                }
                out.push((len - 1) as u8);
                out.extend_from_slice(&data[start..start + len]);
            }
        }
        Ok(out)
    }
}

fn run_length(data: &[u8], start: usize) -> usize {
    let value = data[start];
    let mut len = 1;
    while start + len < data.len() && data[start + len] == value && len < 128 {
        len += 1;
    }
    len
}

/// Zlib-wrapped Deflate, TIFF's `Compression = 8`.
#[cfg(feature = "deflate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct DeflateCodec;

#[cfg(feature = "deflate")]
impl Codec for DeflateCodec {
    fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::Deflate
    }

    fn decode(&self, data: &[u8], expected_len: usize) -> TileResult<Vec<u8>> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut out = Vec::with_capacity(expected_len);
        decoder.read_to_end(&mut out).map_err(TileError::from)?;
        if out.len() != expected_len {
            return Err(TileError::format(format!(
                "deflate stream decoded to {} bytes, expected {}",
                out.len(),
                expected_len
            )));
        }
        Ok(out)
    }

    fn encode(&self, data: &[u8]) -> TileResult<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).map_err(TileError::from)?;
        encoder.finish().map_err(TileError::from)
    }
}

/// LZW, TIFF's `Compression = 5`, matching the MSB-first, TIFF-style
/// early-code-size-switch variant the rest of this crate uses.
#[cfg(feature = "lzw")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LzwCodec;

#[cfg(feature = "lzw")]
impl Codec for LzwCodec {
    fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::LZW
    }

    fn decode(&self, data: &[u8], expected_len: usize) -> TileResult<Vec<u8>> {
        let configuration =
            weezl::decode::Configuration::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
        let mut decoder = configuration.build();
        let mut out = Vec::with_capacity(expected_len);
        let mut buf = [0u8; 4096];
        let mut input = data;
        loop {
            let result = decoder.decode_bytes(input, &mut buf);
            out.extend_from_slice(&buf[..result.consumed_out]);
            input = &input[result.consumed_in..];
            match result.status {
                Ok(weezl::LzwStatus::Ok) => continue,
                Ok(weezl::LzwStatus::Done) => break,
                Ok(weezl::LzwStatus::NoProgress) => {
                    return Err(TileError::format("LZW stream ended without an end code"))
                }
                Err(err) => {
                    return Err(TileError::from(io::Error::new(
                        io::ErrorKind::InvalidData,
                        err,
                    )))
                }
            }
        }
        if out.len() != expected_len {
            return Err(TileError::format(format!(
                "LZW stream decoded to {} bytes, expected {}",
                out.len(),
                expected_len
            )));
        }
        Ok(out)
    }

    fn encode(&self, data: &[u8]) -> TileResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut encoder = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
        let result = encoder.into_stream(&mut out).encode_all(data);
        result
            .status
            .map_err(|err| TileError::from(io::Error::new(io::ErrorKind::InvalidData, err)))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_round_trips() {
        let codec = Uncompressed;
        let data = vec![1, 2, 3, 4, 5];
        let encoded = codec.encode(&data).unwrap();
        let decoded = codec.decode(&encoded, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn packbits_round_trips_runs_and_literals() {
        let codec = PackBitsCodec;
        let data = [0u8, 0, 0, 0, 1, 2, 3, 9, 9, 9, 9, 9, 9];
        let encoded = codec.encode(&data).unwrap();
        let decoded = codec.decode(&encoded, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn packbits_rejects_truncated_stream() {
        let codec = PackBitsCodec;
        assert!(codec.decode(&[0x02, 0xAA], 3).is_err());
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn deflate_round_trips() {
        let codec = DeflateCodec;
        let data: Vec<u8> = (0..=255u8).cycle().take(2000).collect();
        let encoded = codec.encode(&data).unwrap();
        let decoded = codec.decode(&encoded, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[cfg(feature = "lzw")]
    #[test]
    fn lzw_round_trips() {
        let codec = LzwCodec;
        let data: Vec<u8> = (0..=255u8).cycle().take(2000).collect();
        let encoded = codec.encode(&data).unwrap();
        let decoded = codec.decode(&encoded, data.len()).unwrap();
        assert_eq!(decoded, data);
    }
}
