//! [`TileIO`]: decides, for each chunk write, whether the new compressed
//! bytes fit back into the space the chunk already occupies in the file or
//! must be appended at the end.
//!
//! A chunk's on-disk location is more than an offset and a byte count: once
//! a chunk has been written once, the space it occupies (its *capacity*) is
//! the high-water mark of everything ever written there, which may exceed
//! its current byte count if a later write shrank it. Reusing that space
//! for same-size-or-smaller rewrites is what keeps repeated in-place edits
//! of the same rectangle from growing the file without bound; a write that
//! no longer fits falls back to appending at EOF, the same tradeoff
//! `alwaysWriteToFileEnd` lets a caller force unconditionally.

use crate::tilemap::error::{TileError, TileResult};
use crate::tilemap::stream::SeekableStream;

/// Classic TIFF's offset fields are 4 bytes wide; spec.md §6
/// (`require32BitFile`) and §4.3 step 2 draw the line 16 bytes short of the
/// true 2^32 ceiling so that a following tile's own header fields never
/// wrap.
const CLASSIC_FILE_SIZE_LIMIT: u64 = 0xFFFF_FFF0;

/// Where one chunk's compressed bytes currently live in the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLocation {
    pub offset: u64,
    pub byte_count: u64,
    /// Total space available at `offset` without touching following data;
    /// always `>= byte_count`.
    pub capacity: u64,
}

impl ChunkLocation {
    /// The location of a chunk being created for the first time via
    /// append: capacity exactly matches what was written.
    pub fn exact(offset: u64, byte_count: u64) -> Self {
        ChunkLocation {
            offset,
            byte_count,
            capacity: byte_count,
        }
    }
}

/// Random-access reader/writer for chunk byte ranges, implementing the
/// in-place-vs-append capacity policy.
pub struct TileIO<'a, S: SeekableStream> {
    stream: &'a mut S,
    always_write_to_file_end: bool,
    /// Whether appends must stay clear of the classic-TIFF 4 GiB boundary
    /// (`Options::require_32_bit_file`, only meaningful for a non-BigTIFF
    /// file).
    enforce_classic_file_size_limit: bool,
}

impl<'a, S: SeekableStream> TileIO<'a, S> {
    pub fn new(stream: &'a mut S, always_write_to_file_end: bool) -> Self {
        TileIO {
            stream,
            always_write_to_file_end,
            enforce_classic_file_size_limit: false,
        }
    }

    /// Builds a `TileIO` that additionally enforces the classic-TIFF file
    /// size ceiling on every append, per `Options::require_32_bit_file`.
    /// `is_big` is the IFD's own BigTIFF-vs-classic choice: the limit never
    /// applies to a BigTIFF file regardless of the option.
    pub fn with_size_limit(
        stream: &'a mut S,
        always_write_to_file_end: bool,
        require_32_bit_file: bool,
        is_big: bool,
    ) -> Self {
        TileIO {
            stream,
            always_write_to_file_end,
            enforce_classic_file_size_limit: require_32_bit_file && !is_big,
        }
    }

    pub fn read_chunk(&mut self, location: ChunkLocation) -> TileResult<Vec<u8>> {
        let mut buf = vec![0u8; location.byte_count as usize];
        self.stream.read_at(location.offset, &mut buf)?;
        Ok(buf)
    }

    fn check_classic_file_size_limit(&mut self, additional: u64) -> TileResult<()> {
        if !self.enforce_classic_file_size_limit {
            return Ok(());
        }
        let projected = self.stream.len()? + additional;
        if projected > CLASSIC_FILE_SIZE_LIMIT {
            return Err(TileError::too_large(
                "append would cross the classic TIFF 4 GiB file size boundary",
                projected,
                CLASSIC_FILE_SIZE_LIMIT,
            ));
        }
        Ok(())
    }

    /// Writes `data` for a chunk that has no prior on-disk location: always
    /// appends.
    pub fn write_new_chunk(&mut self, data: &[u8]) -> TileResult<ChunkLocation> {
        self.check_classic_file_size_limit(data.len() as u64)?;
        let offset = self.stream.append(data)?;
        Ok(ChunkLocation::exact(offset, data.len() as u64))
    }

    /// Writes `data` to replace a chunk previously stored at `existing`,
    /// choosing in-place overwrite when it fits and appending otherwise.
    pub fn rewrite_chunk(
        &mut self,
        existing: ChunkLocation,
        data: &[u8],
    ) -> TileResult<ChunkLocation> {
        let new_len = data.len() as u64;
        if !self.always_write_to_file_end && new_len <= existing.capacity {
            self.stream.write_at(existing.offset, data)?;
            return Ok(ChunkLocation {
                offset: existing.offset,
                byte_count: new_len,
                capacity: existing.capacity,
            });
        }
        self.check_classic_file_size_limit(new_len)?;
        let offset = self.stream.append(data)?;
        Ok(ChunkLocation::exact(offset, new_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn smaller_rewrite_reuses_capacity_in_place() {
        let mut backing = Cursor::new(Vec::new());
        let mut io = TileIO::new(&mut backing, false);
        let loc = io.write_new_chunk(b"0123456789").unwrap();
        assert_eq!(loc, ChunkLocation::exact(0, 10));

        let rewritten = io.rewrite_chunk(loc, b"abc").unwrap();
        assert_eq!(rewritten.offset, 0);
        assert_eq!(rewritten.byte_count, 3);
        assert_eq!(rewritten.capacity, 10);

        // the file did not grow, and untouched trailing bytes remain.
        assert_eq!(backing.get_ref().len(), 10);
        assert_eq!(&backing.get_ref()[..3], b"abc");
        assert_eq!(&backing.get_ref()[3..10], b"3456789");
    }

    #[test]
    fn oversized_rewrite_appends_at_eof() {
        let mut backing = Cursor::new(Vec::new());
        let mut io = TileIO::new(&mut backing, false);
        let loc = io.write_new_chunk(b"abc").unwrap();

        let rewritten = io.rewrite_chunk(loc, b"0123456789").unwrap();
        assert_eq!(rewritten.offset, 3);
        assert_eq!(rewritten.byte_count, 10);
        assert_eq!(backing.get_ref().len(), 13);
    }

    #[test]
    fn always_write_to_file_end_forces_append_even_when_it_fits() {
        let mut backing = Cursor::new(Vec::new());
        let mut io = TileIO::new(&mut backing, true);
        let loc = io.write_new_chunk(b"0123456789").unwrap();

        let rewritten = io.rewrite_chunk(loc, b"abc").unwrap();
        assert_eq!(rewritten.offset, 10);
        assert_eq!(backing.get_ref().len(), 13);
    }

    #[test]
    fn idempotent_overwrite_with_same_bytes_is_a_no_op_in_place() {
        let mut backing = Cursor::new(Vec::new());
        let mut io = TileIO::new(&mut backing, false);
        let loc = io.write_new_chunk(b"same").unwrap();
        let first = io.rewrite_chunk(loc, b"same").unwrap();
        let second = io.rewrite_chunk(first, b"same").unwrap();
        assert_eq!(first, second);
    }

    /// Reports a caller-chosen length without actually holding that many
    /// bytes, so the size-limit tests below don't allocate a ~4 GiB buffer.
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
    fn classic_file_size_limit_rejects_append_past_boundary() {
        let mut backing = FakeLenStream {
            fake_len: CLASSIC_FILE_SIZE_LIMIT,
        };
        let mut io = TileIO::with_size_limit(&mut backing, false, true, false);
        let err = io.write_new_chunk(b"abc").unwrap_err();
        assert!(matches!(err, TileError::TooLarge { .. }));
    }

    #[test]
    fn classic_file_size_limit_does_not_apply_to_bigtiff() {
        let mut backing = FakeLenStream {
            fake_len: CLASSIC_FILE_SIZE_LIMIT,
        };
        let mut io = TileIO::with_size_limit(&mut backing, false, true, true);
        assert!(io.write_new_chunk(b"abc").is_ok());
    }

    #[test]
    fn classic_file_size_limit_does_not_apply_when_option_unset() {
        let mut backing = FakeLenStream {
            fake_len: CLASSIC_FILE_SIZE_LIMIT,
        };
        let mut io = TileIO::with_size_limit(&mut backing, false, false, false);
        assert!(io.write_new_chunk(b"abc").is_ok());
    }
}
