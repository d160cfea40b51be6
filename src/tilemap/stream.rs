//! [`SeekableStream`]: the minimal random-access I/O seam `TileIO` needs.
//!
//! The engine is deliberately written against this narrow trait rather than
//! `std::fs::File` directly, so tests (and callers embedding the engine in
//! something other than a plain file, e.g. a memory-mapped buffer) can use
//! any `Read + Write + Seek` type, most commonly `std::io::Cursor<Vec<u8>>`.
//! This mirrors how the rest of the crate is generic over `R: Read + Seek`
//! / `W: Write + Seek` rather than hard-coding `File`.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::tilemap::error::TileResult;

/// A seekable, readable, writable, and independently length-queryable byte
/// store. Implemented for any `T: Read + Write + Seek`.
pub trait SeekableStream {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> TileResult<()>;
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> TileResult<()>;
    /// Current total length of the stream in bytes.
    fn len(&mut self) -> TileResult<u64>;
    /// Appends `buf` to the end of the stream, returning the offset it was
    /// written at.
    fn append(&mut self, buf: &[u8]) -> TileResult<u64>;
}

impl<T: Read + Write + Seek> SeekableStream for T {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> TileResult<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> TileResult<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(buf)?;
        Ok(())
    }

    fn len(&mut self) -> TileResult<u64> {
        let current = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(current))?;
        Ok(end)
    }

    fn append(&mut self, buf: &[u8]) -> TileResult<u64> {
        let offset = self.seek(SeekFrom::End(0))?;
        self.write_all(buf)?;
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn append_grows_stream_and_returns_prior_end() {
        let mut stream = Cursor::new(Vec::new());
        stream.write_at(0, b"hello").unwrap();
        let at = stream.append(b"world").unwrap();
        assert_eq!(at, 5);
        assert_eq!(stream.len().unwrap(), 10);
        let mut buf = [0u8; 10];
        stream.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"helloworld");
    }

    #[test]
    fn read_at_preserves_position_semantics() {
        let mut stream = Cursor::new(vec![0u8; 16]);
        stream.write_at(4, b"abcd").unwrap();
        let mut buf = [0u8; 4];
        stream.read_at(4, &mut buf).unwrap();
        assert_eq!(&buf, b"abcd");
    }
}
