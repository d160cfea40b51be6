//! Endian-aware reads and writes of the primitive widths the tile engine
//! needs (8/16/32/64 bit integers and IEEE floats).
//!
//! TIFF allows either byte order per-file (the `II`/`MM` marker in the
//! header); everything downstream of the header has to thread that choice
//! through. This mirrors the role `tiff_kind::TiffKind` plays for
//! classic-vs-BigTIFF offset width, but for byte order instead.

/// Byte order of a TIFF file, as declared by its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Reads a `u16` from the first two bytes of `bytes`.
    ///
    /// Panics if `bytes` has fewer than 2 bytes; callers are expected to
    /// slice before calling, matching the convention of the rest of the
    /// crate's endian helpers.
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        let b: [u8; 2] = bytes[..2].try_into().unwrap();
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(b),
            ByteOrder::BigEndian => u16::from_be_bytes(b),
        }
    }

    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let b: [u8; 4] = bytes[..4].try_into().unwrap();
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(b),
            ByteOrder::BigEndian => u32::from_be_bytes(b),
        }
    }

    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let b: [u8; 8] = bytes[..8].try_into().unwrap();
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(b),
            ByteOrder::BigEndian => u64::from_be_bytes(b),
        }
    }

    pub fn read_i16(self, bytes: &[u8]) -> i16 {
        self.read_u16(bytes) as i16
    }

    pub fn read_i32(self, bytes: &[u8]) -> i32 {
        self.read_u32(bytes) as i32
    }

    pub fn read_i64(self, bytes: &[u8]) -> i64 {
        self.read_u64(bytes) as i64
    }

    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        f32::from_bits(self.read_u32(bytes))
    }

    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        f64::from_bits(self.read_u64(bytes))
    }

    pub fn write_u16(self, out: &mut Vec<u8>, value: u16) {
        out.extend_from_slice(&match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        });
    }

    pub fn write_u32(self, out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        });
    }

    pub fn write_u64(self, out: &mut Vec<u8>, value: u64) {
        out.extend_from_slice(&match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        });
    }

    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_u32() {
        for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
            let mut buf = Vec::new();
            order.write_u32(&mut buf, 0xdead_beef);
            assert_eq!(order.read_u32(&buf), 0xdead_beef);
        }
    }

    #[test]
    fn little_endian_matches_le_bytes() {
        let mut buf = Vec::new();
        ByteOrder::LittleEndian.write_u16(&mut buf, 0x0102);
        assert_eq!(buf, vec![0x02, 0x01]);
    }

    #[test]
    fn big_endian_matches_be_bytes() {
        let mut buf = Vec::new();
        ByteOrder::BigEndian.write_u16(&mut buf, 0x0102);
        assert_eq!(buf, vec![0x01, 0x02]);
    }
}
