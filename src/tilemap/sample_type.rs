//! Sample storage format: signedness/floatness and bit width, independent of
//! how many samples make up a pixel (that is [`crate::ColorType`]'s job at
//! the whole-image level; `SampleType` is what one scalar value looks like).

use crate::tags::SampleFormat;

/// How a single sample value is encoded on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleType {
    /// Unsigned integer, `bits` wide (1 through 32).
    UnsignedInt { bits: u8 },
    /// Signed (two's complement) integer, `bits` wide (1 through 32).
    SignedInt { bits: u8 },
    /// IEEE 754-ish float, `bits` wide (16, 24 [non-standard], or 32/64).
    Float { bits: u8 },
}

impl SampleType {
    pub fn bits(self) -> u8 {
        match self {
            SampleType::UnsignedInt { bits }
            | SampleType::SignedInt { bits }
            | SampleType::Float { bits } => bits,
        }
    }

    /// True for the "unusual precision" widths [`crate::tilemap::unusual_precisions`]
    /// handles specially: 17-24 bit integers and 16-24 bit floats (any width
    /// that isn't a power-of-two-aligned native Rust type).
    pub fn is_unusual_precision(self) -> bool {
        match self {
            SampleType::UnsignedInt { bits } | SampleType::SignedInt { bits } => {
                bits > 16 && bits < 32
            }
            SampleType::Float { bits } => bits < 32,
        }
    }

    /// The native Rust storage width (in bits) samples of this type are
    /// widened to when `autoUnpackUnusualPrecisions` is enabled: the next
    /// width at or above `bits()` that Rust has a primitive for.
    pub fn widened_bits(self) -> u8 {
        match self {
            SampleType::Float { bits } if bits <= 32 => 32,
            SampleType::Float { .. } => 64,
            _ if self.bits() <= 8 => 8,
            _ if self.bits() <= 16 => 16,
            _ => 32,
        }
    }

    pub fn from_format_and_bits(format: SampleFormat, bits: u8) -> Option<Self> {
        match format {
            SampleFormat::Uint => Some(SampleType::UnsignedInt { bits }),
            SampleFormat::Int => Some(SampleType::SignedInt { bits }),
            SampleFormat::IEEEFP => Some(SampleType::Float { bits }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusual_precision_flags_odd_int_widths() {
        assert!(SampleType::UnsignedInt { bits: 20 }.is_unusual_precision());
        assert!(!SampleType::UnsignedInt { bits: 16 }.is_unusual_precision());
        assert!(!SampleType::UnsignedInt { bits: 32 }.is_unusual_precision());
    }

    #[test]
    fn unusual_precision_flags_narrow_floats() {
        assert!(SampleType::Float { bits: 24 }.is_unusual_precision());
        assert!(!SampleType::Float { bits: 32 }.is_unusual_precision());
    }

    #[test]
    fn widened_bits_rounds_up_to_native_width() {
        assert_eq!(SampleType::UnsignedInt { bits: 20 }.widened_bits(), 32);
        assert_eq!(SampleType::UnsignedInt { bits: 1 }.widened_bits(), 8);
        assert_eq!(SampleType::Float { bits: 24 }.widened_bits(), 32);
    }
}
