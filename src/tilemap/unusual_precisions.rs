//! Widening and narrowing for sample widths Rust has no native type for:
//! 17-24 bit integers and 16/24-bit floats.
//!
//! [`Map`](crate::tilemap::map::Map) always stores and retrieves samples as
//! raw bit patterns via [`bitcopy`](crate::tilemap::bitcopy); this module is
//! where those raw bits get interpreted as (or constructed from) an actual
//! numeric value, when `Options::auto_unpack_unusual_precisions` is set. For
//! widths Rust *does* have a native type for (8/16/32/64-bit ints, 32/64-bit
//! floats) widening is the identity transform and this module is a no-op.
//!
//! 16-bit floats follow IEEE 754 binary16 (delegated to the `half` crate,
//! already a dependency for other parts of this codebase). TIFF has no
//! standard 24-bit float layout; this engine treats it as sign(1) /
//! exponent(7, bias 63) / mantissa(16), the same proportions as binary32
//! scaled down, and documents that choice as an explicit decision rather
//! than silently guessing — see `DESIGN.md`.

use crate::tilemap::sample_type::SampleType;

/// Sign-extends the low `bits` bits of `raw` to a full `i64`.
fn sign_extend(raw: u64, bits: u8) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

fn decode_float24(raw: u32) -> f64 {
    let sign = if (raw >> 23) & 1 != 0 { -1.0 } else { 1.0 };
    let exponent = ((raw >> 16) & 0x7f) as i32 - 63;
    let mantissa = (raw & 0xffff) as f64 / (1u32 << 16) as f64;
    if exponent == -63 && mantissa == 0.0 {
        return sign * 0.0;
    }
    sign * (1.0 + mantissa) * 2f64.powi(exponent)
}

fn encode_float24(value: f64) -> u32 {
    if value == 0.0 {
        return if value.is_sign_negative() { 1 << 23 } else { 0 };
    }
    let sign = if value.is_sign_negative() { 1u32 } else { 0 };
    let magnitude = value.abs();
    let exponent = magnitude.log2().floor() as i32;
    let normalized = magnitude / 2f64.powi(exponent);
    let mantissa = ((normalized - 1.0) * (1u32 << 16) as f64).round() as u32 & 0xffff;
    let biased_exponent = ((exponent + 63).clamp(0, 127)) as u32;
    (sign << 23) | (biased_exponent << 16) | mantissa
}

/// Interprets `raw` (as produced by [`Map::extract_sample_bits`]) as a
/// floating-point value according to `sample_type`.
///
/// # Panics
/// Panics if `sample_type` is not [`SampleType::Float`].
pub fn widen_to_f64(raw: u64, sample_type: SampleType) -> f64 {
    match sample_type {
        SampleType::Float { bits: 16 } => half::f16::from_bits(raw as u16).to_f64(),
        SampleType::Float { bits: 24 } => decode_float24(raw as u32),
        SampleType::Float { bits: 32 } => f32::from_bits(raw as u32) as f64,
        SampleType::Float { bits: 64 } => f64::from_bits(raw),
        SampleType::Float { bits } => panic!("unsupported float width {}", bits),
        SampleType::UnsignedInt { .. } | SampleType::SignedInt { .. } => {
            panic!("widen_to_f64 called on an integer sample type")
        }
    }
}

/// Constructs the raw bit pattern for `value` under `sample_type`.
///
/// # Panics
/// Panics if `sample_type` is not [`SampleType::Float`].
pub fn narrow_from_f64(value: f64, sample_type: SampleType) -> u64 {
    match sample_type {
        SampleType::Float { bits: 16 } => half::f16::from_f64(value).to_bits() as u64,
        SampleType::Float { bits: 24 } => encode_float24(value) as u64,
        SampleType::Float { bits: 32 } => (value as f32).to_bits() as u64,
        SampleType::Float { bits: 64 } => value.to_bits(),
        SampleType::Float { bits } => panic!("unsupported float width {}", bits),
        SampleType::UnsignedInt { .. } | SampleType::SignedInt { .. } => {
            panic!("narrow_from_f64 called on an integer sample type")
        }
    }
}

/// Interprets `raw` as a signed or unsigned integer according to
/// `sample_type`, sign-extending for `SignedInt`.
///
/// # Panics
/// Panics if `sample_type` is [`SampleType::Float`].
pub fn widen_to_i64(raw: u64, sample_type: SampleType) -> i64 {
    match sample_type {
        SampleType::UnsignedInt { .. } => raw as i64,
        SampleType::SignedInt { bits } => sign_extend(raw, bits),
        SampleType::Float { .. } => panic!("widen_to_i64 called on a float sample type"),
    }
}

/// Constructs the raw bit pattern for `value` under `sample_type`, masking
/// to the type's bit width.
///
/// # Panics
/// Panics if `sample_type` is [`SampleType::Float`].
pub fn narrow_from_i64(value: i64, sample_type: SampleType) -> u64 {
    let bits = sample_type.bits();
    let mask = if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };
    match sample_type {
        SampleType::UnsignedInt { .. } | SampleType::SignedInt { .. } => (value as u64) & mask,
        SampleType::Float { .. } => panic!("narrow_from_i64 called on a float sample type"),
    }
}

/// Proportionally rescales an unsigned integer sample from `from_bits` to
/// `to_bits` of precision (used when `Options::auto_scale_when_increasing_bit_depth`
/// is set, rather than left-justifying the bit pattern into the wider
/// field).
pub fn scale_unsigned(value: u64, from_bits: u8, to_bits: u8) -> u64 {
    if from_bits == to_bits || from_bits == 0 {
        return value;
    }
    let from_max = if from_bits >= 64 {
        u64::MAX
    } else {
        (1u64 << from_bits) - 1
    };
    let to_max = if to_bits >= 64 {
        u64::MAX
    } else {
        (1u64 << to_bits) - 1
    };
    if from_max == 0 {
        return 0;
    }
    ((value as u128 * to_max as u128) / from_max as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_widths_are_no_ops() {
        // An 8/16/32/64-bit sample's raw bits equal its numeric value
        // directly; nothing in this module needs to run for them.
        let raw = 0xABu64;
        assert_eq!(widen_to_i64(raw, SampleType::UnsignedInt { bits: 8 }), 0xAB);
    }

    #[test]
    fn signed_unusual_precision_sign_extends() {
        // 20-bit two's complement -1 is 0xFFFFF.
        let raw = 0xFFFFF;
        let value = widen_to_i64(raw, SampleType::SignedInt { bits: 20 });
        assert_eq!(value, -1);
    }

    #[test]
    fn signed_round_trip_through_pack_unpack() {
        let sample_type = SampleType::SignedInt { bits: 18 };
        for value in [-1i64, 0, 42, -131072, 131071] {
            let raw = narrow_from_i64(value, sample_type);
            assert_eq!(widen_to_i64(raw, sample_type), value);
        }
    }

    #[test]
    fn f16_round_trips_through_half_crate() {
        let sample_type = SampleType::Float { bits: 16 };
        let raw = narrow_from_f64(1.5, sample_type);
        assert_eq!(widen_to_f64(raw, sample_type), 1.5);
    }

    #[test]
    fn f24_round_trips_representable_values() {
        let sample_type = SampleType::Float { bits: 24 };
        for value in [0.0, 1.0, -2.5, 100.0] {
            let raw = narrow_from_f64(value, sample_type);
            let decoded = widen_to_f64(raw, sample_type);
            assert!((decoded - value).abs() < 1e-3, "{} vs {}", decoded, value);
        }
    }

    #[test]
    fn scale_unsigned_maps_full_range_endpoints() {
        assert_eq!(scale_unsigned(0, 8, 16), 0);
        assert_eq!(scale_unsigned(255, 8, 16), 65535);
    }

    #[test]
    fn scale_unsigned_identity_when_widths_match() {
        assert_eq!(scale_unsigned(123, 12, 12), 123);
    }
}
