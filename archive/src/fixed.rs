//! Fixed-precision float encoding
//!
//! A float is multiplied by `1 << precision`, truncated toward zero and sent
//! as a zigzag varint. Negative precision means no scaling. Decoding divides
//! by the same scale, so the round-trip error is below `1 / scale`.

use crate::varint::{zigzag_decode32, zigzag_encode32};

/// Scale factor for a precision (shift count)
#[inline]
pub fn scale(precision: i32) -> f32 {
    match u32::try_from(precision) {
        Ok(shift) if shift < 31 => (1u32 << shift) as f32,
        // Larger shifts overflow the 32-bit scaled value
        Ok(_) => (1u64 << 31) as f32,
        Err(_) => 1.0,
    }
}

/// Encode a float at `precision` into its wire integer
///
/// The float-to-int cast saturates: values outside the `i32` range clamp to
/// its ends and NaN encodes as zero.
#[inline]
pub fn encode_fixed(value: f32, precision: i32) -> u32 {
    zigzag_encode32((value * scale(precision)) as i32)
}

/// Decode a wire integer back to a float at `precision`
#[inline]
pub fn decode_fixed(encoded: u32, precision: i32) -> f32 {
    zigzag_decode32(encoded) as f32 / scale(precision)
}
