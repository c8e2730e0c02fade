//! Varint and zigzag encoding
//!
//! Unsigned values are written as little-endian base-128 groups: 7 payload
//! bits per byte, high bit set on every byte except the last.
//!
//! ```text
//! 300 = 0b1_0010_1100  ->  [1010_1100] [0000_0010]
//!                            ^ more      ^ last
//! ```
//!
//! Signed values go through zigzag first so that small negative numbers stay
//! short: 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...

use crate::buffer::ByteBuffer;
use crate::error::{ArchiveError, Result};

/// Longest encoding of a 32-bit value
pub const MAX_VARINT32_LEN: usize = 5;

/// Longest encoding of a 64-bit value
pub const MAX_VARINT64_LEN: usize = 10;

// ============================================================================
// ZigZag
// ============================================================================

#[inline]
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline]
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[inline]
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

// ============================================================================
// Varint
// ============================================================================

/// Number of bytes `value` occupies as a varint
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

impl ByteBuffer {
    pub fn write_varint_u32(&mut self, value: u32) {
        self.write_varint_u64(u64::from(value));
    }

    pub fn write_varint_u64(&mut self, mut value: u64) {
        let mut bytes = [0u8; MAX_VARINT64_LEN];
        let mut len = 0;
        while value >= 0x80 {
            bytes[len] = (value as u8) | 0x80;
            value >>= 7;
            len += 1;
        }
        bytes[len] = value as u8;
        self.write_bytes(&bytes[..=len]);
    }

    /// Read a 32-bit varint
    ///
    /// Encodings longer than five bytes are accepted up to the 64-bit limit
    /// (a negative `i32` written through a 64-bit path); only the low 32 bits
    /// are kept.
    pub fn read_varint_u32(&mut self) -> Result<u32> {
        let start = self.position();
        let mut result = 0u32;

        for i in 0..MAX_VARINT32_LEN {
            let byte = self.read_u8()?;
            result |= u32::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }

        // Discard the upper half of an overlong encoding
        for _ in MAX_VARINT32_LEN..MAX_VARINT64_LEN {
            if self.read_u8()? & 0x80 == 0 {
                return Ok(result);
            }
        }

        Err(ArchiveError::MalformedVarint(start))
    }

    pub fn read_varint_u64(&mut self) -> Result<u64> {
        let start = self.position();
        let mut result = 0u64;

        for i in 0..MAX_VARINT64_LEN {
            let byte = self.read_u8()?;
            result |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }

        Err(ArchiveError::MalformedVarint(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_u64(value: u64) -> Vec<u8> {
        let mut buffer = ByteBuffer::new();
        buffer.write_varint_u64(value);
        buffer.into_vec()
    }

    #[test]
    fn test_zigzag_known_values() {
        assert_eq!(zigzag_encode32(0), 0);
        assert_eq!(zigzag_encode32(-1), 1);
        assert_eq!(zigzag_encode32(1), 2);
        assert_eq!(zigzag_encode32(-2), 3);
        assert_eq!(zigzag_encode32(-5), 9);
        assert_eq!(zigzag_encode32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag_encode32(i32::MIN), u32::MAX);
        assert_eq!(zigzag_encode64(i64::MIN), u64::MAX);
    }

    #[test]
    fn test_zigzag_inverse() {
        for value in [0, 1, -1, 63, -64, 1000, -1000, i32::MIN, i32::MAX] {
            assert_eq!(zigzag_decode32(zigzag_encode32(value)), value);
        }
        for value in [0, 1, -1, i64::from(i32::MIN) - 1, i64::MIN, i64::MAX] {
            assert_eq!(zigzag_decode64(zigzag_encode64(value)), value);
        }
    }

    #[test]
    fn test_varint_boundaries() {
        let cases: [(u64, usize); 11] = [
            (0, 1),
            (127, 1),
            (128, 2),
            (16383, 2),
            (16384, 3),
            ((1 << 31) - 1, 5),
            (u64::from(u32::MAX), 5),
            ((1 << 35) - 1, 5),
            (1 << 35, 6),
            ((1 << 63) - 1, 9),
            (u64::MAX, 10),
        ];

        for (value, len) in cases {
            let bytes = encode_u64(value);
            assert_eq!(bytes.len(), len, "length of {value}");
            assert_eq!(encoded_len(value), len, "encoded_len of {value}");

            let mut reader = ByteBuffer::from_vec(bytes);
            assert_eq!(reader.read_varint_u64().unwrap(), value);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn test_varint_wire_bytes() {
        assert_eq!(encode_u64(300), vec![0xAC, 0x02]);
        assert_eq!(encode_u64(1), vec![0x01]);
        assert_eq!(encode_u64(128), vec![0x80, 0x01]);
    }

    #[test]
    fn test_varint32_roundtrip() {
        for value in [0, 127, 128, 16383, 16384, i32::MAX as u32, u32::MAX] {
            let mut buffer = ByteBuffer::new();
            buffer.write_varint_u32(value);
            let mut reader = ByteBuffer::from_vec(buffer.into_vec());
            assert_eq!(reader.read_varint_u32().unwrap(), value);
        }
    }

    #[test]
    fn test_varint32_accepts_sign_extended() {
        // -1 as i64 is ten bytes on the wire; the 32-bit reader keeps the low half
        let mut reader = ByteBuffer::from_vec(encode_u64(u64::MAX));
        assert_eq!(reader.read_varint_u32().unwrap(), u32::MAX);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_varint_truncated() {
        let mut reader = ByteBuffer::from_vec(vec![0x80, 0x80]);
        assert!(matches!(
            reader.read_varint_u64(),
            Err(ArchiveError::UnexpectedEof { offset: 2, .. })
        ));

        let mut reader = ByteBuffer::from_vec(vec![]);
        assert!(reader.read_varint_u32().is_err());
    }

    #[test]
    fn test_varint_too_long() {
        let mut reader = ByteBuffer::from_vec(vec![0xFF; 11]);
        assert_eq!(reader.read_varint_u64(), Err(ArchiveError::MalformedVarint(0)));

        let mut reader = ByteBuffer::from_vec(vec![0xFF; 11]);
        assert_eq!(reader.read_varint_u32(), Err(ArchiveError::MalformedVarint(0)));
    }
}
