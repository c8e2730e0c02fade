//! Bool bit-packing
//!
//! Up to five bools share one byte. The high five bits hold the values in
//! the order they were packed, the low three bits hold how many are present.
//!
//! ```text
//! Bits  | Count | Hex  | Values
//! 10000 | 001   | 0x81 | true
//! 00000 | 001   | 0x01 | false
//! 11000 | 010   | 0xC2 | true, true
//! 01000 | 010   | 0x42 | false, true
//! 10100 | 011   | 0xA3 | true, false, true
//! 11111 | 101   | 0xFD | true, true, true, true, true
//! ```
//!
//! When packing, the open byte is rewritten in place after every value. When
//! unpacking, the count field is decremented as values are consumed, and a
//! zero buffered byte means "read the next one from the stream".
//!
//! Both sides keep their scratch state across non-bool transfers. A bool
//! packed after an integer may land in a byte written before that integer,
//! and the reader mirrors this exactly as long as the caller transfers the
//! same types in the same order.

use crate::buffer::ByteBuffer;
use crate::error::{ArchiveError, Result};

/// Number of bools that fit in one byte
pub const MAX_BITS_PER_BYTE: u8 = 5;

const COUNT_MASK: u8 = 0b0000_0111;
const VALUE_MASK: u8 = 0b1111_1000;

/// Add `value` to `bit_buffer`, returning the new count
pub fn encode_bool_into_byte(bit_buffer: &mut u8, value: bool) -> Result<u8> {
    let count = *bit_buffer & COUNT_MASK;
    if count >= MAX_BITS_PER_BYTE {
        return Err(ArchiveError::BoolBufferFull);
    }

    *bit_buffer |= u8::from(value) << (7 - count);
    *bit_buffer = (*bit_buffer & VALUE_MASK) | (count + 1);
    Ok(count + 1)
}

/// Take the next value out of `bit_buffer`, returning it with the count left
pub fn decode_bool_from_byte(bit_buffer: &mut u8, bits_consumed: &mut u8) -> Result<(bool, u8)> {
    let stored = *bit_buffer & COUNT_MASK;
    let consumed = *bits_consumed;

    if stored == 0 || stored > MAX_BITS_PER_BYTE || consumed + stored > MAX_BITS_PER_BYTE {
        return Err(ArchiveError::CorruptBoolByte { stored, consumed });
    }

    let value = *bit_buffer & (0x80 >> consumed) != 0;
    let remaining = stored - 1;
    *bit_buffer = (*bit_buffer & VALUE_MASK) | remaining;
    *bits_consumed += 1;

    Ok((value, remaining))
}

/// Pack-side scratch state
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolPacker {
    /// Offset of the byte still accepting values
    pending_offset: Option<usize>,
}

impl BoolPacker {
    pub fn pending_offset(&self) -> Option<usize> {
        self.pending_offset
    }

    pub fn pack(&mut self, buffer: &mut ByteBuffer, value: bool) -> Result<()> {
        let (mut bit_buffer, open_offset) = match self.pending_offset {
            Some(offset) => {
                let byte = buffer.byte_at(offset)?;
                if byte & COUNT_MASK >= MAX_BITS_PER_BYTE {
                    (0, None)
                } else {
                    (byte, Some(offset))
                }
            }
            None => (0, None),
        };

        let count = encode_bool_into_byte(&mut bit_buffer, value)?;

        let offset = match open_offset {
            Some(offset) => {
                buffer.write_at(offset, &[bit_buffer])?;
                offset
            }
            None => {
                let offset = buffer.position();
                buffer.write_u8(bit_buffer);
                offset
            }
        };

        self.pending_offset = (count < MAX_BITS_PER_BYTE).then_some(offset);
        Ok(())
    }
}

/// Unpack-side scratch state
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolUnpacker {
    /// Byte currently being drained, 0 when none is buffered
    bit_buffer: u8,
    bits_consumed: u8,
}

impl BoolUnpacker {
    pub fn unpack(&mut self, buffer: &mut ByteBuffer) -> Result<bool> {
        if self.bit_buffer == 0 {
            self.bit_buffer = buffer.read_u8()?;
        }

        let (value, remaining) =
            decode_bool_from_byte(&mut self.bit_buffer, &mut self.bits_consumed)?;

        if remaining == 0 {
            self.bit_buffer = 0;
            self.bits_consumed = 0;
        }

        Ok(value)
    }
}
