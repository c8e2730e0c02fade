//! Growable, randomly addressable byte store backing one archive
//!
//! Sequential writes append at the cursor and sequential reads consume from
//! it. Patch writes ([`ByteBuffer::write_at`]) overwrite bytes at an offset
//! that was already written and never move the cursor. They back both the
//! bool bit-pack and the reserve-then-patch pattern for counts that are only
//! known after the body has been written:
//!
//! ```text
//! offset = reserve_u32()      [?? ?? ?? ??][body ...]
//! patch_u32(offset, count)    [cc cc cc cc][body ...]
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ArchiveError, Result};

/// Byte storage with a cursor
#[derive(Debug, Clone, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
    position: usize,
}

impl ByteBuffer {
    /// Create an empty buffer for writing
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            position: 0,
        }
    }

    /// Wrap existing bytes for reading, cursor at the start
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Current cursor offset
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the cursor and the end
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    // ========================================================================
    // Sequential I/O
    // ========================================================================

    /// Write one byte at the cursor
    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    /// Write raw bytes at the cursor, growing the buffer as needed
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        if self.position == self.data.len() {
            self.data.extend_from_slice(bytes);
        } else {
            if end > self.data.len() {
                self.data.resize(end, 0);
            }
            self.data[self.position..end].copy_from_slice(bytes);
        }
        self.position = end;
    }

    /// Read one byte at the cursor
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.position).ok_or_else(|| self.eof(1))?;
        self.position += 1;
        Ok(byte)
    }

    /// Read `len` raw bytes at the cursor
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        if self.remaining() < len {
            return Err(self.eof(len));
        }
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    /// Fill `out` from the cursor
    pub fn read_into(&mut self, out: &mut [u8]) -> Result<()> {
        let bytes = self.read_bytes(out.len())?;
        out.copy_from_slice(bytes);
        Ok(())
    }

    // ========================================================================
    // Random access
    // ========================================================================

    /// Byte at a previously written offset
    pub fn byte_at(&self, offset: usize) -> Result<u8> {
        self.data
            .get(offset)
            .copied()
            .ok_or(ArchiveError::PatchOutOfBounds {
                offset,
                len: 1,
                buffer_len: self.data.len(),
            })
    }

    /// Overwrite bytes at a previously written offset without moving the cursor
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= self.data.len())
            .ok_or(ArchiveError::PatchOutOfBounds {
                offset,
                len: bytes.len(),
                buffer_len: self.data.len(),
            })?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    // ========================================================================
    // Unencoded fixed-width values (little-endian)
    // ========================================================================

    pub fn write_u32_le(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    pub fn write_u64_le(&mut self, value: u64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Reserve 4 zeroed bytes for a count written later, returning their offset
    pub fn reserve_u32(&mut self) -> usize {
        let offset = self.position;
        self.write_u32_le(0);
        offset
    }

    /// Fill a reserved 4-byte slot
    pub fn patch_u32_le(&mut self, offset: usize, value: u32) -> Result<()> {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.write_at(offset, &bytes)
    }

    pub(crate) fn eof(&self, needed: usize) -> ArchiveError {
        ArchiveError::UnexpectedEof {
            offset: self.position,
            needed,
            remaining: self.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_roundtrip() {
        let mut buffer = ByteBuffer::new();
        buffer.write_u8(0xAB);
        buffer.write_bytes(&[1, 2, 3]);
        assert_eq!(buffer.position(), 4);

        let mut reader = ByteBuffer::from_vec(buffer.into_vec());
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let mut reader = ByteBuffer::from_vec(vec![1, 2]);
        assert_eq!(
            reader.read_bytes(3),
            Err(ArchiveError::UnexpectedEof {
                offset: 0,
                needed: 3,
                remaining: 2
            })
        );
        // A failed read consumes nothing
        assert_eq!(reader.position(), 0);

        reader.read_bytes(2).unwrap();
        assert!(matches!(
            reader.read_u8(),
            Err(ArchiveError::UnexpectedEof { offset: 2, .. })
        ));
    }

    #[test]
    fn test_write_at_keeps_cursor() {
        let mut buffer = ByteBuffer::new();
        buffer.write_bytes(&[0, 0, 0]);
        buffer.write_at(1, &[9]).unwrap();
        assert_eq!(buffer.position(), 3);
        assert_eq!(buffer.as_slice(), &[0, 9, 0]);
        assert_eq!(buffer.byte_at(1).unwrap(), 9);
    }

    #[test]
    fn test_write_at_out_of_bounds() {
        let mut buffer = ByteBuffer::new();
        buffer.write_bytes(&[0, 0]);
        assert_eq!(
            buffer.write_at(1, &[1, 2]),
            Err(ArchiveError::PatchOutOfBounds {
                offset: 1,
                len: 2,
                buffer_len: 2
            })
        );
        assert!(buffer.byte_at(2).is_err());
        assert!(buffer.write_at(usize::MAX, &[1]).is_err());
    }

    #[test]
    fn test_unencoded_little_endian() {
        let mut buffer = ByteBuffer::new();
        buffer.write_u32_le(0x0403_0201);
        buffer.write_u64_le(0x0C0B_0A09_0807_0605);
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);

        let mut reader = ByteBuffer::from_vec(buffer.into_vec());
        assert_eq!(reader.read_u32_le().unwrap(), 0x0403_0201);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0C0B_0A09_0807_0605);
        assert!(reader.read_u32_le().is_err());
    }

    #[test]
    fn test_reserve_then_patch() {
        let mut buffer = ByteBuffer::new();
        buffer.write_u8(0xFF);
        let slot = buffer.reserve_u32();
        buffer.write_bytes(&[7, 7, 7]);
        buffer.patch_u32_le(slot, 3).unwrap();

        assert_eq!(slot, 1);
        assert_eq!(buffer.as_slice(), &[0xFF, 3, 0, 0, 0, 7, 7, 7]);
        assert_eq!(buffer.position(), 8);
    }
}
