//! Wire encoding for every primitive an archive can carry
//!
//! ```text
//! Type           | Wire encoding
//! bool           | bit-packed (see bitpack)
//! u8 / i8        | one raw byte
//! u16            | widened to u32, varint
//! i32 / i64      | zigzag, varint
//! u32 / u64      | varint
//! f32            | raw IEEE bits as a u32 varint (not scaled)
//! Vector3        | three f32, X then Y then Z
//! String         | u32 varint byte length, then raw UTF-8 (no terminator)
//! Vec<T>         | u32 varint element count, then each element
//! ```
//!
//! The format is not self-describing. A reader must request the same types in
//! the same order the writer used.

use crate::archive::Archive;
use crate::error::{ArchiveError, Result};
use crate::math::Vector3;
use crate::varint::{zigzag_decode32, zigzag_decode64, zigzag_encode32, zigzag_encode64};

/// A primitive with a fixed wire encoding
///
/// `pack` fails with [`ArchiveError::WrongDirection`] on an unpacking archive
/// and `unpack` on a packing one. Most callers go through
/// [`Archive::write`], [`Archive::read`] or [`Archive::transfer`], which also
/// log failures.
pub trait Transfer: Sized {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()>;
    fn unpack(archive: &mut Archive) -> Result<Self>;
}

impl Transfer for bool {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        archive.pack_bool(*value)
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        archive.unpack_bool()
    }
}

impl Transfer for u8 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        archive.packing_buffer()?.write_u8(*value);
        Ok(())
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        archive.unpacking_buffer()?.read_u8()
    }
}

impl Transfer for i8 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        u8::pack(archive, &(*value as u8))
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        Ok(u8::unpack(archive)? as i8)
    }
}

impl Transfer for u16 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        u32::pack(archive, &u32::from(*value))
    }

    /// Wider values on the wire are truncated to 16 bits
    fn unpack(archive: &mut Archive) -> Result<Self> {
        Ok(u32::unpack(archive)? as u16)
    }
}

impl Transfer for u32 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        archive.packing_buffer()?.write_varint_u32(*value);
        Ok(())
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        archive.unpacking_buffer()?.read_varint_u32()
    }
}

impl Transfer for i32 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        u32::pack(archive, &zigzag_encode32(*value))
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        Ok(zigzag_decode32(u32::unpack(archive)?))
    }
}

impl Transfer for u64 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        archive.packing_buffer()?.write_varint_u64(*value);
        Ok(())
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        archive.unpacking_buffer()?.read_varint_u64()
    }
}

impl Transfer for i64 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        u64::pack(archive, &zigzag_encode64(*value))
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        Ok(zigzag_decode64(u64::unpack(archive)?))
    }
}

impl Transfer for f32 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        u32::pack(archive, &value.to_bits())
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        Ok(f32::from_bits(u32::unpack(archive)?))
    }
}

impl Transfer for Vector3 {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        f32::pack(archive, &value.x)?;
        f32::pack(archive, &value.y)?;
        f32::pack(archive, &value.z)
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        let x = f32::unpack(archive)?;
        let y = f32::unpack(archive)?;
        let z = f32::unpack(archive)?;
        Ok(Vector3::new(x, y, z))
    }
}

impl Transfer for String {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        pack_str(archive, value)
    }

    /// Invalid UTF-8 is replaced rather than rejected
    fn unpack(archive: &mut Archive) -> Result<Self> {
        let len = u32::unpack(archive)? as usize;
        let bytes = archive.unpacking_buffer()?.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// A string that may be missing on the pack side
///
/// Packing `None` fails with [`ArchiveError::NullString`] and writes nothing.
/// Unpacking always produces `Some`.
impl Transfer for Option<String> {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        match value {
            Some(value) => pack_str(archive, value),
            None => Err(ArchiveError::NullString),
        }
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        String::unpack(archive).map(Some)
    }
}

impl<T: Transfer> Transfer for Vec<T> {
    fn pack(archive: &mut Archive, value: &Self) -> Result<()> {
        pack_len(archive, value.len())?;
        for item in value {
            T::pack(archive, item)?;
        }
        Ok(())
    }

    fn unpack(archive: &mut Archive) -> Result<Self> {
        let count = u32::unpack(archive)? as usize;
        // Every element takes at least one byte, except bools which share them
        let capacity = count.min(archive.remaining().saturating_mul(5));
        let mut items = Vec::with_capacity(capacity);
        for _ in 0..count {
            items.push(T::unpack(archive)?);
        }
        Ok(items)
    }
}

pub(crate) fn pack_str(archive: &mut Archive, value: &str) -> Result<()> {
    pack_len(archive, value.len())?;
    archive.packing_buffer()?.write_bytes(value.as_bytes());
    Ok(())
}

pub(crate) fn pack_len(archive: &mut Archive, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| ArchiveError::LengthOverflow(len))?;
    u32::pack(archive, &len)
}
