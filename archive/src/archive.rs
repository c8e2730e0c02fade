//! Archive context for one pack or unpack pass
//!
//! # Stream layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Header                                               │
//! │   Database / Disk:  version             (u32 varint) │
//! │   Replication:      replication policy  (u64 varint) │
//! │   Migration:        none                             │
//! ├──────────────────────────────────────────────────────┤
//! │ Fields, in whatever order the caller transfers them  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! An archive is created for a single pass and its direction never changes.
//! Domain types describe their layout once in [`Serializable::serialize`] and
//! use [`Archive::transfer`], which writes when packing and reads when
//! unpacking.

use std::any::type_name;

use crate::bitpack::{BoolPacker, BoolUnpacker};
use crate::buffer::ByteBuffer;
use crate::error::{ArchiveError, Result};
use crate::fixed::{decode_fixed, encode_fixed};
use crate::math::{Orientation, Vector3};
use crate::serializable::Serializable;
use crate::serialize_type::{ArchiveVersion, Direction, SerializeType};
use crate::transfer::{Transfer, pack_len, pack_str};
use crate::{CURRENT_VERSION, DEFAULT_CAPACITY};

/// Stateful context mediating one pack or unpack pass
#[derive(Debug)]
pub struct Archive {
    serialize_type: SerializeType,
    direction: Direction,
    version: ArchiveVersion,
    replication_policy: u64,
    buffer: ByteBuffer,
    /// Open bit-pack byte (pack side)
    bool_packer: BoolPacker,
    /// Buffered bit-pack byte (unpack side)
    bool_unpacker: BoolUnpacker,
}

impl Archive {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create an archive for packing and write its header
    ///
    /// `replication_policy` is only written for [`SerializeType::Replication`].
    ///
    /// # Errors
    ///
    /// [`ArchiveError::UnsupportedSerializeType`] unless the type is
    /// `Database` or `Replication`.
    pub fn new_packing(serialize_type: SerializeType, replication_policy: u64) -> Result<Self> {
        check_supported(serialize_type)?;

        let mut archive = Self {
            serialize_type,
            direction: Direction::Pack,
            version: CURRENT_VERSION,
            replication_policy,
            buffer: ByteBuffer::with_capacity(DEFAULT_CAPACITY),
            bool_packer: BoolPacker::default(),
            bool_unpacker: BoolUnpacker::default(),
        };
        archive.write_header()?;
        Ok(archive)
    }

    /// Create an archive over `bytes` for unpacking and read its header
    ///
    /// # Errors
    ///
    /// [`ArchiveError::UnsupportedSerializeType`] unless the type is
    /// `Database` or `Replication`, or a stream error if the header is
    /// truncated or malformed.
    pub fn new_unpacking(serialize_type: SerializeType, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        check_supported(serialize_type)?;

        let mut archive = Self {
            serialize_type,
            direction: Direction::Unpack,
            version: ArchiveVersion::INVALID,
            replication_policy: 0,
            buffer: ByteBuffer::from_vec(bytes.into()),
            bool_packer: BoolPacker::default(),
            bool_unpacker: BoolUnpacker::default(),
        };
        archive.read_header()?;
        Ok(archive)
    }

    fn write_header(&mut self) -> Result<()> {
        if self.serialize_type.is_persistent() {
            let version = self.version.raw();
            self.write(&version)
        } else if self.serialize_type.is_replication() {
            let replication_policy = self.replication_policy;
            self.write(&replication_policy)
        } else {
            Ok(())
        }
    }

    fn read_header(&mut self) -> Result<()> {
        if self.serialize_type.is_persistent() {
            self.version = ArchiveVersion(self.read::<u32>()?);
        } else if self.serialize_type.is_replication() {
            self.replication_policy = self.read::<u64>()?;
        }
        Ok(())
    }

    /// Finished bytes of a packing archive
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.expect_direction(Direction::Pack)?;
        Ok(self.buffer.into_vec())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn serialize_type(&self) -> SerializeType {
        self.serialize_type
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_packing(&self) -> bool {
        self.direction == Direction::Pack
    }

    pub fn is_unpacking(&self) -> bool {
        self.direction == Direction::Unpack
    }

    /// Header version (current version when packing, stream value when unpacking)
    pub fn version(&self) -> ArchiveVersion {
        self.version
    }

    /// Replication policy bitmask (zero outside the replication channel)
    pub fn replication_policy(&self) -> u64 {
        self.replication_policy
    }

    pub fn is_persistent(&self) -> bool {
        self.serialize_type.is_persistent()
    }

    pub fn is_transient(&self) -> bool {
        self.serialize_type.is_transient()
    }

    pub fn involves_client(&self) -> bool {
        self.serialize_type.involves_client()
    }

    pub fn favor_speed(&self) -> bool {
        self.serialize_type.favor_speed()
    }

    /// Cursor offset in the backing buffer
    pub fn current_offset(&self) -> usize {
        self.buffer.position()
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    /// Everything in the backing buffer, header included
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    // ========================================================================
    // Transfer
    // ========================================================================

    /// Write `value` to a packing archive
    pub fn write<T: Transfer>(&mut self, value: &T) -> Result<()> {
        let result = T::pack(self, value);
        self.logged("write", type_name::<T>(), result)
    }

    /// Read a value from an unpacking archive
    pub fn read<T: Transfer>(&mut self) -> Result<T> {
        let result = T::unpack(self);
        self.logged("read", type_name::<T>(), result)
    }

    /// Write `value` when packing, overwrite it with the stream value when unpacking
    ///
    /// On failure `value` is left untouched.
    pub fn transfer<T: Transfer>(&mut self, value: &mut T) -> Result<()> {
        match self.direction {
            Direction::Pack => self.write(&*value),
            Direction::Unpack => {
                *value = self.read()?;
                Ok(())
            }
        }
    }

    /// Write a borrowed string to a packing archive
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        let result = pack_str(self, value);
        self.logged("write", "str", result)
    }

    /// Hand the archive to a domain type's own serialization
    pub fn transfer_object<T: Serializable + ?Sized>(&mut self, value: &mut T) -> Result<()> {
        value.serialize(self)
    }

    /// Transfer a list of domain objects: u32 varint count, then each element
    ///
    /// When unpacking, `list` is replaced with freshly constructed elements.
    pub fn transfer_list<T: Serializable + Default>(&mut self, list: &mut Vec<T>) -> Result<()> {
        match self.direction {
            Direction::Pack => {
                let result = pack_len(self, list.len());
                self.logged("write", "list length", result)?;
                for item in list.iter_mut() {
                    item.serialize(self)?;
                }
            }
            Direction::Unpack => {
                let count = self.read::<u32>()?;
                let mut items = Vec::new();
                for _ in 0..count {
                    let mut item = T::default();
                    item.serialize(self)?;
                    items.push(item);
                }
                *list = items;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Fixed precision
    // ========================================================================

    pub fn write_float_fixed(&mut self, value: f32, precision: i32) -> Result<()> {
        self.write(&encode_fixed(value, precision))
    }

    pub fn read_float_fixed(&mut self, precision: i32) -> Result<f32> {
        Ok(decode_fixed(self.read()?, precision))
    }

    /// Transfer a float scaled by `1 << precision` (unscaled if negative)
    pub fn transfer_float_fixed(&mut self, value: &mut f32, precision: i32) -> Result<()> {
        match self.direction {
            Direction::Pack => self.write_float_fixed(*value, precision),
            Direction::Unpack => {
                *value = self.read_float_fixed(precision)?;
                Ok(())
            }
        }
    }

    pub fn write_vector_fixed(&mut self, value: Vector3, precision: i32) -> Result<()> {
        self.write_float_fixed(value.x, precision)?;
        self.write_float_fixed(value.y, precision)?;
        self.write_float_fixed(value.z, precision)
    }

    pub fn read_vector_fixed(&mut self, precision: i32) -> Result<Vector3> {
        let x = self.read_float_fixed(precision)?;
        let y = self.read_float_fixed(precision)?;
        let z = self.read_float_fixed(precision)?;
        Ok(Vector3::new(x, y, z))
    }

    pub fn transfer_vector_fixed(&mut self, value: &mut Vector3, precision: i32) -> Result<()> {
        match self.direction {
            Direction::Pack => self.write_vector_fixed(*value, precision),
            Direction::Unpack => {
                *value = self.read_vector_fixed(precision)?;
                Ok(())
            }
        }
    }

    /// Write yaw, then pitch and roll unless `yaw_only`
    ///
    /// `yaw_only` is not stored; the reader must pass the same flag.
    pub fn write_orientation_fixed(
        &mut self,
        value: Orientation,
        yaw_only: bool,
        precision: i32,
    ) -> Result<()> {
        self.write_float_fixed(value.yaw, precision)?;
        if !yaw_only {
            self.write_float_fixed(value.pitch, precision)?;
            self.write_float_fixed(value.roll, precision)?;
        }
        Ok(())
    }

    /// Read an orientation; pitch and roll are zero when `yaw_only`
    pub fn read_orientation_fixed(&mut self, yaw_only: bool, precision: i32) -> Result<Orientation> {
        let yaw = self.read_float_fixed(precision)?;
        if yaw_only {
            return Ok(Orientation::from_yaw(yaw));
        }
        let pitch = self.read_float_fixed(precision)?;
        let roll = self.read_float_fixed(precision)?;
        Ok(Orientation::new(yaw, pitch, roll))
    }

    /// Transfer an orientation; with `yaw_only` the existing pitch and roll are kept
    pub fn transfer_orientation_fixed(
        &mut self,
        value: &mut Orientation,
        yaw_only: bool,
        precision: i32,
    ) -> Result<()> {
        match self.direction {
            Direction::Pack => self.write_orientation_fixed(*value, yaw_only, precision),
            Direction::Unpack => {
                let read = self.read_orientation_fixed(yaw_only, precision)?;
                value.yaw = read.yaw;
                if !yaw_only {
                    value.pitch = read.pitch;
                    value.roll = read.roll;
                }
                Ok(())
            }
        }
    }

    // ========================================================================
    // Raw stream I/O
    // ========================================================================

    pub fn write_single_byte(&mut self, value: u8) -> Result<()> {
        self.write(&value)
    }

    pub fn read_single_byte(&mut self) -> Result<u8> {
        self.read()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let result = self.packing_buffer().map(|buffer| buffer.write_bytes(bytes));
        self.logged("write", "bytes", result)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let result = self
            .unpacking_buffer()
            .and_then(|buffer| buffer.read_bytes(len).map(<[u8]>::to_vec));
        self.logged("read", "bytes", result)
    }

    pub fn write_varint_u32(&mut self, value: u32) -> Result<()> {
        self.write(&value)
    }

    pub fn write_varint_u64(&mut self, value: u64) -> Result<()> {
        self.write(&value)
    }

    pub fn read_varint_u32(&mut self) -> Result<u32> {
        self.read()
    }

    pub fn read_varint_u64(&mut self) -> Result<u64> {
        self.read()
    }

    // Unencoded values are reserved for the disk fast path and for counts
    // that are patched in after the body is written.

    pub fn write_unencoded_u32(&mut self, value: u32) -> Result<()> {
        let result = self.packing_buffer().map(|buffer| buffer.write_u32_le(value));
        self.logged("write", "unencoded u32", result)
    }

    pub fn write_unencoded_u64(&mut self, value: u64) -> Result<()> {
        let result = self.packing_buffer().map(|buffer| buffer.write_u64_le(value));
        self.logged("write", "unencoded u64", result)
    }

    pub fn read_unencoded_u32(&mut self) -> Result<u32> {
        let result = self.unpacking_buffer().and_then(ByteBuffer::read_u32_le);
        self.logged("read", "unencoded u32", result)
    }

    pub fn read_unencoded_u64(&mut self) -> Result<u64> {
        let result = self.unpacking_buffer().and_then(ByteBuffer::read_u64_le);
        self.logged("read", "unencoded u64", result)
    }

    /// Reserve a 4-byte unencoded slot, returning its offset for a later patch
    pub fn reserve_unencoded_u32(&mut self) -> Result<usize> {
        let result = self.packing_buffer().map(ByteBuffer::reserve_u32);
        self.logged("write", "reserved u32", result)
    }

    /// Overwrite a previously written 4-byte unencoded slot
    pub fn patch_unencoded_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        let result = self
            .packing_buffer()
            .and_then(|buffer| buffer.patch_u32_le(offset, value));
        self.logged("patch", "unencoded u32", result)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    pub(crate) fn packing_buffer(&mut self) -> Result<&mut ByteBuffer> {
        self.expect_direction(Direction::Pack)?;
        Ok(&mut self.buffer)
    }

    pub(crate) fn unpacking_buffer(&mut self) -> Result<&mut ByteBuffer> {
        self.expect_direction(Direction::Unpack)?;
        Ok(&mut self.buffer)
    }

    pub(crate) fn pack_bool(&mut self, value: bool) -> Result<()> {
        self.expect_direction(Direction::Pack)?;
        self.bool_packer.pack(&mut self.buffer, value)
    }

    pub(crate) fn unpack_bool(&mut self) -> Result<bool> {
        self.expect_direction(Direction::Unpack)?;
        self.bool_unpacker.unpack(&mut self.buffer)
    }

    fn expect_direction(&self, expected: Direction) -> Result<()> {
        if self.direction == expected {
            Ok(())
        } else {
            Err(ArchiveError::WrongDirection { expected })
        }
    }

    fn logged<T>(&self, operation: &str, what: &str, result: Result<T>) -> Result<T> {
        if let Err(error) = &result {
            if error.is_fatal() {
                tracing::error!(
                    serialize_type = ?self.serialize_type,
                    offset = self.buffer.position(),
                    %error,
                    "Archive {} of {} misused",
                    operation,
                    what
                );
            } else {
                tracing::warn!(
                    serialize_type = ?self.serialize_type,
                    offset = self.buffer.position(),
                    %error,
                    "Archive {} of {} failed",
                    operation,
                    what
                );
            }
        }
        result
    }
}

fn check_supported(serialize_type: SerializeType) -> Result<()> {
    if serialize_type.is_supported() {
        Ok(())
    } else {
        tracing::error!(?serialize_type, "Unsupported archive serialize type");
        Err(ArchiveError::UnsupportedSerializeType(serialize_type))
    }
}
