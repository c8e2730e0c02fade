//! Archive error types

use crate::serialize_type::{Direction, SerializeType};

/// Result alias used by every transfer
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Error type for archive construction and transfers
///
/// Two classes exist. Configuration errors ([`ArchiveError::is_fatal`]) are
/// caller bugs and are never expected in a correct program. Everything else is
/// a stream error: the bytes were truncated or corrupt, or a value could not be
/// represented on the wire. A stream error leaves the archive position wherever
/// the last successful primitive left it, so the whole pass must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    /// Archive constructed with a serialize type that has no implementation
    #[error("unsupported archive serialize type {0:?}")]
    UnsupportedSerializeType(SerializeType),

    /// Pack-only or unpack-only operation used on the other direction
    #[error("operation requires a {expected:?} archive")]
    WrongDirection {
        /// Direction the operation needs
        expected: Direction,
    },

    /// Fewer bytes remain than the read requires
    #[error("unexpected end of archive at offset {offset} (needed {needed} bytes, {remaining} remaining)")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// Varint continued past its maximum length
    #[error("malformed varint at offset {0}")]
    MalformedVarint(usize),

    /// Attempted to pack a missing string
    #[error("cannot pack a null string")]
    NullString,

    /// Bool bit buffer already holds the maximum number of values
    #[error("bool bit buffer is full")]
    BoolBufferFull,

    /// Bool byte counts are inconsistent (stored {stored}, consumed {consumed})
    #[error("corrupt bool byte (stored count {stored}, consumed {consumed})")]
    CorruptBoolByte { stored: u8, consumed: u8 },

    /// Patch write targets bytes that were never written
    #[error("patch of {len} bytes at offset {offset} is outside the buffer (length {buffer_len})")]
    PatchOutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },

    /// Length does not fit in the 32-bit length prefix
    #[error("length {0} does not fit in a 32-bit prefix")]
    LengthOverflow(usize),
}

impl ArchiveError {
    /// Configuration errors are caller bugs, not bad input
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSerializeType(_) | Self::WrongDirection { .. }
        )
    }
}
