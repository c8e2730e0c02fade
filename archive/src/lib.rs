//! Hydra Archive - binary codec for game state
//!
//! One [`Archive`] carries the state of a game object graph through one of
//! four channels:
//!
//! - **Migration** - server to server
//! - **Database** - server to database (persistent, versioned)
//! - **Replication** - server to client (filtered by a replication policy)
//! - **Disk** - server to file
//!
//! Only database and replication archives can be constructed today.
//!
//! The stream is compact and not self-describing: integers are varints
//! (zigzag for signed), bools are bit-packed five to a byte, floats can be
//! sent raw or at a fixed precision. Reader and writer must agree on the field
//! order, which domain types encode once by implementing [`Serializable`].
//!
//! # Usage
//!
//! ```
//! use hydra_archive::{Archive, SerializeType};
//!
//! let mut archive = Archive::new_packing(SerializeType::Database, 0)?;
//! archive.write(&-5i32)?;
//! archive.write_str("Hydra")?;
//! archive.write(&true)?;
//! let bytes = archive.into_bytes()?;
//!
//! let mut archive = Archive::new_unpacking(SerializeType::Database, bytes)?;
//! assert_eq!(archive.read::<i32>()?, -5);
//! assert_eq!(archive.read::<String>()?, "Hydra");
//! assert!(archive.read::<bool>()?);
//! # Ok::<(), hydra_archive::ArchiveError>(())
//! ```

mod archive;
mod bitpack;
mod buffer;
mod error;
mod fixed;
mod math;
mod serializable;
mod serialize_type;
mod transfer;
mod varint;

pub use archive::Archive;
pub use bitpack::{
    BoolPacker, BoolUnpacker, MAX_BITS_PER_BYTE, decode_bool_from_byte, encode_bool_into_byte,
};
pub use buffer::ByteBuffer;
pub use error::{ArchiveError, Result};
pub use fixed::{decode_fixed, encode_fixed, scale as fixed_scale};
pub use math::{Orientation, Vector3};
pub use serializable::{Serializable, pack_object, unpack_object};
pub use serialize_type::{ArchiveVersion, Direction, SerializeType};
pub use transfer::Transfer;
pub use varint::{
    MAX_VARINT32_LEN, MAX_VARINT64_LEN, encoded_len as varint_len, zigzag_decode32,
    zigzag_decode64, zigzag_encode32, zigzag_encode64,
};

// =============================================================================
// Constants
// =============================================================================

/// Version written into persistent headers
pub const CURRENT_VERSION: ArchiveVersion = ArchiveVersion::INITIAL;

/// Initial buffer capacity for packing archives
pub const DEFAULT_CAPACITY: usize = 1024;
