//! Archive channel classification, version, and direction

use serde::{Deserialize, Serialize};

/// Channel an archive is produced for
///
/// The serialize type decides the header shape and lets domain code choose
/// which fields are relevant (persistent fields for the database, visible
/// fields for the client, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SerializeType {
    /// Server <-> server
    Migration = 1,
    /// Server <-> database
    Database = 2,
    /// Server <-> client
    Replication = 3,
    /// Server <-> file
    Disk = 4,
}

impl SerializeType {
    pub fn is_migration(self) -> bool {
        self == Self::Migration
    }

    pub fn is_database(self) -> bool {
        self == Self::Database
    }

    pub fn is_replication(self) -> bool {
        self == Self::Replication
    }

    pub fn is_disk(self) -> bool {
        self == Self::Disk
    }

    /// Archive for persistent storage (database or disk)
    pub fn is_persistent(self) -> bool {
        self.is_database() || self.is_disk()
    }

    /// Runtime archive (migration or replication)
    pub fn is_transient(self) -> bool {
        self.is_migration() || self.is_replication()
    }

    /// Archive that is sent to a game client
    pub fn involves_client(self) -> bool {
        self.is_replication()
    }

    /// Disk archives are reserved for an unencoded fast path
    pub fn favor_speed(self) -> bool {
        self.is_disk()
    }

    /// Whether archives of this type can currently be constructed
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Database | Self::Replication)
    }
}

/// Archive format version carried in persistent headers
///
/// Values read from a stream are kept verbatim, including ones this build
/// does not know about, so callers can decide how to handle old data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArchiveVersion(pub u32);

impl ArchiveVersion {
    pub const INVALID: Self = Self(0);
    pub const INITIAL: Self = Self(1);

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ArchiveVersion {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Whether an archive writes or reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Pack,
    Unpack,
}
