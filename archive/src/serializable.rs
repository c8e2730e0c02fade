//! Capability implemented by domain types that travel through archives

use crate::archive::Archive;
use crate::error::Result;
use crate::serialize_type::SerializeType;

/// A type that can write itself to and read itself from an [`Archive`]
///
/// `serialize` must issue the same transfers, in the same order, whether the
/// archive is packing or unpacking. Nothing checks this: an asymmetric
/// implementation silently desynchronizes the stream. Use `?` after every
/// transfer so the pass stops at the first failure.
///
/// ```
/// use hydra_archive::{Archive, Result, Serializable};
///
/// #[derive(Default)]
/// struct Destination {
///     region_id: u64,
///     name: String,
///     is_waypoint: bool,
/// }
///
/// impl Serializable for Destination {
///     fn serialize(&mut self, archive: &mut Archive) -> Result<()> {
///         archive.transfer(&mut self.region_id)?;
///         archive.transfer(&mut self.name)?;
///         archive.transfer(&mut self.is_waypoint)
///     }
/// }
/// ```
pub trait Serializable {
    fn serialize(&mut self, archive: &mut Archive) -> Result<()>;
}

/// Pack a whole object into finished archive bytes
///
/// No bytes are returned if any transfer fails.
pub fn pack_object<T: Serializable + ?Sized>(
    serialize_type: SerializeType,
    replication_policy: u64,
    object: &mut T,
) -> Result<Vec<u8>> {
    let mut archive = Archive::new_packing(serialize_type, replication_policy)?;
    archive.transfer_object(object)?;
    archive.into_bytes()
}

/// Unpack a whole object from archive bytes
///
/// A partially read object is never returned.
pub fn unpack_object<T: Serializable + Default>(
    serialize_type: SerializeType,
    bytes: impl Into<Vec<u8>>,
) -> Result<T> {
    let mut archive = Archive::new_unpacking(serialize_type, bytes)?;
    let mut object = T::default();
    if let Err(error) = archive.transfer_object(&mut object) {
        tracing::warn!(
            serialize_type = ?serialize_type,
            object = std::any::type_name::<T>(),
            %error,
            "Deserialize failed"
        );
        return Err(error);
    }
    Ok(object)
}
