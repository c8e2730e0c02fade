//! Domain-shaped objects archived through the `Serializable` capability

use std::fs;
use std::thread;

use hydra_archive::{
    Archive, ArchiveError, Orientation, Result, Serializable, SerializeType, Vector3, pack_object,
    unpack_object,
};

/// Replication policy bit for fields only the owning client may see
const POLICY_OWNER: u64 = 0x20;

const POSITION_PRECISION: i32 = 3;
const ORIENTATION_PRECISION: i32 = 6;

#[derive(Debug, Default, Clone, PartialEq)]
struct Destination {
    region_id: u64,
    area_id: u64,
    target_name: String,
    entity_id: u32,
    is_waypoint: bool,
}

impl Serializable for Destination {
    fn serialize(&mut self, archive: &mut Archive) -> Result<()> {
        archive.transfer(&mut self.region_id)?;
        archive.transfer(&mut self.area_id)?;
        archive.transfer(&mut self.target_name)?;
        archive.transfer(&mut self.entity_id)?;
        archive.transfer(&mut self.is_waypoint)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Transition {
    transition_name: String,
    destinations: Vec<Destination>,
}

impl Serializable for Transition {
    fn serialize(&mut self, archive: &mut Archive) -> Result<()> {
        archive.transfer(&mut self.transition_name)?;
        archive.transfer_list(&mut self.destinations)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Avatar {
    entity_id: u64,
    level: u16,
    health: i32,
    position: Vector3,
    orientation: Orientation,
    is_dead: bool,
    is_in_party: bool,
    /// Only replicated to the owner
    credits: i64,
    power_ranks: Vec<u32>,
    home: Transition,
}

impl Serializable for Avatar {
    fn serialize(&mut self, archive: &mut Archive) -> Result<()> {
        archive.transfer(&mut self.entity_id)?;
        archive.transfer(&mut self.level)?;
        archive.transfer(&mut self.health)?;
        archive.transfer_vector_fixed(&mut self.position, POSITION_PRECISION)?;
        archive.transfer_orientation_fixed(&mut self.orientation, true, ORIENTATION_PRECISION)?;
        archive.transfer(&mut self.is_dead)?;
        archive.transfer(&mut self.is_in_party)?;

        if archive.is_persistent() || archive.replication_policy() & POLICY_OWNER != 0 {
            archive.transfer(&mut self.credits)?;
        }

        // Count is patched in after the ranks, the way property collections do it
        if archive.is_packing() {
            let slot = archive.reserve_unencoded_u32()?;
            let mut count = 0u32;
            for rank in &self.power_ranks {
                archive.write(rank)?;
                count += 1;
            }
            archive.patch_unencoded_u32(slot, count)?;
        } else {
            let count = archive.read_unencoded_u32()?;
            self.power_ranks = (0..count)
                .map(|_| archive.read::<u32>())
                .collect::<Result<_>>()?;
        }

        archive.transfer_object(&mut self.home)
    }
}

fn sample_avatar() -> Avatar {
    Avatar {
        entity_id: 0x0100_0000_0000_2A2A,
        level: 60,
        health: -12,
        position: Vector3::new(1024.5, -33.25, 7.0),
        orientation: Orientation::from_yaw(1.5),
        is_dead: false,
        is_in_party: true,
        credits: 1_500_000,
        power_ranks: vec![1, 5, 20, 0],
        home: Transition {
            transition_name: "Avengers Tower".to_string(),
            destinations: vec![
                Destination {
                    region_id: 15322252936284737788,
                    area_id: 4,
                    target_name: "Hub".to_string(),
                    entity_id: 9,
                    is_waypoint: true,
                },
                Destination {
                    region_id: 10137590415717831231,
                    area_id: 0,
                    target_name: String::new(),
                    entity_id: 0,
                    is_waypoint: false,
                },
            ],
        },
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_database_roundtrip() {
    init_logging();
    let mut avatar = sample_avatar();

    let bytes = pack_object(SerializeType::Database, 0, &mut avatar).unwrap();
    let decoded: Avatar = unpack_object(SerializeType::Database, bytes).unwrap();

    assert_eq!(decoded, avatar);
}

#[test]
fn test_replication_policy_filters_fields() {
    init_logging();
    let mut avatar = sample_avatar();

    let owner = pack_object(SerializeType::Replication, POLICY_OWNER, &mut avatar).unwrap();
    let public = pack_object(SerializeType::Replication, 0, &mut avatar).unwrap();
    assert!(public.len() < owner.len());

    let decoded: Avatar = unpack_object(SerializeType::Replication, owner).unwrap();
    assert_eq!(decoded.credits, avatar.credits);

    let decoded: Avatar = unpack_object(SerializeType::Replication, public).unwrap();
    assert_eq!(decoded.credits, 0);
    assert_eq!(decoded.home, avatar.home);
    assert_eq!(decoded.power_ranks, avatar.power_ranks);
}

#[test]
fn test_nested_list_of_objects() {
    let mut transition = sample_avatar().home;
    let bytes = pack_object(SerializeType::Database, 0, &mut transition).unwrap();

    let mut archive = Archive::new_unpacking(SerializeType::Database, bytes).unwrap();
    let mut decoded = Transition {
        transition_name: "stale".to_string(),
        destinations: vec![Destination::default(); 5],
    };
    archive.transfer_object(&mut decoded).unwrap();

    // Unpacking replaces the list instead of appending to it
    assert_eq!(decoded, transition);
    assert_eq!(archive.remaining(), 0);
}

#[test]
fn test_truncated_object_is_rejected() {
    init_logging();
    let mut avatar = sample_avatar();
    let bytes = pack_object(SerializeType::Database, 0, &mut avatar).unwrap();

    for len in [1, bytes.len() / 2, bytes.len() - 1] {
        let result: Result<Avatar> = unpack_object(SerializeType::Database, &bytes[..len]);
        assert!(
            matches!(result, Err(ArchiveError::UnexpectedEof { .. })),
            "prefix of {len} bytes"
        );
    }
}

#[test]
fn test_wrong_channel_is_fatal() {
    let mut avatar = sample_avatar();
    let err = pack_object(SerializeType::Migration, 0, &mut avatar).unwrap_err();
    assert!(err.is_fatal());

    let err = unpack_object::<Avatar>(SerializeType::Disk, Vec::new()).unwrap_err();
    assert_eq!(err, ArchiveError::UnsupportedSerializeType(SerializeType::Disk));
}

#[test]
fn test_persist_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar.bin");

    let mut avatar = sample_avatar();
    let bytes = pack_object(SerializeType::Database, 0, &mut avatar).unwrap();
    fs::write(&path, &bytes).unwrap();

    let loaded = fs::read(&path).unwrap();
    let decoded: Avatar = unpack_object(SerializeType::Database, loaded).unwrap();
    assert_eq!(decoded, avatar);
}

#[test]
fn test_independent_archives_across_threads() {
    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            thread::spawn(move || {
                let mut avatar = sample_avatar();
                avatar.entity_id = i;
                avatar.is_dead = i % 2 == 0;
                let bytes = pack_object(SerializeType::Replication, POLICY_OWNER, &mut avatar)?;
                let decoded: Avatar = unpack_object(SerializeType::Replication, bytes)?;
                Ok::<_, ArchiveError>((avatar, decoded))
            })
        })
        .collect();

    for handle in handles {
        let (avatar, decoded) = handle.join().unwrap().unwrap();
        assert_eq!(decoded, avatar);
    }
}
