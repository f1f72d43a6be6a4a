//! Integration tests for the room registry: code allocation at scale and
//! per-room locking under concurrent callers.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use streammate_protocol::{
    ConnectionHandle, ContentCategory, DisplayName, ItemId, RoomCode,
};
use streammate_room::{
    ContentProvider, RoomConfig, RoomError, RoomRegistry, StaticContentProvider,
};

// =========================================================================
// Helpers
// =========================================================================

fn movies() -> ContentCategory {
    ContentCategory::parse("movies").unwrap()
}

fn provider() -> Arc<dyn ContentProvider> {
    Arc::new(
        StaticContentProvider::new()
            .with_category(movies(), (1..=20u64).map(ItemId::from)),
    )
}

fn name(s: &str) -> DisplayName {
    DisplayName::parse(s).unwrap()
}

fn create(reg: &RoomRegistry, host: &str, conn: u64) -> RoomCode {
    let (snapshot, _) = reg
        .create_room(name(host), movies(), ConnectionHandle::new(conn))
        .unwrap();
    snapshot.room_code
}

// =========================================================================
// Code allocation
// =========================================================================

#[test]
fn test_create_10_000_rooms_yields_distinct_codes() {
    let reg = RoomRegistry::new(RoomConfig::default(), provider()).unwrap();

    let mut codes = HashSet::new();
    for i in 0..10_000u64 {
        let code = create(&reg, "host", i);
        assert!(codes.insert(code), "duplicate code surfaced");
    }

    assert_eq!(codes.len(), 10_000);
    assert_eq!(reg.room_count(), 10_000);
}

#[test]
fn test_small_code_space_retries_collisions_transparently() {
    // 36 possible codes, 20 rooms: collisions happen internally but every
    // creation that succeeds must still get a fresh code.
    let reg = RoomRegistry::new(
        RoomConfig {
            code_length: 1,
            max_code_attempts: 200,
            ..RoomConfig::default()
        },
        provider(),
    )
    .unwrap();

    let mut codes = HashSet::new();
    for i in 0..20u64 {
        assert!(codes.insert(create(&reg, "host", i)));
    }
    assert_eq!(reg.room_count(), 20);
}

#[test]
fn test_generated_codes_use_configured_shape() {
    let reg = RoomRegistry::new(
        RoomConfig {
            code_length: 4,
            code_alphabet: "XYZ".into(),
            ..RoomConfig::default()
        },
        provider(),
    )
    .unwrap();

    let code = create(&reg, "host", 1);

    assert_eq!(code.as_str().len(), 4);
    assert!(code.as_str().chars().all(|c| "XYZ".contains(c)));
}

#[test]
fn test_concurrent_creation_never_duplicates_codes() {
    let reg = Arc::new(RoomRegistry::new(RoomConfig::default(), provider()).unwrap());

    let all: Vec<RoomCode> = thread::scope(|s| {
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let reg = Arc::clone(&reg);
                s.spawn(move || {
                    (0..250u64)
                        .map(|i| create(&reg, "host", t * 1_000 + i))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<_> = all.iter().cloned().collect();
    assert_eq!(unique.len(), 2_000);
    assert_eq!(reg.room_count(), 2_000);
}

// =========================================================================
// Room lock
// =========================================================================

#[test]
fn test_with_room_serializes_mutations_on_one_room() {
    let reg = Arc::new(RoomRegistry::new(RoomConfig::default(), provider()).unwrap());
    let code = create(&reg, "host", 0);

    thread::scope(|s| {
        for t in 0..8u64 {
            let reg = Arc::clone(&reg);
            let code = code.clone();
            s.spawn(move || {
                for i in 0..50u64 {
                    let n = t * 100 + i;
                    reg.with_room(&code, |room| {
                        room.admit(
                            name(&format!("guest{n}")),
                            ConnectionHandle::new(n + 1),
                        );
                        Ok(())
                    })
                    .unwrap();
                }
            });
        }
    });

    let members = reg
        .with_room(&code, |room| Ok(room.member_ids()))
        .unwrap();
    assert_eq!(members.len(), 1 + 8 * 50, "no admission lost");
}

#[test]
fn test_operations_on_destroyed_room_return_not_found() {
    let reg = RoomRegistry::new(RoomConfig::default(), provider()).unwrap();
    let code = create(&reg, "host", 1);

    reg.with_room(&code, |room| {
        let id = room.members()[0].id;
        room.remove_member(id);
        Ok(())
    })
    .unwrap();

    assert!(matches!(
        reg.with_room(&code, |_| Ok(())),
        Err(RoomError::NotFound(c)) if c == code
    ));
    assert!(reg.room_codes().is_empty());
}
