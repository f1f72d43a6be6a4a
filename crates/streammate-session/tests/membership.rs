//! Integration tests for membership under concurrent callers.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use streammate_protocol::{
    ConnectionHandle, ContentCategory, DisplayName, ItemId, RoomCode,
};
use streammate_room::{RoomConfig, RoomError, RoomRegistry, StaticContentProvider};
use streammate_session::MembershipService;

// =========================================================================
// Helpers
// =========================================================================

fn service() -> Arc<MembershipService> {
    let content = StaticContentProvider::new().with_category(
        ContentCategory::parse("movies").unwrap(),
        (1..=10u64).map(ItemId::from),
    );
    Arc::new(MembershipService::new(Arc::new(
        RoomRegistry::new(RoomConfig::default(), Arc::new(content)).unwrap(),
    )))
}

fn name(s: &str) -> DisplayName {
    DisplayName::parse(s).unwrap()
}

fn create(svc: &MembershipService) -> RoomCode {
    svc.create_room(
        name("host"),
        ContentCategory::parse("movies").unwrap(),
        ConnectionHandle::new(0),
    )
    .unwrap()
    .room_code
}

// =========================================================================
// Concurrent joins
// =========================================================================

#[test]
fn test_concurrent_joins_same_name_exactly_one_wins() {
    let svc = service();
    let code = create(&svc);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (1..=16u64)
            .map(|n| {
                let svc = Arc::clone(&svc);
                let code = code.clone();
                s.spawn(move || {
                    svc.join(&code, name("sam"), ConnectionHandle::new(n), None)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(RoomError::NameTaken(..))))
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(rejected, 15);
    assert_eq!(svc.members(&code).unwrap().len(), 2);
}

#[test]
fn test_concurrent_joins_distinct_names_all_admitted_with_unique_ids() {
    let svc = service();
    let code = create(&svc);

    let ids: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (1..=32u64)
            .map(|n| {
                let svc = Arc::clone(&svc);
                let code = code.clone();
                s.spawn(move || {
                    svc.join(
                        &code,
                        name(&format!("guest{n}")),
                        ConnectionHandle::new(n),
                        None,
                    )
                    .unwrap()
                    .member
                    .id
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 32);
    assert_eq!(svc.members(&code).unwrap().len(), 33);
}

#[test]
fn test_join_racing_last_leave_never_resurrects_room() {
    // Either the join lands first (room survives with the joiner) or the
    // leave does (join sees NotFound). Never an empty live room.
    for _ in 0..50 {
        let svc = service();
        let admission = svc
            .create_room(
                name("host"),
                ContentCategory::parse("movies").unwrap(),
                ConnectionHandle::new(0),
            )
            .unwrap();
        let code = admission.room_code.clone();
        let host_id = admission.member.id;

        let join = thread::scope(|s| {
            let leaver = {
                let svc = Arc::clone(&svc);
                let code = code.clone();
                s.spawn(move || svc.leave(&code, host_id))
            };
            let joiner = {
                let svc = Arc::clone(&svc);
                let code = code.clone();
                s.spawn(move || {
                    svc.join(&code, name("late"), ConnectionHandle::new(1), None)
                })
            };
            leaver.join().unwrap().unwrap();
            joiner.join().unwrap()
        });

        match join {
            Ok(_) => assert_eq!(svc.members(&code).unwrap().len(), 1),
            Err(RoomError::NotFound(_)) => {
                assert_eq!(svc.registry().room_count(), 0)
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
