use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;
use serde_json::{json, Value};
use ulid::Ulid;

use roombook::engine::{Engine, EngineError, ErrorKind, InMemoryStore, PlacementError};
use roombook::model::{Room, RoomType, Session};
use roombook::people::PersonRegistry;
use roombook::ports::{FixedClock, RoomLookup};

// ── Test infrastructure ──────────────────────────────────────

type TestEngine = Engine<InMemoryStore, PersonRegistry, FixedClock>;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn engine() -> TestEngine {
    let now = date("2031-05-01").and_time(t(7, 0));
    Engine::new(InMemoryStore::new(), PersonRegistry::new(), FixedClock(now))
}

/// Stand-in for an external patch step: merge `patch` into the serialized
/// entity and read the result back as a candidate of the same shape.
fn patched<T>(current: &T, patch: Value) -> T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let mut doc = serde_json::to_value(current).unwrap();
    let (Value::Object(target), Value::Object(fields)) = (&mut doc, patch) else {
        panic!("patch and entity must both be objects");
    };
    for (k, v) in fields {
        target.insert(k, v);
    }
    serde_json::from_value(doc).unwrap()
}

fn air_room(engine: &TestEngine) -> Room {
    engine
        .create_room(date("2031-05-10"), RoomType::Air, t(8, 0), t(20, 0))
        .unwrap()
}

fn placed_session(engine: &TestEngine, room: &Room, start: NaiveTime, minutes: u32) -> Session {
    let s = engine
        .create_session(room.date, room.room_type, start, minutes)
        .unwrap();
    engine.place_session(room.id, s.id).unwrap()
}

// ── Scenarios ────────────────────────────────────────────────

#[test]
fn scenario_a_back_to_back_session_fits() {
    let engine = engine();
    let room = air_room(&engine);
    placed_session(&engine, &room, t(10, 0), 120);

    let next = placed_session(&engine, &room, t(12, 0), 120);
    assert_eq!(next.room, Some(room.id));
    assert_eq!(engine.room(room.id).unwrap().sessions.len(), 2);
}

#[test]
fn scenario_b_overlap_is_a_time_conflict() {
    let engine = engine();
    let room = air_room(&engine);
    let existing = placed_session(&engine, &room, t(10, 0), 120);

    let s = engine
        .create_session(room.date, RoomType::Air, t(9, 0), 240)
        .unwrap();
    let e = engine.place_session(room.id, s.id).unwrap_err();
    assert!(matches!(
        e,
        EngineError::Placement(PlacementError::TimeConflict(id)) if id == existing.id
    ));
    assert!(engine.session(s.id).unwrap().is_floating());
}

#[test]
fn scenario_c_last_seat() {
    let engine = engine();
    let room = air_room(&engine);
    let s = placed_session(&engine, &room, t(10, 0), 60);
    for _ in 0..29 {
        assert!(engine.add_member(s.id, Ulid::new()).unwrap());
    }

    assert!(engine.add_member(s.id, Ulid::new()).unwrap());
    let full = engine.session(s.id).unwrap();
    assert_eq!((full.booked, full.free), (30, 0));

    let e = engine.add_member(s.id, Ulid::new()).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Forbidden);
    assert_eq!(engine.session(s.id).unwrap(), full);
}

#[test]
fn scenario_d_relocation_without_room_leaves_session_floating() {
    let engine = engine();
    let room = air_room(&engine);
    let s = placed_session(&engine, &room, t(10, 0), 60);

    let candidate = patched(&s, json!({ "room_type": "Fire", "date": "2031-05-20" }));
    let updated = engine.update_session(&s, &candidate).unwrap().unwrap();

    assert_eq!(updated.room, None);
    assert_eq!(updated.room_type, RoomType::Fire);
    assert_eq!(updated.date, date("2031-05-20"));
    assert_eq!(engine.session(s.id).unwrap(), updated);
    assert!(!engine.room(room.id).unwrap().contains_session(s.id));
}

#[test]
fn scenario_e_id_patch_rejected_first() {
    let engine = engine();
    let room = air_room(&engine);
    let s = placed_session(&engine, &room, t(10, 0), 60);
    let room_before = engine.room(room.id).unwrap();

    let candidate = patched(
        &s,
        json!({ "id": Ulid::new().to_string(), "start": "11:00:00", "booked": 4 }),
    );
    let e = engine.update_session(&s, &candidate).unwrap_err();

    assert_eq!(e.kind(), ErrorKind::BadInput);
    assert!(e.to_string().contains("cannot change id"), "{e}");
    assert_eq!(engine.session(s.id).unwrap(), s);
    assert_eq!(engine.room(room.id).unwrap(), room_before);
}

#[test]
fn patched_end_is_rejected() {
    let engine = engine();
    let room = air_room(&engine);
    let s = placed_session(&engine, &room, t(10, 0), 60);

    let candidate = patched(&s, json!({ "end": "12:00:00" }));
    let e = engine.update_session(&s, &candidate).unwrap_err();
    assert!(e.to_string().contains("pass start and duration"), "{e}");
}

#[test]
fn patched_start_reschedules_and_recomputes_end() {
    let engine = engine();
    let room = air_room(&engine);
    let s = placed_session(&engine, &room, t(10, 0), 60);

    let candidate = patched(&s, json!({ "start": "15:15:00" }));
    let updated = engine.update_session(&s, &candidate).unwrap().unwrap();
    assert_eq!((updated.start, updated.end), (t(15, 15), t(16, 15)));
    assert_eq!(engine.room(room.id).unwrap().sessions, vec![updated]);
}

#[test]
fn room_patch_moves_day_and_drops_misfits() {
    let engine = engine();
    let room = air_room(&engine);
    let keep = placed_session(&engine, &room, t(10, 0), 60);
    let drop = placed_session(&engine, &room, t(19, 0), 60);
    let current = engine.room(room.id).unwrap();

    let candidate = patched(&current, json!({ "date": "2031-05-11", "closing": "18:00:00" }));
    let updated = engine.update_room(&current, &candidate).unwrap().unwrap();

    assert_eq!(updated.session_ids(), [keep.id].into());
    assert_eq!(engine.session(keep.id).unwrap().date, date("2031-05-11"));
    let dropped = engine.session(drop.id).unwrap();
    assert!(dropped.is_floating());
    assert_eq!(dropped.date, date("2031-05-10"));
    assert_eq!(
        engine
            .store()
            .find_room_by_date_and_type(date("2031-05-11"), RoomType::Air)
            .map(|r| r.id),
        Some(room.id)
    );
}

#[test]
fn journal_survives_restart() {
    let dir = std::env::temp_dir().join(format!("roombook_int_test_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("roombook.wal");
    let now = FixedClock(date("2031-05-01").and_time(t(7, 0)));

    let (room_id, session_id, member) = {
        let engine = Engine::new(InMemoryStore::open(&path).unwrap(), PersonRegistry::new(), now);
        let room = air_room(&engine);
        let s = placed_session(&engine, &room, t(10, 0), 60);
        let member = Ulid::new();
        engine.add_member(s.id, member).unwrap();
        (room.id, s.id, member)
    };

    let engine = Engine::new(InMemoryStore::open(&path).unwrap(), PersonRegistry::new(), now);
    let room = engine.room(room_id).unwrap();
    let session = engine.session(session_id).unwrap();
    assert_eq!(session.members, vec![member]);
    assert_eq!(room.sessions, vec![session]);
    let _ = std::fs::remove_dir_all(&dir);
}

// ── Properties ───────────────────────────────────────────────

proptest! {
    #[test]
    fn placed_sessions_never_overlap(
        slots in prop::collection::vec((8u32 * 4..19 * 4, 2u32..12), 1..40)
    ) {
        let engine = engine();
        let room = air_room(&engine);
        for (quarter, quarters) in slots {
            let start = t(quarter / 4, (quarter % 4) * 15);
            let s = engine
                .create_session(room.date, RoomType::Air, start, quarters * 15)
                .unwrap();
            match engine.place_session(room.id, s.id) {
                Ok(_) => {}
                Err(EngineError::Placement(
                    PlacementError::TimeConflict(_) | PlacementError::EndsTooLate { .. },
                )) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        let sessions = engine.room(room.id).unwrap().sessions;
        for (i, a) in sessions.iter().enumerate() {
            for b in &sessions[i + 1..] {
                prop_assert!(a.end <= b.start || b.end <= a.start, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn free_tracks_booked(adds in 0usize..30, removes in 0usize..30) {
        let engine = engine();
        let s = engine
            .create_session(date("2031-05-10"), RoomType::Water, t(10, 0), 60)
            .unwrap();
        let mut members = Vec::new();
        for _ in 0..adds {
            let m = Ulid::new();
            if engine.add_member(s.id, m).is_ok() {
                members.push(m);
            }
            let cur = engine.session(s.id).unwrap();
            prop_assert_eq!(cur.free, RoomType::Water.capacity() - cur.booked);
        }
        for m in members.iter().take(removes) {
            engine.remove_member(s.id, *m).unwrap();
            let cur = engine.session(s.id).unwrap();
            prop_assert_eq!(cur.free, RoomType::Water.capacity() - cur.booked);
        }
        let cur = engine.session(s.id).unwrap();
        prop_assert_eq!(cur.booked as usize, members.len().min(25) - removes.min(members.len()));
    }
}
