//! Collaborator seams the scheduling core calls out to.
//!
//! The engines never own storage, member bookkeeping or the wall clock;
//! they reach them through these traits. `InMemoryStore`, `PersonRegistry`
//! and `SystemClock` are the in-crate implementations.

use chrono::{NaiveDate, NaiveDateTime};
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::{Room, RoomType, Session};

/// Entity storage. Calls either complete or return an error; no
/// transactional grouping is assumed across calls.
pub trait Persistence {
    fn save_room(&self, room: &Room) -> Result<(), EngineError>;

    fn save_session(&self, session: &Session) -> Result<(), EngineError>;

    fn delete_room(&self, id: Ulid) -> Result<(), EngineError>;

    fn delete_session(&self, id: Ulid) -> Result<(), EngineError>;

    fn find_room(&self, id: Ulid) -> Option<Room>;

    fn find_session(&self, id: Ulid) -> Option<Session>;
}

/// At most one room exists per (date, type).
pub trait RoomLookup {
    fn find_room_by_date_and_type(&self, date: NaiveDate, room_type: RoomType) -> Option<Room>;
}

/// Everything the engine needs from a store.
pub trait Store: Persistence + RoomLookup {}

impl<T: Persistence + RoomLookup> Store for T {}

/// Reciprocal member → session links, kept outside the session itself.
///
/// Both calls return `false` when nothing changed, which callers treat as a
/// refusal.
pub trait PersonLinkage {
    fn add_session_to_person(&self, session: &Session, member: Ulid) -> bool;

    fn remove_session_from_person(&self, member: Ulid, session: &Session) -> bool;
}

pub trait Clock {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Clock pinned to one instant. Makes time-of-day rules deterministic.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
