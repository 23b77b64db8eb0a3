use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::EngineError;

/// Kind of room. Each kind carries a fixed seat limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoomType {
    Air,
    Water,
    Earth,
    Fire,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [
        RoomType::Air,
        RoomType::Water,
        RoomType::Earth,
        RoomType::Fire,
    ];

    /// Max seats for a session of this type.
    pub const fn capacity(self) -> u32 {
        match self {
            RoomType::Air => 30,
            RoomType::Water => 25,
            RoomType::Earth => 40,
            RoomType::Fire => 20,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RoomType::Air => "AIR",
            RoomType::Water => "WATER",
            RoomType::Earth => "EARTH",
            RoomType::Fire => "FIRE",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoomType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        RoomType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| EngineError::BadInput(format!("unknown room type: {trimmed:?}")))
    }
}

/// Half-open time-of-day interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSpan {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Strict overlap. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &TimeSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// `start + minutes`, or `None` if the result would pass midnight.
pub fn end_of(start: NaiveTime, minutes: u32) -> Option<NaiveTime> {
    let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(i64::from(minutes)));
    (wrapped == 0).then_some(end)
}

/// A bookable activity session.
///
/// `end` and `free` are derived values. They are kept as fields so a patched
/// candidate can be compared against the persisted state, but only the
/// constructors and the booking ledger ever write them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Ulid,
    /// Back-reference to the room whose collection holds this session.
    pub room: Option<Ulid>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    /// Length in minutes.
    pub duration: u32,
    pub end: NaiveTime,
    pub room_type: RoomType,
    pub booked: u32,
    pub free: u32,
    pub members: Vec<Ulid>,
}

impl Session {
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }

    /// Seat limit, taken from the session's own type even while floating.
    pub fn capacity(&self) -> u32 {
        self.room_type.capacity()
    }

    /// Seats left, always recomputed from `booked`.
    pub fn free_seats(&self) -> u32 {
        self.capacity().saturating_sub(self.booked)
    }

    pub fn is_floating(&self) -> bool {
        self.room.is_none()
    }

    pub fn contains_member(&self, member: Ulid) -> bool {
        self.members.contains(&member)
    }

    pub fn member_set(&self) -> BTreeSet<Ulid> {
        self.members.iter().copied().collect()
    }
}

/// A room on one calendar day. Owns the sessions placed in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub date: NaiveDate,
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    pub room_type: RoomType,
    pub capacity: u32,
    /// Placed sessions, sorted by `start`.
    pub sessions: Vec<Session>,
}

impl Room {
    pub fn hours(&self) -> TimeSpan {
        TimeSpan::new(self.opening, self.closing)
    }

    /// Insert session maintaining sort order by start.
    pub fn insert_session(&mut self, session: Session) {
        let pos = self
            .sessions
            .binary_search_by_key(&session.start, |s| s.start)
            .unwrap_or_else(|e| e);
        self.sessions.insert(pos, session);
    }

    /// Remove session by id.
    pub fn remove_session(&mut self, id: Ulid) -> Option<Session> {
        let pos = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(pos))
    }

    /// Swap in a fresher copy of an already placed session. No-op if absent.
    pub fn refresh_session(&mut self, session: &Session) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(slot) => {
                *slot = session.clone();
                true
            }
            None => false,
        }
    }

    pub fn contains_session(&self, id: Ulid) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    pub fn session_ids(&self) -> BTreeSet<Ulid> {
        self.sessions.iter().map(|s| s.id).collect()
    }
}

/// Journal record. One entry per persisted change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomSaved { room: Room },
    RoomDeleted { id: Ulid },
    SessionSaved { session: Session },
    SessionDeleted { id: Ulid },
}
