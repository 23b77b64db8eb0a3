use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use ulid::Ulid;

use crate::model::RoomType;

/// Coarse error classes callers map onto their own surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadInput,
    Conflict,
    Forbidden,
    NotFound,
    Internal,
}

/// Why a session may not occupy a room. Checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("session is already placed in room {0}")]
    AlreadyPlaced(Ulid),
    #[error("session type {session} does not match room type {room}")]
    TypeMismatch { session: RoomType, room: RoomType },
    #[error("session date {session} does not match room date {room}")]
    DateMismatch { session: NaiveDate, room: NaiveDate },
    #[error("session starts at {start}, before the room opens at {opening}")]
    StartsTooEarly { start: NaiveTime, opening: NaiveTime },
    #[error("session ends at {end}, after the room closes at {closing}")]
    EndsTooLate { end: NaiveTime, closing: NaiveTime },
    #[error("time conflict with session {0}")]
    TimeConflict(Ulid),
}

impl PlacementError {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PlacementError::AlreadyPlaced(_) => "already_placed",
            PlacementError::TypeMismatch { .. } => "type_mismatch",
            PlacementError::DateMismatch { .. } => "date_mismatch",
            PlacementError::StartsTooEarly { .. } => "starts_too_early",
            PlacementError::EndsTooLate { .. } => "ends_too_late",
            PlacementError::TimeConflict(_) => "time_conflict",
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("placement rejected: {0}")]
    Placement(#[from] PlacementError),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(Ulid),
    #[error("member {0} is not booked on this session")]
    MemberNotFound(Ulid),
    #[error("journal error: {0}")]
    Journal(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::BadInput(_) | EngineError::Placement(_) => ErrorKind::BadInput,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Forbidden(_) => ErrorKind::Forbidden,
            EngineError::NotFound(_) | EngineError::MemberNotFound(_) => ErrorKind::NotFound,
            EngineError::Journal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn bad_input(msg: impl Into<String>) -> Self {
        EngineError::BadInput(msg.into())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Journal(e.to_string())
    }
}
