use chrono::{NaiveDate, NaiveTime};

use crate::limits::{max_closing, min_opening};
use crate::model::*;

use super::{EngineError, PlacementError};

/// Decide whether `session` may occupy `room`. First failing rule wins.
///
/// Pure: on success the caller appends the session and sets its back-reference.
pub fn can_place(room: &Room, session: &Session) -> Result<(), PlacementError> {
    if let Some(current) = session.room {
        return Err(PlacementError::AlreadyPlaced(current));
    }
    if session.room_type != room.room_type {
        return Err(PlacementError::TypeMismatch {
            session: session.room_type,
            room: room.room_type,
        });
    }
    if session.date != room.date {
        return Err(PlacementError::DateMismatch {
            session: session.date,
            room: room.date,
        });
    }
    if session.start < room.opening {
        return Err(PlacementError::StartsTooEarly {
            start: session.start,
            opening: room.opening,
        });
    }
    if session.end > room.closing {
        return Err(PlacementError::EndsTooLate {
            end: session.end,
            closing: room.closing,
        });
    }

    let span = session.span();
    // Linear scan: a room holds a day's worth of sessions at most.
    if let Some(existing) = room.sessions.iter().find(|s| s.span().overlaps(&span)) {
        return Err(PlacementError::TimeConflict(existing.id));
    }
    Ok(())
}

/// Take `session` out of `room`. Returns false, touching nothing, if the
/// room does not hold it.
pub fn remove_placement(room: &mut Room, session: &mut Session) -> bool {
    if room.remove_session(session.id).is_none() {
        return false;
    }
    session.room = None;
    true
}

pub(crate) fn validate_room_hours(
    opening: NaiveTime,
    closing: NaiveTime,
) -> Result<(), EngineError> {
    if opening < min_opening() {
        return Err(EngineError::bad_input(format!(
            "opening {opening} is earlier than {}",
            min_opening()
        )));
    }
    if closing > max_closing() {
        return Err(EngineError::bad_input(format!(
            "closing {closing} is later than {}",
            max_closing()
        )));
    }
    if opening >= closing {
        return Err(EngineError::bad_input(format!(
            "opening {opening} must be before closing {closing}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_room_date(date: NaiveDate, today: NaiveDate) -> Result<(), EngineError> {
    if date < today {
        return Err(EngineError::bad_input(format!("room date {date} is in the past")));
    }
    Ok(())
}
