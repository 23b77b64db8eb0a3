use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::warn;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::ports::Clock;

use super::placement::{validate_room_date, validate_room_hours};
use super::EngineError;

/// Build a fresh, unplaced session with no bookings.
///
/// Past dates are moved to today rather than rejected.
pub fn new_session<C: Clock + ?Sized>(
    clock: &C,
    date: NaiveDate,
    room_type: RoomType,
    start: NaiveTime,
    duration: u32,
) -> Result<Session, EngineError> {
    let now = clock.now();
    let today = now.date();
    let date = if date < today {
        warn!("session date {date} is in the past, moving it to {today}");
        today
    } else {
        date
    };

    if date == today {
        let time = now.time();
        // Checked first so the advance margin below cannot wrap past midnight.
        if time > latest_reservation() {
            return Err(EngineError::bad_input(format!(
                "no more reservations for today after {}",
                latest_reservation()
            )));
        }
        let earliest = time + Duration::minutes(i64::from(RESERVE_IN_ADVANCE_MINUTES));
        if start < earliest {
            return Err(EngineError::bad_input(format!(
                "must reserve {RESERVE_IN_ADVANCE_MINUTES} minutes in advance"
            )));
        }
    }

    if duration < MIN_DURATION_MINUTES {
        return Err(EngineError::bad_input(format!(
            "duration must be at least {MIN_DURATION_MINUTES} minutes, got {duration}"
        )));
    }

    let end = end_of(start, duration)
        .filter(|end| *end <= latest_session_ending())
        .ok_or_else(|| {
            EngineError::bad_input(format!(
                "session must end by {}",
                latest_session_ending()
            ))
        })?;

    Ok(Session {
        id: Ulid::new(),
        room: None,
        date,
        start,
        duration,
        end,
        room_type,
        booked: 0,
        free: room_type.capacity(),
        members: Vec::new(),
    })
}

/// Re-run creation rules over `candidate`'s schedule fields, keeping the
/// identity and bookings of `current`. The result is always unplaced.
pub(crate) fn rebuild_session<C: Clock + ?Sized>(
    clock: &C,
    current: &Session,
    candidate: &Session,
) -> Result<Session, EngineError> {
    let mut rebuilt = new_session(
        clock,
        candidate.date,
        candidate.room_type,
        candidate.start,
        candidate.duration,
    )?;
    rebuilt.id = current.id;
    rebuilt.members = current.members.clone();
    rebuilt.booked = current.booked;
    rebuilt.free = rebuilt.free_seats();
    Ok(rebuilt)
}

/// Build an empty room. Unlike sessions, past dates are rejected.
pub fn new_room<C: Clock + ?Sized>(
    clock: &C,
    date: NaiveDate,
    room_type: RoomType,
    opening: NaiveTime,
    closing: NaiveTime,
) -> Result<Room, EngineError> {
    validate_room_date(date, clock.today())?;
    validate_room_hours(opening, closing)?;
    Ok(Room {
        id: Ulid::new(),
        date,
        opening,
        closing,
        room_type,
        capacity: room_type.capacity(),
        sessions: Vec::new(),
    })
}
