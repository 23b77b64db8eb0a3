use tracing::info;

use crate::model::*;
use crate::observability::{ROOM_UPDATES_TOTAL, SESSIONS_DETACHED_TOTAL};
use crate::ports::{Clock, PersonLinkage, Store};

use super::placement::{validate_room_date, validate_room_hours};
use super::{Engine, EngineError};

/// Reject candidates that touch a room's identity, contents or type.
pub fn check_room_immutables(current: &Room, candidate: &Room) -> Result<(), EngineError> {
    if candidate.id != current.id {
        return Err(EngineError::bad_input("cannot change id"));
    }
    if candidate.session_ids() != current.session_ids() {
        return Err(EngineError::bad_input(
            "cannot change sessions; place or remove them instead",
        ));
    }
    if candidate.room_type != current.room_type {
        return Err(EngineError::bad_input("cannot change room type"));
    }
    if candidate.capacity != current.capacity {
        return Err(EngineError::bad_input("cannot change capacity"));
    }
    Ok(())
}

impl<S, P, C> Engine<S, P, C>
where
    S: Store,
    P: PersonLinkage,
    C: Clock,
{
    /// Apply a patched `candidate` of `current`.
    ///
    /// Sessions that no longer fit new opening hours are detached and kept as
    /// floating sessions. A new date is pushed down to every kept session.
    /// `Ok(None)` when neither date nor hours changed.
    pub fn update_room(
        &self,
        current: &Room,
        candidate: &Room,
    ) -> Result<Option<Room>, EngineError> {
        let result = self.update_room_inner(current, candidate);
        let outcome = match &result {
            Ok(Some(_)) => "applied",
            Ok(None) => "noop",
            Err(_) => "rejected",
        };
        metrics::counter!(ROOM_UPDATES_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    fn update_room_inner(
        &self,
        current: &Room,
        candidate: &Room,
    ) -> Result<Option<Room>, EngineError> {
        check_room_immutables(current, candidate)?;

        let date_changed = candidate.date != current.date;
        let hours_changed =
            candidate.opening != current.opening || candidate.closing != current.closing;
        if !date_changed && !hours_changed {
            return Ok(None);
        }

        if hours_changed {
            validate_room_hours(candidate.opening, candidate.closing)?;
        }
        if date_changed {
            validate_room_date(candidate.date, self.clock.today())?;
            if let Some(existing) = self
                .store
                .find_room_by_date_and_type(candidate.date, candidate.room_type)
                && existing.id != current.id
            {
                return Err(EngineError::Conflict(format!(
                    "room {} already exists for {} {}",
                    existing.id, candidate.room_type, candidate.date
                )));
            }
        }

        let hours = candidate.hours();
        let mut rebuilt = Room {
            id: current.id,
            date: candidate.date,
            opening: candidate.opening,
            closing: candidate.closing,
            room_type: current.room_type,
            capacity: current.capacity,
            sessions: Vec::with_capacity(current.sessions.len()),
        };

        let mut detached = 0u64;
        for session in &current.sessions {
            let mut session = session.clone();
            if hours_changed && !hours.contains_span(&session.span()) {
                session.room = None;
                self.store.save_session(&session)?;
                info!(
                    "session {} ({}-{}) no longer fits room {}, detached",
                    session.id, session.start, session.end, rebuilt.id
                );
                detached += 1;
                continue;
            }
            if date_changed {
                session.date = candidate.date;
                self.store.save_session(&session)?;
            }
            rebuilt.insert_session(session);
        }

        self.store.save_room(&rebuilt)?;
        if detached > 0 {
            metrics::counter!(SESSIONS_DETACHED_TOTAL).increment(detached);
        }
        Ok(Some(rebuilt))
    }
}
