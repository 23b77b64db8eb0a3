use tracing::{info, warn};

use crate::model::*;
use crate::observability::SESSION_UPDATES_TOTAL;
use crate::ports::{Clock, PersonLinkage, Store};

use super::factory::rebuild_session;
use super::{Engine, EngineError};

/// Reject candidates that touch fields a patch may not set directly.
pub fn check_session_immutables(
    current: &Session,
    candidate: &Session,
) -> Result<(), EngineError> {
    if candidate.id != current.id {
        return Err(EngineError::bad_input("cannot change id"));
    }
    if candidate.member_set() != current.member_set() {
        return Err(EngineError::bad_input(
            "cannot change members; book or release seats instead",
        ));
    }
    if candidate.room != current.room {
        return Err(EngineError::bad_input("cannot directly assign a room"));
    }
    if candidate.end != current.end {
        return Err(EngineError::bad_input(
            "cannot directly set end; pass start and duration",
        ));
    }
    if candidate.booked != current.booked {
        return Err(EngineError::bad_input("cannot directly set booked seats"));
    }
    if candidate.free != current.free {
        return Err(EngineError::bad_input("cannot directly set free seats"));
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
    /// A changed type or date relocates the session; a changed start or
    /// duration reschedules it inside its room. `Ok(None)` means nothing
    /// relevant changed.
    pub fn update_session(
        &self,
        current: &Session,
        candidate: &Session,
    ) -> Result<Option<Session>, EngineError> {
        let result = self.update_session_inner(current, candidate);
        let outcome = match &result {
            Ok(Some(_)) => "applied",
            Ok(None) => "noop",
            Err(_) => "rejected",
        };
        metrics::counter!(SESSION_UPDATES_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    fn update_session_inner(
        &self,
        current: &Session,
        candidate: &Session,
    ) -> Result<Option<Session>, EngineError> {
        check_session_immutables(current, candidate)?;
        if candidate.room_type.capacity() < candidate.booked {
            return Err(EngineError::Forbidden(format!(
                "type {} holds {} seats, below the {} already booked",
                candidate.room_type,
                candidate.room_type.capacity(),
                candidate.booked
            )));
        }

        let relocating =
            candidate.room_type != current.room_type || candidate.date != current.date;
        let rescheduling =
            candidate.start != current.start || candidate.duration != current.duration;

        if relocating {
            self.relocate_session(current, candidate).map(Some)
        } else if rescheduling {
            self.reschedule_session(current, candidate).map(Some)
        } else {
            Ok(None)
        }
    }

    fn relocate_session(
        &self,
        current: &Session,
        candidate: &Session,
    ) -> Result<Session, EngineError> {
        let mut rebuilt = rebuild_session(&self.clock, current, candidate)?;

        let Some(old_room_id) = current.room else {
            self.store.save_session(&rebuilt)?;
            return Ok(rebuilt);
        };
        let mut old_room = self.load_room(old_room_id)?;
        old_room.remove_session(current.id);

        // The rebuilt date may have been clamped; the lookup follows the request.
        match self
            .store
            .find_room_by_date_and_type(candidate.date, candidate.room_type)
        {
            Some(found) => {
                let same_room = found.id == old_room.id;
                let mut destination = if same_room { old_room.clone() } else { found };
                self.check_placement(&destination, &rebuilt)?;

                if !same_room {
                    self.store.save_room(&old_room)?;
                }
                self.store.save_session(&rebuilt)?;
                rebuilt.room = Some(destination.id);
                destination.insert_session(rebuilt.clone());
                self.store.save_room(&destination)?;
                self.store.save_session(&rebuilt)?;
                info!(
                    "session {} moved from room {} to room {}",
                    rebuilt.id, old_room.id, destination.id
                );
            }
            None => {
                warn!(
                    "no {} room on {}; session {} left unattached",
                    candidate.room_type, candidate.date, rebuilt.id
                );
                self.store.save_room(&old_room)?;
                self.store.save_session(&rebuilt)?;
                metrics::counter!(crate::observability::SESSIONS_DETACHED_TOTAL).increment(1);
            }
        }
        Ok(rebuilt)
    }

    fn reschedule_session(
        &self,
        current: &Session,
        candidate: &Session,
    ) -> Result<Session, EngineError> {
        let mut rebuilt = rebuild_session(&self.clock, current, candidate)?;

        let Some(room_id) = current.room else {
            self.store.save_session(&rebuilt)?;
            return Ok(rebuilt);
        };

        // Working copy: on rejection it is dropped and the store stays untouched.
        let mut room = self.load_room(room_id)?;
        room.remove_session(current.id);
        self.check_placement(&room, &rebuilt)?;

        rebuilt.room = Some(room.id);
        room.insert_session(rebuilt.clone());
        self.store.save_room(&room)?;
        self.store.save_session(&rebuilt)?;
        info!(
            "session {} rescheduled to {}-{} in room {}",
            rebuilt.id, rebuilt.start, rebuilt.end, room.id
        );
        Ok(rebuilt)
    }
}
