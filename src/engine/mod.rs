mod error;
mod factory;
mod ledger;
mod mutations;
pub mod placement;
mod room_update;
mod session_update;
mod store;

pub use error::{EngineError, ErrorKind, PlacementError};
pub use factory::{new_room, new_session};
pub use ledger::{add_member, contains_member, remove_member};
pub use placement::{can_place, remove_placement};
pub use room_update::check_room_immutables;
pub use session_update::check_session_immutables;
pub use store::InMemoryStore;

use ulid::Ulid;

use crate::model::*;
use crate::ports::{Clock, PersonLinkage, Store, SystemClock};

/// Scheduling facade. Owns the collaborators and routes every mutation of
/// rooms and sessions through the placement, ledger and update rules.
///
/// Single writer per call: nothing here locks. Callers serialize concurrent
/// edits to the same room or session.
pub struct Engine<S, P, C = SystemClock> {
    store: S,
    people: P,
    clock: C,
}

impl<S, P, C> Engine<S, P, C>
where
    S: Store,
    P: PersonLinkage,
    C: Clock,
{
    pub fn new(store: S, people: P, clock: C) -> Self {
        Self { store, people, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn people(&self) -> &P {
        &self.people
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn room(&self, id: Ulid) -> Option<Room> {
        self.store.find_room(id)
    }

    pub fn session(&self, id: Ulid) -> Option<Session> {
        self.store.find_session(id)
    }

    fn load_room(&self, id: Ulid) -> Result<Room, EngineError> {
        self.store.find_room(id).ok_or(EngineError::NotFound(id))
    }

    fn load_session(&self, id: Ulid) -> Result<Session, EngineError> {
        self.store.find_session(id).ok_or(EngineError::NotFound(id))
    }

    /// Run the placement check, counting rejections by kind.
    fn check_placement(&self, room: &Room, session: &Session) -> Result<(), EngineError> {
        placement::can_place(room, session).map_err(|e| {
            tracing::debug!("session {} rejected by room {}: {e}", session.id, room.id);
            metrics::counter!(crate::observability::PLACEMENT_REJECTIONS_TOTAL, "kind" => e.label())
                .increment(1);
            EngineError::from(e)
        })
    }
}
