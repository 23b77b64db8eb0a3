use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};
use ulid::Ulid;

use crate::model::*;
use crate::observability::*;
use crate::ports::{Clock, PersonLinkage, Store};

use super::{factory, ledger, placement, Engine, EngineError};

impl<S, P, C> Engine<S, P, C>
where
    S: Store,
    P: PersonLinkage,
    C: Clock,
{
    pub fn create_room(
        &self,
        date: NaiveDate,
        room_type: RoomType,
        opening: NaiveTime,
        closing: NaiveTime,
    ) -> Result<Room, EngineError> {
        let room = factory::new_room(&self.clock, date, room_type, opening, closing)?;
        if let Some(existing) = self.store.find_room_by_date_and_type(date, room_type) {
            return Err(EngineError::Conflict(format!(
                "room {} already exists for {room_type} {date}",
                existing.id
            )));
        }
        self.store.save_room(&room)?;
        info!("room {} created: {room_type} {date} {opening}-{closing}", room.id);
        Ok(room)
    }

    pub fn create_session(
        &self,
        date: NaiveDate,
        room_type: RoomType,
        start: NaiveTime,
        duration: u32,
    ) -> Result<Session, EngineError> {
        let session = factory::new_session(&self.clock, date, room_type, start, duration)?;
        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Put a floating session into a room.
    pub fn place_session(&self, room_id: Ulid, session_id: Ulid) -> Result<Session, EngineError> {
        let mut room = self.load_room(room_id)?;
        let mut session = self.load_session(session_id)?;
        self.check_placement(&room, &session)?;

        session.room = Some(room.id);
        room.insert_session(session.clone());
        self.store.save_room(&room)?;
        self.store.save_session(&session)?;
        metrics::counter!(PLACEMENTS_TOTAL).increment(1);
        info!(
            "session {} placed in room {} at {}-{}",
            session.id, room.id, session.start, session.end
        );
        Ok(session)
    }

    /// Take a session out of its room. `false` if it was not placed.
    pub fn unplace_session(&self, session_id: Ulid) -> Result<bool, EngineError> {
        let mut session = self.load_session(session_id)?;
        let Some(room_id) = session.room else {
            return Ok(false);
        };
        let mut room = self.load_room(room_id)?;
        if !placement::remove_placement(&mut room, &mut session) {
            return Ok(false);
        }
        self.store.save_room(&room)?;
        self.store.save_session(&session)?;
        Ok(true)
    }

    /// Delete a session, releasing its room slot and every member link.
    pub fn delete_session(&self, session_id: Ulid) -> Result<(), EngineError> {
        let session = self.load_session(session_id)?;
        if let Some(room_id) = session.room
            && let Some(mut room) = self.store.find_room(room_id)
            && room.remove_session(session.id).is_some()
        {
            self.store.save_room(&room)?;
        }
        for member in &session.members {
            if !self.people.remove_session_from_person(*member, &session) {
                warn!("member {member} had no link to deleted session {}", session.id);
            }
        }
        self.store.delete_session(session.id)?;
        info!("session {} deleted", session.id);
        Ok(())
    }

    /// Delete a room. Its sessions survive as floating sessions.
    pub fn delete_room(&self, room_id: Ulid) -> Result<(), EngineError> {
        let room = self.load_room(room_id)?;
        for session in &room.sessions {
            let mut session = session.clone();
            session.room = None;
            self.store.save_session(&session)?;
        }
        self.store.delete_room(room.id)?;
        info!("room {} deleted, {} sessions detached", room.id, room.sessions.len());
        Ok(())
    }

    /// Book `member` a seat. `Ok(false)` if the person side refused.
    pub fn add_member(&self, session_id: Ulid, member: Ulid) -> Result<bool, EngineError> {
        let mut session = self.load_session(session_id)?;
        match ledger::add_member(&mut session, member, &self.people) {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(e) => {
                metrics::counter!(BOOKING_REJECTIONS_TOTAL).increment(1);
                return Err(e);
            }
        }
        if let Err(e) = self.commit_booking(&session) {
            if !self.people.remove_session_from_person(member, &session) {
                warn!("member {member} keeps a link to unbooked session {}", session.id);
            }
            return Err(e);
        }
        metrics::counter!(BOOKINGS_TOTAL).increment(1);
        Ok(true)
    }

    /// Release `member`'s seat. `Ok(false)` if the person side refused.
    pub fn remove_member(&self, session_id: Ulid, member: Ulid) -> Result<bool, EngineError> {
        let mut session = self.load_session(session_id)?;
        if !ledger::remove_member(&mut session, member, &self.people)? {
            return Ok(false);
        }
        self.commit_booking(&session)?;
        Ok(true)
    }

    /// Persist a booking change, including the copy held by the room.
    fn commit_booking(&self, session: &Session) -> Result<(), EngineError> {
        self.store.save_session(session)?;
        if let Some(room_id) = session.room
            && let Some(mut room) = self.store.find_room(room_id)
            && room.refresh_session(session)
        {
            self.store.save_room(&room)?;
        }
        Ok(())
    }
}
