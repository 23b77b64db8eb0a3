use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use dashmap::DashMap;
use tracing::info;
use ulid::Ulid;

use crate::model::*;
use crate::notify::NotifyHub;
use crate::ports::{Persistence, RoomLookup};
use crate::wal::Wal;

use super::EngineError;

/// Concurrent-map backed store with an optional write-ahead journal.
///
/// Every save or delete is journaled (and fsynced) before it is applied in
/// memory, then published on the affected room's change channel.
pub struct InMemoryStore {
    rooms: DashMap<Ulid, Room>,
    sessions: DashMap<Ulid, Session>,
    /// (date, type) → room id
    room_index: DashMap<(NaiveDate, RoomType), Ulid>,
    journal: Option<Mutex<Wal>>,
    notify: Arc<NotifyHub>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Store without a journal. Nothing survives the process.
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            sessions: DashMap::new(),
            room_index: DashMap::new(),
            journal: None,
            notify: Arc::new(NotifyHub::new()),
        }
    }

    /// Replay the journal at `path` (if any) and keep appending to it.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let events = Wal::replay(path)?;
        let mut store = Self::new();
        for event in &events {
            store.apply(event);
        }
        store.journal = Some(Mutex::new(Wal::open(path)?));
        info!(
            "journal {} replayed: {} events, {} rooms, {} sessions",
            path.display(),
            events.len(),
            store.room_count(),
            store.session_count()
        );
        Ok(store)
    }

    pub fn notify(&self) -> &Arc<NotifyHub> {
        &self.notify
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn room_ids(&self) -> Vec<Ulid> {
        self.rooms.iter().map(|e| *e.key()).collect()
    }

    pub fn session_ids(&self) -> Vec<Ulid> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }

    /// Journal appends since the last compaction. Zero without a journal.
    pub fn appends_since_compact(&self) -> u64 {
        self.journal
            .as_ref()
            .and_then(|j| j.lock().ok().map(|wal| wal.appends_since_compact()))
            .unwrap_or(0)
    }

    /// Rewrite the journal as one record per live room and session.
    pub fn compact(&self) -> Result<(), EngineError> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let mut wal = journal
            .lock()
            .map_err(|_| EngineError::Journal("journal lock poisoned".into()))?;

        // Snapshot under the journal lock so no append slips between the two.
        let mut events: Vec<Event> = self
            .rooms
            .iter()
            .map(|e| Event::RoomSaved { room: e.value().clone() })
            .collect();
        events.extend(
            self.sessions
                .iter()
                .map(|e| Event::SessionSaved { session: e.value().clone() }),
        );
        wal.compact(&events)?;
        Ok(())
    }

    fn commit(&self, event: Event) -> Result<(), EngineError> {
        if let Some(journal) = &self.journal {
            let mut wal = journal
                .lock()
                .map_err(|_| EngineError::Journal("journal lock poisoned".into()))?;
            wal.append(&event)?;
        }
        let room_id = self.event_room_id(&event);
        self.apply(&event);
        if let Some(room_id) = room_id {
            self.notify.send(room_id, &event);
            if matches!(event, Event::RoomDeleted { .. }) {
                self.notify.remove(&room_id);
            }
        }
        Ok(())
    }

    /// Room whose channel an event belongs to. Read before applying, since a
    /// deleted session no longer knows its room afterwards.
    fn event_room_id(&self, event: &Event) -> Option<Ulid> {
        match event {
            Event::RoomSaved { room } => Some(room.id),
            Event::RoomDeleted { id } => Some(*id),
            Event::SessionSaved { session } => session.room,
            Event::SessionDeleted { id } => self.sessions.get(id).and_then(|s| s.room),
        }
    }

    fn apply(&self, event: &Event) {
        match event {
            Event::RoomSaved { room } => {
                if let Some(old) = self.rooms.get(&room.id).map(|r| (r.date, r.room_type))
                    && old != (room.date, room.room_type)
                {
                    self.room_index.remove(&old);
                }
                self.room_index.insert((room.date, room.room_type), room.id);
                self.rooms.insert(room.id, room.clone());
            }
            Event::RoomDeleted { id } => {
                if let Some((_, room)) = self.rooms.remove(id) {
                    self.room_index.remove(&(room.date, room.room_type));
                }
            }
            Event::SessionSaved { session } => {
                self.sessions.insert(session.id, session.clone());
            }
            Event::SessionDeleted { id } => {
                self.sessions.remove(id);
            }
        }
    }
}

impl Persistence for InMemoryStore {
    fn save_room(&self, room: &Room) -> Result<(), EngineError> {
        self.commit(Event::RoomSaved { room: room.clone() })
    }

    fn save_session(&self, session: &Session) -> Result<(), EngineError> {
        self.commit(Event::SessionSaved { session: session.clone() })
    }

    fn delete_room(&self, id: Ulid) -> Result<(), EngineError> {
        if !self.rooms.contains_key(&id) {
            return Err(EngineError::NotFound(id));
        }
        self.commit(Event::RoomDeleted { id })
    }

    fn delete_session(&self, id: Ulid) -> Result<(), EngineError> {
        if !self.sessions.contains_key(&id) {
            return Err(EngineError::NotFound(id));
        }
        self.commit(Event::SessionDeleted { id })
    }

    fn find_room(&self, id: Ulid) -> Option<Room> {
        self.rooms.get(&id).map(|e| e.value().clone())
    }

    fn find_session(&self, id: Ulid) -> Option<Session> {
        self.sessions.get(&id).map(|e| e.value().clone())
    }
}

impl RoomLookup for InMemoryStore {
    fn find_room_by_date_and_type(&self, date: NaiveDate, room_type: RoomType) -> Option<Room> {
        let id = *self.room_index.get(&(date, room_type))?;
        self.find_room(id)
    }
}
