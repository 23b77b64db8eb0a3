use dashmap::DashMap;
use ulid::Ulid;

use crate::model::Session;
use crate::ports::PersonLinkage;

/// In-memory member → booked sessions index.
#[derive(Default)]
pub struct PersonRegistry {
    sessions_by_member: DashMap<Ulid, Vec<Ulid>>,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions `member` is booked on, in booking order.
    pub fn sessions_of(&self, member: Ulid) -> Vec<Ulid> {
        self.sessions_by_member
            .get(&member)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }
}

impl PersonLinkage for PersonRegistry {
    fn add_session_to_person(&self, session: &Session, member: Ulid) -> bool {
        let mut sessions = self.sessions_by_member.entry(member).or_default();
        if sessions.contains(&session.id) {
            return false;
        }
        sessions.push(session.id);
        true
    }

    fn remove_session_from_person(&self, member: Ulid, session: &Session) -> bool {
        let Some(mut sessions) = self.sessions_by_member.get_mut(&member) else {
            return false;
        };
        let Some(pos) = sessions.iter().position(|s| *s == session.id) else {
            return false;
        };
        sessions.remove(pos);
        true
    }
}
