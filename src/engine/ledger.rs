use tracing::debug;
use ulid::Ulid;

use crate::model::Session;
use crate::ports::PersonLinkage;

use super::EngineError;

/// Book `member` onto `session`.
///
/// Returns `Ok(false)` without touching the session when the linkage
/// declines to record the reciprocal link.
pub fn add_member<L>(session: &mut Session, member: Ulid, linkage: &L) -> Result<bool, EngineError>
where
    L: PersonLinkage + ?Sized,
{
    if session.contains_member(member) {
        return Err(EngineError::Conflict(format!(
            "member {member} is already booked on session {}",
            session.id
        )));
    }
    session.free = session.free_seats();
    if session.free < 1 {
        return Err(EngineError::Forbidden(format!(
            "limit reached: session {} has {} of {} seats booked",
            session.id,
            session.booked,
            session.capacity()
        )));
    }
    if !linkage.add_session_to_person(session, member) {
        debug!("linkage declined booking {member} on {}", session.id);
        return Ok(false);
    }
    session.booked += 1;
    session.free = session.free_seats();
    session.members.push(member);
    Ok(true)
}

/// Release `member`'s seat on `session`. `Ok(false)` if the linkage refused.
pub fn remove_member<L>(
    session: &mut Session,
    member: Ulid,
    linkage: &L,
) -> Result<bool, EngineError>
where
    L: PersonLinkage + ?Sized,
{
    let Some(pos) = session.members.iter().position(|m| *m == member) else {
        return Err(EngineError::MemberNotFound(member));
    };
    if !linkage.remove_session_from_person(member, session) {
        debug!("linkage declined releasing {member} from {}", session.id);
        return Ok(false);
    }
    session.members.remove(pos);
    session.booked = session.booked.saturating_sub(1);
    session.free = session.free_seats();
    Ok(true)
}

pub fn contains_member(session: &Session, member: Ulid) -> bool {
    session.contains_member(member)
}
