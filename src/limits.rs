use chrono::{Duration, NaiveTime};

/// Same-day sessions must start at least this far ahead of now.
pub const RESERVE_IN_ADVANCE_MINUTES: u32 = 30;

/// Shortest bookable session.
pub const MIN_DURATION_MINUTES: u32 = 30;

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
}

/// Earliest allowed room opening.
pub fn min_opening() -> NaiveTime {
    hms(6, 0, 0)
}

/// Latest allowed room closing.
pub fn max_closing() -> NaiveTime {
    hms(23, 0, 0)
}

/// No session may end after this.
pub fn latest_session_ending() -> NaiveTime {
    hms(23, 59, 59)
}

/// Past this wall-clock time nothing can be booked for today: a minimum-length
/// session reserved in advance would end after `latest_session_ending`.
pub fn latest_reservation() -> NaiveTime {
    let margin = i64::from(MIN_DURATION_MINUTES + RESERVE_IN_ADVANCE_MINUTES);
    latest_session_ending() - Duration::minutes(margin)
}
