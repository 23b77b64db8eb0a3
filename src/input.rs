//! Turn raw strings into the typed values the engine accepts.

use chrono::{NaiveDate, NaiveTime};

use crate::engine::EngineError;
use crate::model::RoomType;

/// `YYYY-MM-DD`.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| EngineError::BadInput(format!("{field}: invalid date {raw:?}: {e}")))
}

/// `HH:MM` or `HH:MM:SS`.
pub fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, EngineError> {
    let raw_trimmed = raw.trim();
    NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M"))
        .map_err(|e| EngineError::BadInput(format!("{field}: invalid time {raw:?}: {e}")))
}

/// Non-negative whole number of minutes.
pub fn parse_minutes(field: &str, raw: &str) -> Result<u32, EngineError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|e| EngineError::BadInput(format!("{field}: invalid number {raw:?}: {e}")))
}

pub fn parse_room_type(field: &str, raw: &str) -> Result<RoomType, EngineError> {
    raw.parse::<RoomType>()
        .map_err(|e| EngineError::BadInput(format!("{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    #[test]
    fn parses_well_formed_values() {
        assert_eq!(
            parse_date("date", "2031-02-03").unwrap(),
            NaiveDate::from_ymd_opt(2031, 2, 3).unwrap()
        );
        assert_eq!(
            parse_time("start", "09:15").unwrap(),
            NaiveTime::from_hms_opt(9, 15, 0).unwrap()
        );
        assert_eq!(
            parse_time("start", "23:59:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
        assert_eq!(parse_minutes("duration", " 90 ").unwrap(), 90);
        assert_eq!(parse_room_type("type", "water").unwrap(), RoomType::Water);
    }

    #[test]
    fn malformed_values_are_bad_input() {
        let errors = [
            parse_date("date", "03/02/2031").unwrap_err(),
            parse_date("date", "2031-02-30").unwrap_err(),
            parse_time("start", "25:00").unwrap_err(),
            parse_minutes("duration", "-5").unwrap_err(),
            parse_minutes("duration", "ninety").unwrap_err(),
            parse_room_type("type", "ice").unwrap_err(),
        ];
        for e in errors {
            assert_eq!(e.kind(), ErrorKind::BadInput, "{e}");
        }
    }

    #[test]
    fn error_names_the_field() {
        let e = parse_time("closing", "noon").unwrap_err();
        assert!(e.to_string().contains("closing"), "{e}");
    }
}
