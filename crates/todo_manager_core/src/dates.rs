//! Due date parsing shared by the store, the JSON layer and front ends.
//!
//! Stored values are always RFC 3339. Naive inputs (no offset) are read in the
//! local offset, falling back to UTC when the platform cannot report it.

use crate::error::AppError;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

const DATE_ONLY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

const NAIVE_DATETIME_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Parses user supplied due date text.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]` and a
/// bare `YYYY-MM-DD`, which means local midnight.
pub fn parse_due_date(text: &str) -> Result<OffsetDateTime, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("due date is required"));
    }

    parse_any(trimmed, local_offset()).ok_or_else(|| {
        AppError::validation(format!(
            "invalid due date '{trimmed}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM"
        ))
    })
}

fn parse_any(text: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    if let Ok(parsed) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(parsed);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = PrimitiveDateTime::parse(text, *format) {
            return Some(parsed.assume_offset(offset));
        }
    }

    Date::parse(text, DATE_ONLY)
        .ok()
        .map(|date| date.midnight().assume_offset(offset))
}

/// Serde adapter for `Task::due_date`.
pub(crate) mod serde_due_date {
    use super::{local_offset, parse_any};
    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let formatted = value.format(&Rfc3339).map_err(ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_any(raw.trim(), local_offset())
            .ok_or_else(|| de::Error::custom(format!("dueDate '{raw}' is not an ISO-8601 date")))
    }
}
