use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Parses an IANA timezone name such as `Europe/Berlin`.
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone.trim())
        .map_err(|_| CoreError::InvalidInput(format!("Invalid timezone: {}", timezone)))
}

/// Calendar date of `now` as seen in `tz`. This is the reference date the
/// filter engine and notification selection work with.
pub fn reference_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Today's date in `tz`, read from the system clock.
pub fn today_in(tz: Tz) -> NaiveDate {
    reference_date(Utc::now(), tz)
}
