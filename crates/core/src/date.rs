//! Distribution date stamps (`YYYYMMDD`, UTC)

use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::{Result, StashError};

/// Format a calendar date as a distribution stamp.
pub fn date_stamp(date: Date) -> Result<String> {
    date.format(format_description!("[year][month][day]"))
        .map_err(|e| StashError::InvalidDate(format!("{}: {}", date, e)))
}

/// Today's stamp in UTC.
pub fn today_stamp() -> Result<String> {
    date_stamp(OffsetDateTime::now_utc().date())
}

/// Whether `stamp` is exactly eight ASCII digits.
///
/// Stamps become archive file names, so anything else is refused.
pub fn is_date_stamp(stamp: &str) -> bool {
    stamp.len() == 8 && stamp.bytes().all(|b| b.is_ascii_digit())
}
