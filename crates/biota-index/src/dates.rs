//! Calendar breakdown of timestamps for date faceting.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// The parts of a timestamp as seen in a particular time zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateDetails {
  /// `YYYY-MM-DD`.
  pub date:  String,
  pub day:   u32,
  pub month: u32,
  pub year:  i32,
  pub hour:  u32,
  /// ISO 8601 week number.
  pub week:  u32,
}

impl DateDetails {
  pub fn new(at: DateTime<Utc>, zone: Tz) -> Self {
    let local = at.with_timezone(&zone);
    Self {
      date:  local.format("%Y-%m-%d").to_string(),
      day:   local.day(),
      month: local.month(),
      year:  local.year(),
      hour:  local.hour(),
      week:  local.iso_week().week(),
    }
  }
}
