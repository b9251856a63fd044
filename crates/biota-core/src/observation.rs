//! Observations and users, as referenced by identifications.
//!
//! Observations are indexed elsewhere; here they only appear embedded in an
//! identification document, so this carries just what that needs.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, taxon::Taxon};

/// A platform account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:    i64,
  pub login: String,
  pub name:  Option<String>,
}

/// Community assessment of an observation's data quality.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QualityGrade {
  Casual,
  NeedsId,
  Research,
}

impl QualityGrade {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownQualityGrade(s.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
  pub id:            i64,
  pub uuid:          Uuid,
  pub user_id:       i64,
  pub user:          Option<User>,
  pub taxon_id:      Option<i64>,
  pub taxon:         Option<Taxon>,
  pub quality_grade: QualityGrade,
  /// IANA name of the zone the observation was recorded in, e.g.
  /// `America/Los_Angeles`.
  pub time_zone:     Option<String>,
  pub created_at:    DateTime<Utc>,
}

impl Observation {
  /// The recorded time zone. `None` when unset or not a known zone name.
  pub fn time_zone(&self) -> Option<Tz> {
    let name = self.time_zone.as_deref()?;
    parse_time_zone(name)
      .inspect_err(|e| {
        tracing::warn!(observation_id = self.id, error = %e, "ignoring time zone");
      })
      .ok()
  }
}

/// Look up a zone in the tz database by its IANA name, e.g. `Asia/Tokyo`.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
  Tz::from_str(name.trim()).map_err(|_| Error::InvalidTimeZone(name.to_owned()))
}
