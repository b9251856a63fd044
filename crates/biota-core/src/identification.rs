//! Identifications: a user's claim that an observation shows a given taxon.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Error, Result,
  observation::{Observation, User},
  taxon::Taxon,
};

/// How an identification relates to the observation's community taxon.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
  Improving,
  Supporting,
  Leading,
  Maverick,
}

impl Category {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownCategory(s.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
  pub id:          i64,
  pub uuid:        Uuid,
  pub user_id:     i64,
  pub user:        Option<User>,
  pub taxon_id:    i64,
  pub taxon:       Option<Taxon>,
  pub observation: Option<Observation>,
  pub body:        Option<String>,
  pub category:    Option<Category>,
  /// Whether this is the identifier's prevailing identification on the
  /// observation.
  pub current:     bool,
  pub created_at:  DateTime<Utc>,
}

impl Identification {
  /// The identifier also made the observation.
  pub fn own_observation(&self) -> Option<bool> {
    self.observation.as_ref().map(|o| o.user_id == self.user_id)
  }

  /// The identification agrees with the observation's current taxon.
  pub fn current_taxon(&self) -> Option<bool> {
    self
      .observation
      .as_ref()
      .map(|o| o.taxon_id == Some(self.taxon_id))
  }
}
