//! Error types for `biota-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown rank: {0:?}")]
  UnknownRank(String),

  #[error("unknown identification category: {0:?}")]
  UnknownCategory(String),

  #[error("unknown quality grade: {0:?}")]
  UnknownQualityGrade(String),

  #[error("unknown establishment means: {0:?}")]
  UnknownEstablishmentMeans(String),

  #[error("unknown time zone: {0:?}")]
  InvalidTimeZone(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
