//! Taxonomic ranks and their numeric levels.
//!
//! A rank level is a measure of specificity: lower is more specific. Species
//! sit at [`SPECIES_RANK_LEVEL`]; everything below it (subspecies, variety,
//! form, ...) is "finer than species".
//!
//! The rank table is not closed in practice: a taxon whose stored rank is not
//! a known [`Rank`] keeps its string as [`TaxonRank::Other`] and is indexed
//! with its stored rank level.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// Rank level of a species.
pub const SPECIES_RANK_LEVEL: f64 = 10.0;

/// A taxonomic rank, rendered lowercase both in storage and in documents.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Rank {
  StateOfMatter,
  Kingdom,
  Subkingdom,
  Superphylum,
  Phylum,
  Subphylum,
  Superclass,
  Class,
  Subclass,
  Infraclass,
  Subterclass,
  Superorder,
  Order,
  Suborder,
  Infraorder,
  Parvorder,
  Zoosection,
  Zoosubsection,
  Superfamily,
  Epifamily,
  Family,
  Subfamily,
  Supertribe,
  Tribe,
  Subtribe,
  Genus,
  GenusHybrid,
  Subgenus,
  Section,
  Subsection,
  Complex,
  Species,
  Hybrid,
  Subspecies,
  Variety,
  Form,
  InfraHybrid,
}

impl Rank {
  /// The default rank level for this rank.
  pub fn level(self) -> f64 {
    match self {
      Self::StateOfMatter => 100.0,
      Self::Kingdom => 70.0,
      Self::Subkingdom => 67.0,
      Self::Superphylum => 63.0,
      Self::Phylum => 60.0,
      Self::Subphylum => 57.0,
      Self::Superclass => 53.0,
      Self::Class => 50.0,
      Self::Subclass => 47.0,
      Self::Infraclass => 45.0,
      Self::Subterclass => 44.0,
      Self::Superorder => 43.0,
      Self::Order => 40.0,
      Self::Suborder => 37.0,
      Self::Infraorder => 35.0,
      Self::Parvorder => 34.5,
      Self::Zoosection => 34.0,
      Self::Zoosubsection => 33.5,
      Self::Superfamily => 33.0,
      Self::Epifamily => 32.0,
      Self::Family => 30.0,
      Self::Subfamily => 27.0,
      Self::Supertribe => 26.0,
      Self::Tribe => 25.0,
      Self::Subtribe => 24.0,
      Self::Genus | Self::GenusHybrid => 20.0,
      Self::Subgenus => 15.0,
      Self::Section => 13.0,
      Self::Subsection => 12.0,
      Self::Complex => 11.0,
      Self::Species | Self::Hybrid => SPECIES_RANK_LEVEL,
      Self::Subspecies | Self::Variety | Self::Form | Self::InfraHybrid => 5.0,
    }
  }

  /// Parse a stored rank string.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownRank(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

/// A taxon's stored rank: a known [`Rank`], or the raw string when the rank
/// table does not list it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaxonRank {
  Known(Rank),
  Other(String),
}

impl TaxonRank {
  /// Never fails; unlisted ranks are kept verbatim.
  pub fn parse(s: &str) -> Self {
    Rank::from_str(s).map_or_else(|_| Self::Other(s.to_owned()), Self::Known)
  }

  pub fn known(&self) -> Option<Rank> {
    match self {
      Self::Known(rank) => Some(*rank),
      Self::Other(_) => None,
    }
  }

  /// The default level of a known rank.
  pub fn level(&self) -> Option<f64> { self.known().map(Rank::level) }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Known(rank) => rank.as_str(),
      Self::Other(s) => s,
    }
  }
}

impl From<Rank> for TaxonRank {
  fn from(rank: Rank) -> Self { Self::Known(rank) }
}

impl PartialEq<Rank> for TaxonRank {
  fn eq(&self, other: &Rank) -> bool { self.known() == Some(*other) }
}

impl fmt::Display for TaxonRank {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Whether a (possibly unknown) rank level is finer than species.
///
/// An unknown level is never finer than species.
pub fn is_below_species(rank_level: Option<f64>) -> bool {
  rank_level.is_some_and(|level| level < SPECIES_RANK_LEVEL)
}
