//! Taxon and the associations loaded alongside it for indexing.
//!
//! A [`Taxon`] as handed to the projector is a fully loaded graph: names,
//! conservation statuses, photos, colors, listed-taxon placements and the
//! optional atlas. Nothing here is ever written back.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result, rank::TaxonRank};

// ─── Names ───────────────────────────────────────────────────────────────────

/// A scientific or common name attached to a taxon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonName {
  pub id:       i64,
  pub name:     String,
  pub locale:   Option<String>,
  /// e.g. "scientific-names", "english".
  pub lexicon:  Option<String>,
  pub is_valid: bool,
  pub position: i32,
}

impl std::fmt::Display for TaxonName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "#{} {:?} ({}, position {}, {})",
      self.id,
      self.name,
      self.lexicon.as_deref().unwrap_or("-"),
      self.position,
      if self.is_valid { "valid" } else { "invalid" },
    )
  }
}

// ─── Conservation ────────────────────────────────────────────────────────────

/// A conservation status, global when `place_id` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationStatus {
  pub id:         i64,
  pub place_id:   Option<i64>,
  pub status:     String,
  pub authority:  Option<String>,
  pub iucn:       Option<i32>,
  pub geoprivacy: Option<String>,
}

// ─── Photos ──────────────────────────────────────────────────────────────────

/// A stored photo with its rendered size variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  pub id:              i64,
  pub user_id:         Option<i64>,
  pub license_code:    Option<String>,
  pub attribution:     Option<String>,
  pub native_page_url: Option<String>,
  pub square_url:      Option<String>,
  pub small_url:       Option<String>,
  pub medium_url:      Option<String>,
  pub large_url:       Option<String>,
  pub original_url:    Option<String>,
}

/// A photo of some descendant of `ancestor_id`, used to fill out a taxon
/// that has few photos of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescendantPhoto {
  pub ancestor_id: i64,
  /// The descendant the photo is attached to.
  pub taxon_id:    i64,
  pub photo:       Photo,
}

/// The join between a taxon and a photo. `photo` is `None` when the photo row
/// has gone missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonPhoto {
  pub id:       i64,
  pub position: Option<i32>,
  pub photo:    Option<Photo>,
}

// ─── Placements ──────────────────────────────────────────────────────────────

/// How a taxon came to be present in a place.
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
pub enum EstablishmentMeans {
  Native,
  Endemic,
  Introduced,
  Naturalised,
  Invasive,
  Managed,
}

impl EstablishmentMeans {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownEstablishmentMeans(s.to_owned()))
  }
}

/// A taxon's placement on a place's checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedTaxon {
  pub id:                      i64,
  pub place_id:                Option<i64>,
  pub establishment_means:     Option<EstablishmentMeans>,
  pub occurrence_status_level: Option<i32>,
}

impl ListedTaxon {
  /// Placements worth indexing carry a means or an occurrence status.
  pub fn has_means_or_status(&self) -> bool {
    self.establishment_means.is_some() || self.occurrence_status_level.is_some()
  }
}

// ─── Misc associations ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
  pub id:    i64,
  pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atlas {
  pub id:        i64,
  pub is_active: bool,
}

// ─── Taxon ───────────────────────────────────────────────────────────────────

/// A node of the taxonomy together with its indexing load set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxon {
  pub id:                    i64,
  pub name:                  String,
  pub rank:                  TaxonRank,
  /// Stored rank level; may be null for legacy rows.
  pub rank_level:            Option<f64>,
  pub iconic_taxon_id:       Option<i64>,
  pub parent_id:             Option<i64>,
  /// `/`-delimited ids from the root down to the immediate parent.
  pub ancestry:              Option<String>,
  pub is_active:             bool,
  pub created_at:            DateTime<Utc>,
  pub observations_count:    i64,
  pub taxon_changes_count:   i64,
  pub taxon_schemes_count:   i64,
  pub names:                 Vec<TaxonName>,
  pub conservation_statuses: Vec<ConservationStatus>,
  pub taxon_photos:          Vec<TaxonPhoto>,
  pub colors:                Vec<Color>,
  pub listed_taxa:           Vec<ListedTaxon>,
  pub atlas:                 Option<Atlas>,
}

impl Taxon {
  /// A bare taxon with an empty load set. Mostly useful for building
  /// fixtures.
  pub fn new(id: i64, name: impl Into<String>, rank: impl Into<TaxonRank>) -> Self {
    let rank = rank.into();
    Self {
      id,
      name: name.into(),
      rank_level: rank.level(),
      rank,
      iconic_taxon_id: None,
      parent_id: None,
      ancestry: None,
      is_active: true,
      created_at: DateTime::<Utc>::default(),
      observations_count: 0,
      taxon_changes_count: 0,
      taxon_schemes_count: 0,
      names: Vec::new(),
      conservation_statuses: Vec::new(),
      taxon_photos: Vec::new(),
      colors: Vec::new(),
      listed_taxa: Vec::new(),
      atlas: None,
    }
  }

  /// Taxon photos that still point at a photo, ordered by position then id.
  pub fn photos_in_order(&self) -> Vec<(&TaxonPhoto, &Photo)> {
    let mut photos: Vec<(&TaxonPhoto, &Photo)> = self
      .taxon_photos
      .iter()
      .filter_map(|tp| tp.photo.as_ref().map(|p| (tp, p)))
      .collect();
    photos.sort_by_key(|(tp, _)| (tp.position.unwrap_or(i32::MAX), tp.id));
    photos
  }

  /// The photo shown for this taxon: the first present photo in order.
  pub fn default_photo(&self) -> Option<&Photo> {
    self.photos_in_order().first().map(|(_, p)| *p)
  }

  pub fn listed_taxa_with_means_or_statuses(
    &self,
  ) -> impl Iterator<Item = &ListedTaxon> {
    self.listed_taxa.iter().filter(|lt| lt.has_means_or_status())
  }
}
