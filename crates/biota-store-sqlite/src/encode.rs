//! Decoding helpers between SQLite rows and `biota-core` entities.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, and enums as their lowercase string forms. Rows are read into
//! `Raw*` structs inside the database thread and decoded afterwards.

use std::collections::HashMap;

use biota_core::{
  identification::{Category, Identification},
  observation::{Observation, QualityGrade, User},
  rank::TaxonRank,
  taxon::{
    Atlas, Color, ConservationStatus, EstablishmentMeans, ListedTaxon, Taxon,
    TaxonName, TaxonPhoto,
  },
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// `?, ?, ?` with `n` placeholders.
pub fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

// ─── Taxa ────────────────────────────────────────────────────────────────────

/// Columns selected for every taxon row, in [`RawTaxon::from_row`] order.
pub const TAXON_COLUMNS: &str = "id, name, rank, rank_level, iconic_taxon_id, \
   parent_id, ancestry, is_active, created_at, observations_count, \
   taxon_changes_count, taxon_schemes_count";

/// Raw values read directly from a `taxa` row.
pub struct RawTaxon {
  pub id:                  i64,
  pub name:                String,
  pub rank:                String,
  pub rank_level:          Option<f64>,
  pub iconic_taxon_id:     Option<i64>,
  pub parent_id:           Option<i64>,
  pub ancestry:            Option<String>,
  pub is_active:           bool,
  pub created_at:          String,
  pub observations_count:  i64,
  pub taxon_changes_count: i64,
  pub taxon_schemes_count: i64,
}

impl RawTaxon {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      name:                row.get(1)?,
      rank:                row.get(2)?,
      rank_level:          row.get(3)?,
      iconic_taxon_id:     row.get(4)?,
      parent_id:           row.get(5)?,
      ancestry:            row.get(6)?,
      is_active:           row.get(7)?,
      created_at:          row.get(8)?,
      observations_count:  row.get(9)?,
      taxon_changes_count: row.get(10)?,
      taxon_schemes_count: row.get(11)?,
    })
  }

  /// A taxon with none of its associations loaded.
  ///
  /// An unlisted rank is kept as its stored string along with the stored
  /// rank level.
  pub fn into_bare_taxon(self) -> Result<Taxon> {
    let rank = TaxonRank::parse(&self.rank);
    if let TaxonRank::Other(other) = &rank {
      tracing::warn!(
        taxon_id = self.id,
        rank = %other,
        rank_level = ?self.rank_level,
        "unrecognised taxon rank; indexing stored value"
      );
    }
    let mut taxon = Taxon::new(self.id, self.name, rank);
    taxon.rank_level = self.rank_level;
    taxon.iconic_taxon_id = self.iconic_taxon_id;
    taxon.parent_id = self.parent_id;
    taxon.ancestry = self.ancestry;
    taxon.is_active = self.is_active;
    taxon.created_at = decode_dt(&self.created_at)?;
    taxon.observations_count = self.observations_count;
    taxon.taxon_changes_count = self.taxon_changes_count;
    taxon.taxon_schemes_count = self.taxon_schemes_count;
    Ok(taxon)
  }
}

pub fn name_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, TaxonName)> {
  Ok((row.get(0)?, TaxonName {
    id:       row.get(1)?,
    name:     row.get(2)?,
    locale:   row.get(3)?,
    lexicon:  row.get(4)?,
    is_valid: row.get(5)?,
    position: row.get(6)?,
  }))
}

pub struct RawListedTaxon {
  pub taxon_id:                i64,
  pub id:                      i64,
  pub place_id:                Option<i64>,
  pub establishment_means:     Option<String>,
  pub occurrence_status_level: Option<i32>,
}

impl RawListedTaxon {
  /// An unrecognised establishment means is logged and dropped.
  pub fn into_listed_taxon(self) -> (i64, ListedTaxon) {
    let establishment_means =
      self.establishment_means.as_deref().and_then(|means| {
        EstablishmentMeans::parse(means)
          .inspect_err(|e| {
            tracing::warn!(
              listed_taxon_id = self.id,
              error = %e,
              "skipping establishment means"
            );
          })
          .ok()
      });
    (self.taxon_id, ListedTaxon {
      id: self.id,
      place_id: self.place_id,
      establishment_means,
      occurrence_status_level: self.occurrence_status_level,
    })
  }
}

/// Every row needed to assemble a batch of fully loaded taxa.
#[derive(Default)]
pub struct RawTaxonGraph {
  pub taxa:     Vec<RawTaxon>,
  pub names:    Vec<(i64, TaxonName)>,
  pub statuses: Vec<(i64, ConservationStatus)>,
  pub photos:   Vec<(i64, TaxonPhoto)>,
  pub colors:   Vec<(i64, Color)>,
  pub listed:   Vec<RawListedTaxon>,
  pub atlases:  Vec<(i64, Atlas)>,
}

fn group<T>(rows: Vec<(i64, T)>) -> HashMap<i64, Vec<T>> {
  let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
  for (owner, row) in rows {
    grouped.entry(owner).or_default().push(row);
  }
  grouped
}

impl RawTaxonGraph {
  pub fn into_taxa(self) -> Result<Vec<Taxon>> {
    let mut names = group(self.names);
    let mut statuses = group(self.statuses);
    let mut photos = group(self.photos);
    let mut colors = group(self.colors);
    let mut listed = group(
      self
        .listed
        .into_iter()
        .map(RawListedTaxon::into_listed_taxon)
        .collect(),
    );
    // A taxon has at most one atlas; keep the first.
    let mut atlases: HashMap<i64, Atlas> = HashMap::new();
    for (taxon_id, atlas) in self.atlases {
      atlases.entry(taxon_id).or_insert(atlas);
    }

    self
      .taxa
      .into_iter()
      .map(|raw| {
        let mut taxon = raw.into_bare_taxon()?;
        let id = taxon.id;
        taxon.names = names.remove(&id).unwrap_or_default();
        taxon.conservation_statuses = statuses.remove(&id).unwrap_or_default();
        taxon.taxon_photos = photos.remove(&id).unwrap_or_default();
        taxon.colors = colors.remove(&id).unwrap_or_default();
        taxon.listed_taxa = listed.remove(&id).unwrap_or_default();
        taxon.atlas = atlases.remove(&id);
        Ok(taxon)
      })
      .collect()
  }
}

// ─── Observations & identifications ──────────────────────────────────────────

pub struct RawObservation {
  pub id:            i64,
  pub uuid:          String,
  pub user_id:       i64,
  pub taxon_id:      Option<i64>,
  pub quality_grade: String,
  pub time_zone:     Option<String>,
  pub created_at:    String,
}

impl RawObservation {
  pub fn into_observation(
    self,
    users: &HashMap<i64, User>,
    taxa: &HashMap<i64, Taxon>,
  ) -> Result<Observation> {
    Ok(Observation {
      id:            self.id,
      uuid:          decode_uuid(&self.uuid)?,
      user_id:       self.user_id,
      user:          users.get(&self.user_id).cloned(),
      taxon_id:      self.taxon_id,
      taxon:         self.taxon_id.and_then(|id| taxa.get(&id).cloned()),
      quality_grade: QualityGrade::parse(&self.quality_grade)?,
      time_zone:     self.time_zone,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawIdentification {
  pub id:             i64,
  pub uuid:           String,
  pub observation_id: Option<i64>,
  pub user_id:        i64,
  pub taxon_id:       i64,
  pub body:           Option<String>,
  pub category:       Option<String>,
  pub current:        bool,
  pub created_at:     String,
}

/// Every row needed to assemble a batch of identifications.
#[derive(Default)]
pub struct RawIdentificationGraph {
  pub identifications: Vec<RawIdentification>,
  pub observations:    Vec<RawObservation>,
  pub users:           Vec<User>,
  pub taxa:            Vec<RawTaxon>,
}

impl RawIdentificationGraph {
  pub fn into_identifications(self) -> Result<Vec<Identification>> {
    let users: HashMap<i64, User> =
      self.users.into_iter().map(|u| (u.id, u)).collect();
    let taxa: HashMap<i64, Taxon> = self
      .taxa
      .into_iter()
      .map(|raw| raw.into_bare_taxon().map(|t| (t.id, t)))
      .collect::<Result<_>>()?;
    let observations: HashMap<i64, Observation> = self
      .observations
      .into_iter()
      .map(|raw| raw.into_observation(&users, &taxa).map(|o| (o.id, o)))
      .collect::<Result<_>>()?;

    self
      .identifications
      .into_iter()
      .map(|raw| {
        Ok(Identification {
          id:          raw.id,
          uuid:        decode_uuid(&raw.uuid)?,
          user_id:     raw.user_id,
          user:        users.get(&raw.user_id).cloned(),
          taxon_id:    raw.taxon_id,
          taxon:       taxa.get(&raw.taxon_id).cloned(),
          observation: raw
            .observation_id
            .and_then(|id| observations.get(&id).cloned()),
          body:        raw.body,
          category:    raw.category.as_deref().and_then(|category| {
            Category::parse(category)
              .inspect_err(|e| {
                tracing::warn!(
                  identification_id = raw.id,
                  error = %e,
                  "skipping identification category"
                );
              })
              .ok()
          }),
          current:     raw.current,
          created_at:  decode_dt(&raw.created_at)?,
        })
      })
      .collect()
  }
}
