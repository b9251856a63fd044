//! Search document shapes.
//!
//! Fields that a context suppresses are `None` on an optional flattened
//! group, so they are absent from the serialised mapping rather than null.
//! Optional associations that *are* in scope (a default photo, an atlas)
//! serialise as null when missing.

use biota_core::{
  ancestry::AncestorRef,
  identification::Category,
  observation::QualityGrade,
  rank::TaxonRank,
  taxon::EstablishmentMeans,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::dates::DateDetails;

// ─── Taxon ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonDocument {
  pub id:                    i64,
  pub name:                  String,
  pub rank:                  TaxonRank,
  pub rank_level:            Option<f64>,
  pub iconic_taxon_id:       Option<i64>,
  pub parent_id:             Option<i64>,
  pub ancestor_ids:          Vec<i64>,
  pub is_active:             bool,
  pub ancestry:              String,
  pub min_species_ancestry:  String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_species_ancestors: Option<Vec<AncestorRef>>,
  #[serde(flatten)]
  pub names:                 Option<NameFields>,
  #[serde(flatten)]
  pub details:               Option<TaxonDetails>,
}

/// Present unless details are suppressed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameFields {
  pub names:    Vec<NameDocument>,
  pub statuses: Vec<StatusDocument>,
}

/// Present only on standalone taxon documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonDetails {
  pub created_at:          DateTime<Utc>,
  pub default_photo:       Option<DefaultPhotoDocument>,
  pub colors:              Vec<ColorDocument>,
  pub taxon_changes_count: i64,
  pub taxon_schemes_count: i64,
  pub observations_count:  i64,
  pub place_ids:           Vec<i64>,
  pub listed_taxa:         Vec<ListedTaxonDocument>,
  pub taxon_photos:        Vec<TaxonPhotoDocument>,
  pub atlas_id:            Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameDocument {
  pub id:                i64,
  pub name:              String,
  pub locale:            Option<String>,
  pub lexicon:           Option<String>,
  pub is_valid:          bool,
  pub position:          i32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name_autocomplete: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDocument {
  pub place_id:   Option<i64>,
  pub status:     String,
  pub authority:  Option<String>,
  pub iucn:       Option<i32>,
  pub geoprivacy: Option<String>,
}

/// The default photo carries only the square and medium renditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultPhotoDocument {
  pub id:           i64,
  pub license_code: Option<String>,
  pub attribution:  Option<String>,
  pub square_url:   Option<String>,
  pub medium_url:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoDocument {
  pub id:              i64,
  pub license_code:    Option<String>,
  pub attribution:     Option<String>,
  pub native_page_url: Option<String>,
  pub square_url:      Option<String>,
  pub small_url:       Option<String>,
  pub medium_url:      Option<String>,
  pub large_url:       Option<String>,
  pub original_url:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonPhotoDocument {
  pub taxon_id:     i64,
  pub license_code: Option<String>,
  pub photo:        PhotoDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorDocument {
  pub id:    i64,
  pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedTaxonDocument {
  pub place_id:                Option<i64>,
  pub establishment_means:     Option<EstablishmentMeans>,
  pub occurrence_status_level: Option<i32>,
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// A detail-suppressed user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
  pub id:    i64,
  pub login: String,
}

// ─── Observation ─────────────────────────────────────────────────────────────

/// An observation as embedded in another document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationDocument {
  pub id:            i64,
  pub uuid:          Uuid,
  pub quality_grade: QualityGrade,
  pub user:          Option<UserSummary>,
  pub taxon:         Option<TaxonDocument>,
  /// Present only when the observation's places were batch-loaded.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub place_ids:     Option<Vec<i64>>,
}

// ─── Identification ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationDocument {
  pub id:                 i64,
  pub uuid:               Uuid,
  pub user:               Option<UserSummary>,
  pub created_at:         DateTime<Utc>,
  pub created_at_details: DateDetails,
  pub body:               Option<String>,
  pub category:           Option<Category>,
  pub current:            bool,
  #[serde(flatten)]
  pub observation_fields: Option<ObservationFields>,
}

/// Present when the identification has both an observation and a taxon and
/// details are not suppressed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationFields {
  pub own_observation: bool,
  pub current_taxon:   bool,
  pub taxon:           TaxonDocument,
  pub observation:     ObservationDocument,
}
