//! Document projection.
//!
//! [`Projector`] turns a loaded entity plus the batch's [`Enrichment`] into a
//! search document. Projection is a pure function of its inputs: it issues no
//! queries and mutates nothing, so the documents of a batch can be built in
//! any order once enrichment has finished.

use std::collections::HashSet;

use biota_core::{
  ancestry::Lineage,
  context::IndexContext,
  identification::Identification,
  observation::{Observation, User},
  store::IndexSource,
  taxon::{Photo, Taxon, TaxonName},
};
use chrono_tz::Tz;

use crate::{
  Error, Result,
  dates::DateDetails,
  document::{
    ColorDocument, DefaultPhotoDocument, IdentificationDocument,
    ListedTaxonDocument, NameDocument, NameFields, ObservationDocument,
    ObservationFields, PhotoDocument, StatusDocument, TaxonDetails,
    TaxonDocument, TaxonPhotoDocument, UserSummary,
  },
  enrich::Enrichment,
};

/// Most taxon photos kept on a taxon document.
pub const MAX_TAXON_PHOTOS: usize = 30;

/// Builds search documents.
///
/// The universal root taxon and the fallback time zone are resolved once and
/// injected here rather than looked up per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projector {
  root_taxon_id:     Option<i64>,
  default_time_zone: Tz,
}

impl Projector {
  pub fn new(root_taxon_id: Option<i64>, default_time_zone: Tz) -> Self {
    Self { root_taxon_id, default_time_zone }
  }

  /// A projector whose fallback time zone is UTC.
  pub fn utc(root_taxon_id: Option<i64>) -> Self {
    Self::new(root_taxon_id, Tz::UTC)
  }

  /// Build a projector, asking `store` for the root taxon unless
  /// `root_override` is given.
  pub async fn discover<S: IndexSource>(
    store: &S,
    root_override: Option<i64>,
    default_time_zone: Tz,
  ) -> Result<Self> {
    let root_taxon_id = match root_override {
      Some(id) => Some(id),
      None => store.root_taxon_id().await.map_err(Error::store)?,
    };
    tracing::debug!(?root_taxon_id, %default_time_zone, "projector ready");
    Ok(Self::new(root_taxon_id, default_time_zone))
  }

  pub fn root_taxon_id(&self) -> Option<i64> { self.root_taxon_id }

  // ── Taxa ──────────────────────────────────────────────────────────────

  pub fn taxon(
    &self,
    taxon: &Taxon,
    ctx: IndexContext,
    enrichment: &Enrichment,
  ) -> TaxonDocument {
    // The root is implicit for identification facets.
    let excluded_root = self.root_taxon_id.filter(|_| ctx.for_identification);
    let lineage = Lineage::resolve(
      taxon.id,
      taxon.ancestry.as_deref(),
      taxon.rank_level,
      excluded_root,
    );

    let min_species_ancestors = (ctx.for_identification && !ctx.for_observation)
      .then(|| lineage.min_species_ancestors());

    let names = ctx.includes_names().then(|| NameFields {
      names:    sorted_names(&taxon.names)
        .into_iter()
        .map(|tn| name_document(tn, !ctx.for_observation))
        .collect(),
      statuses: taxon
        .conservation_statuses
        .iter()
        .map(|cs| StatusDocument {
          place_id:   cs.place_id,
          status:     cs.status.clone(),
          authority:  cs.authority.clone(),
          iucn:       cs.iucn,
          geoprivacy: cs.geoprivacy.clone(),
        })
        .collect(),
    });

    let details = ctx
      .is_top_level()
      .then(|| taxon_details(taxon, enrichment));

    TaxonDocument {
      id: taxon.id,
      name: taxon.name.clone(),
      rank: taxon.rank.clone(),
      rank_level: taxon.rank_level,
      iconic_taxon_id: taxon.iconic_taxon_id,
      parent_id: taxon.parent_id,
      ancestor_ids: lineage.ancestor_ids,
      is_active: taxon.is_active,
      ancestry: lineage.ancestry,
      min_species_ancestry: lineage.min_species_ancestry,
      min_species_ancestors,
      names,
      details,
    }
  }

  // ── Observations ──────────────────────────────────────────────────────

  /// An observation as embedded in another document. Its taxon is always
  /// projected in observation context.
  pub fn observation(
    &self,
    observation: &Observation,
    ctx: IndexContext,
    enrichment: &Enrichment,
  ) -> ObservationDocument {
    ObservationDocument {
      id:            observation.id,
      uuid:          observation.uuid,
      quality_grade: observation.quality_grade,
      user:          observation.user.as_ref().map(user_summary),
      taxon:         observation
        .taxon
        .as_ref()
        .map(|t| self.taxon(t, ctx.for_observation(), enrichment)),
      place_ids:     enrichment
        .observation_place_ids(observation.id)
        .map(|places| places.iter().copied().collect()),
    }
  }

  // ── Identifications ───────────────────────────────────────────────────

  pub fn identification(
    &self,
    identification: &Identification,
    ctx: IndexContext,
    enrichment: &Enrichment,
  ) -> IdentificationDocument {
    let zone = identification
      .observation
      .as_ref()
      .and_then(Observation::time_zone)
      .unwrap_or(self.default_time_zone);

    let embedded = IndexContext::TAXON.without_details().for_identification();
    let observation_fields =
      match (&identification.observation, &identification.taxon) {
        (Some(observation), Some(taxon)) if !ctx.no_details => {
          Some(ObservationFields {
            own_observation: identification
              .own_observation()
              .unwrap_or_default(),
            current_taxon:   identification.current_taxon().unwrap_or_default(),
            taxon:           self.taxon(taxon, embedded, enrichment),
            observation:     self.observation(
              observation,
              embedded,
              enrichment,
            ),
          })
        }
        _ => None,
      };

    IdentificationDocument {
      id: identification.id,
      uuid: identification.uuid,
      user: identification.user.as_ref().map(user_summary),
      created_at: identification.created_at,
      created_at_details: DateDetails::new(identification.created_at, zone),
      body: identification.body.clone(),
      category: identification.category,
      current: identification.current,
      observation_fields,
    }
  }
}

impl Default for Projector {
  fn default() -> Self { Self::utc(None) }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Valid names first, then by declared position, then by id.
fn sorted_names(names: &[TaxonName]) -> Vec<&TaxonName> {
  let mut sorted: Vec<&TaxonName> = names.iter().collect();
  sorted.sort_by_key(|tn| (!tn.is_valid, tn.position, tn.id));
  sorted
}

fn name_document(tn: &TaxonName, autocomplete: bool) -> NameDocument {
  NameDocument {
    id:                tn.id,
    name:              tn.name.clone(),
    locale:            tn.locale.clone(),
    lexicon:           tn.lexicon.clone(),
    is_valid:          tn.is_valid,
    position:          tn.position,
    name_autocomplete: autocomplete.then(|| tn.name.clone()),
  }
}

fn user_summary(user: &User) -> UserSummary {
  UserSummary { id: user.id, login: user.login.clone() }
}

fn taxon_details(taxon: &Taxon, enrichment: &Enrichment) -> TaxonDetails {
  // Prefer the batch-loaded places; fall back to the loaded placements.
  let place_ids: Vec<i64> = match enrichment.taxon_place_ids(taxon.id) {
    Some(places) => places.iter().copied().collect(),
    None => {
      let mut seen = HashSet::new();
      taxon
        .listed_taxa
        .iter()
        .filter_map(|lt| lt.place_id)
        .filter(|id| seen.insert(*id))
        .collect()
    }
  };

  // Own photos first, then descendants' photos until the cap is reached.
  let own = taxon
    .photos_in_order()
    .into_iter()
    .map(|(_, photo)| (taxon.id, photo));
  let backfill = enrichment
    .descendant_photos(taxon.id)
    .iter()
    .map(|dp| (dp.taxon_id, &dp.photo));
  let mut seen_photos = HashSet::new();
  let taxon_photos = own
    .chain(backfill)
    .filter(|(_, photo)| seen_photos.insert(photo.id))
    .take(MAX_TAXON_PHOTOS)
    .map(|(taxon_id, photo)| TaxonPhotoDocument {
      taxon_id,
      license_code: photo.license_code.clone(),
      photo: photo_document(photo),
    })
    .collect();

  TaxonDetails {
    created_at: taxon.created_at,
    default_photo: taxon.default_photo().map(|p| DefaultPhotoDocument {
      id:           p.id,
      license_code: p.license_code.clone(),
      attribution:  p.attribution.clone(),
      square_url:   p.square_url.clone(),
      medium_url:   p.medium_url.clone(),
    }),
    colors: taxon
      .colors
      .iter()
      .map(|c| ColorDocument { id: c.id, value: c.value.clone() })
      .collect(),
    taxon_changes_count: taxon.taxon_changes_count,
    taxon_schemes_count: taxon.taxon_schemes_count,
    observations_count: taxon.observations_count,
    place_ids,
    listed_taxa: taxon
      .listed_taxa_with_means_or_statuses()
      .map(|lt| ListedTaxonDocument {
        place_id:                lt.place_id,
        establishment_means:     lt.establishment_means,
        occurrence_status_level: lt.occurrence_status_level,
      })
      .collect(),
    taxon_photos,
    atlas_id: taxon.atlas.as_ref().map(|a| a.id),
  }
}

fn photo_document(photo: &Photo) -> PhotoDocument {
  PhotoDocument {
    id:              photo.id,
    license_code:    photo.license_code.clone(),
    attribution:     photo.attribution.clone(),
    native_page_url: photo.native_page_url.clone(),
    square_url:      photo.square_url.clone(),
    small_url:       photo.small_url.clone(),
    medium_url:      photo.medium_url.clone(),
    large_url:       photo.large_url.clone(),
    original_url:    photo.original_url.clone(),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use biota_core::{
    rank::Rank,
    taxon::{Atlas, Color, EstablishmentMeans, ListedTaxon, TaxonPhoto},
  };
  use serde_json::Value;

  use super::*;
  use crate::{
    enrich::{prepare_identifications, prepare_taxa},
    fixtures::{
      FakeSource, LIFE, identification, name, observation, photo, species,
    },
  };

  fn to_json<T: serde::Serialize>(doc: &T) -> serde_json::Map<String, Value> {
    match serde_json::to_value(doc).unwrap() {
      Value::Object(map) => map,
      other => panic!("expected an object, got {other}"),
    }
  }

  fn listed(id: i64, place_id: Option<i64>, means: bool) -> ListedTaxon {
    ListedTaxon {
      id,
      place_id,
      establishment_means: means.then_some(EstablishmentMeans::Native),
      occurrence_status_level: None,
    }
  }

  // ── Taxon: field groups ────────────────────────────────────────────────

  const ALWAYS: &[&str] = &[
    "id",
    "name",
    "rank",
    "rank_level",
    "iconic_taxon_id",
    "parent_id",
    "ancestor_ids",
    "is_active",
    "ancestry",
    "min_species_ancestry",
  ];

  const TOP_LEVEL_ONLY: &[&str] = &[
    "created_at",
    "default_photo",
    "colors",
    "taxon_changes_count",
    "taxon_schemes_count",
    "observations_count",
    "place_ids",
    "listed_taxa",
    "taxon_photos",
    "atlas_id",
  ];

  #[test]
  fn full_taxon_document_has_every_group() {
    let doc = to_json(&Projector::default().taxon(
      &species(),
      IndexContext::TAXON,
      &Enrichment::empty(),
    ));
    for key in ALWAYS.iter().chain(TOP_LEVEL_ONLY).chain(&["names", "statuses"]) {
      assert!(doc.contains_key(*key), "missing {key}");
    }
    assert!(!doc.contains_key("min_species_ancestors"));
    // In-scope but missing associations are null, not absent.
    assert_eq!(doc["default_photo"], Value::Null);
    assert_eq!(doc["atlas_id"], Value::Null);
    assert_eq!(doc["rank"], "species");
  }

  #[test]
  fn no_details_suppresses_everything_heavy() {
    let mut taxon = species();
    taxon.atlas = Some(Atlas { id: 7, is_active: true });
    taxon.colors = vec![Color { id: 1, value: "orange".into() }];
    let doc = to_json(&Projector::default().taxon(
      &taxon,
      IndexContext::TAXON.without_details(),
      &Enrichment::empty(),
    ));
    for key in TOP_LEVEL_ONLY.iter().chain(&["names", "statuses"]) {
      assert!(!doc.contains_key(*key), "{key} should be absent");
    }
    for key in ALWAYS {
      assert!(doc.contains_key(*key), "missing {key}");
    }
  }

  #[test]
  fn observation_context_keeps_names_but_drops_top_level_fields() {
    let doc = to_json(&Projector::default().taxon(
      &species(),
      IndexContext::TAXON.for_observation(),
      &Enrichment::empty(),
    ));
    assert!(doc.contains_key("names"));
    assert!(doc.contains_key("statuses"));
    for key in TOP_LEVEL_ONLY {
      assert!(!doc.contains_key(*key), "{key} should be absent");
    }
    // No autocomplete copies on embedded names.
    assert!(doc["names"][0].get("name_autocomplete").is_none());
  }

  // ── Taxon: ancestry ────────────────────────────────────────────────────

  #[test]
  fn identification_context_excludes_root() {
    let projector = Projector::utc(Some(LIFE));
    let taxon = species();

    let plain =
      projector.taxon(&taxon, IndexContext::TAXON, &Enrichment::empty());
    assert_eq!(plain.ancestor_ids.first(), Some(&LIFE));
    assert!(plain.ancestry.starts_with(&format!("{LIFE},")));

    let ident = projector.taxon(
      &taxon,
      IndexContext::TAXON.without_details().for_identification(),
      &Enrichment::empty(),
    );
    assert!(!ident.ancestor_ids.contains(&LIFE));
    assert!(!ident.ancestry.split(',').any(|id| id == LIFE.to_string()));
    assert_eq!(ident.ancestor_ids.last(), Some(&taxon.id));
  }

  #[test]
  fn min_species_ancestors_only_outside_observations() {
    let projector = Projector::utc(Some(LIFE));
    let ctx = IndexContext::TAXON.without_details().for_identification();
    let mut taxon = species();
    taxon.rank = Rank::Subspecies.into();
    taxon.rank_level = Some(Rank::Subspecies.level());

    let doc = projector.taxon(&taxon, ctx, &Enrichment::empty());
    let ancestors = doc.min_species_ancestors.unwrap();
    assert_eq!(ancestors.last().map(|a| a.id), taxon.parent_id);
    assert_eq!(ancestors.len(), doc.ancestor_ids.len() - 1);

    let embedded =
      projector.taxon(&taxon, ctx.for_observation(), &Enrichment::empty());
    assert!(embedded.min_species_ancestors.is_none());
  }

  // ── Taxon: names ───────────────────────────────────────────────────────

  #[test]
  fn names_sort_valid_first_then_position_then_id() {
    let mut taxon = species();
    taxon.names = vec![
      name(5, "Papilio plexippus", false, 0),
      name(4, "Monarch", true, 1),
      name(3, "Monarca", true, 1),
      name(2, "Danaus plexippus", true, 0),
      name(1, "Danaus archippus", false, 0),
    ];
    let doc = full(&taxon, &Enrichment::empty());
    let ids: Vec<i64> =
      doc.names.unwrap().names.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![2, 3, 4, 1, 5]);
  }

  #[test]
  fn top_level_names_carry_autocomplete() {
    let doc = full(&species(), &Enrichment::empty());
    let names = doc.names.unwrap().names;
    assert_eq!(
      names[0].name_autocomplete.as_deref(),
      Some(names[0].name.as_str())
    );
  }

  // ── Taxon: details ─────────────────────────────────────────────────────

  /// A standalone taxon document from the default projector.
  fn full(taxon: &Taxon, enrichment: &Enrichment) -> TaxonDocument {
    Projector::default().taxon(taxon, IndexContext::TAXON, enrichment)
  }

  #[tokio::test]
  async fn place_ids_prefer_batch_cache() {
    let mut taxon = species();
    taxon.listed_taxa = vec![listed(1, Some(900), false)];

    let store = FakeSource::default()
      .with_listed_places(&[(taxon.id, 2), (taxon.id, 1)]);
    let enrichment = prepare_taxa(&store, std::slice::from_ref(&taxon))
      .await
      .unwrap();
    assert_eq!(
      enrichment.taxon_place_ids(taxon.id),
      Some(&BTreeSet::from([1, 2]))
    );
    let doc = full(&taxon, &enrichment);
    assert_eq!(doc.details.unwrap().place_ids, vec![1, 2]);
  }

  #[test]
  fn place_ids_fall_back_to_placements() {
    let mut taxon = species();
    taxon.listed_taxa = vec![
      listed(1, Some(900), false),
      listed(2, None, true),
      listed(3, Some(901), true),
      listed(4, Some(900), true),
    ];
    let details = full(&taxon, &Enrichment::empty()).details.unwrap();
    assert_eq!(details.place_ids, vec![900, 901]);
    // Only placements with means or status are indexed.
    assert_eq!(details.listed_taxa.len(), 3);
  }

  #[tokio::test]
  async fn empty_batch_cache_wins_over_placements() {
    let mut taxon = species();
    taxon.listed_taxa = vec![listed(1, Some(900), true)];
    let store = FakeSource::default();
    let enrichment = prepare_taxa(&store, std::slice::from_ref(&taxon))
      .await
      .unwrap();
    let doc = full(&taxon, &enrichment);
    assert!(doc.details.unwrap().place_ids.is_empty());
  }

  #[test]
  fn taxon_photos_are_bounded_deduplicated_and_present() {
    let mut taxon = species();
    taxon.taxon_photos.push(TaxonPhoto {
      id:       1,
      position: Some(0),
      photo:    None,
    });
    for i in 0..40 {
      taxon.taxon_photos.push(TaxonPhoto {
        id:       100 + i,
        position: Some(i as i32 + 1),
        photo:    Some(photo(1000 + i)),
      });
    }
    // Same photo linked twice.
    taxon.taxon_photos.push(TaxonPhoto {
      id:       2,
      position: Some(0),
      photo:    Some(photo(1000)),
    });

    let details = full(&taxon, &Enrichment::empty()).details.unwrap();
    assert_eq!(details.taxon_photos.len(), MAX_TAXON_PHOTOS);
    let ids: HashSet<i64> =
      details.taxon_photos.iter().map(|tp| tp.photo.id).collect();
    assert_eq!(ids.len(), MAX_TAXON_PHOTOS);

    let default_photo = to_json(&details.default_photo.unwrap());
    assert_eq!(default_photo["id"], 1000);
    assert!(default_photo.contains_key("square_url"));
    assert!(default_photo.contains_key("medium_url"));
    assert!(!default_photo.contains_key("large_url"));
    assert!(!default_photo.contains_key("small_url"));
  }

  #[tokio::test]
  async fn descendant_photos_fill_up_to_the_cap() {
    let mut taxon = species();
    for i in 0..25 {
      taxon.taxon_photos.push(TaxonPhoto {
        id:       100 + i,
        position: Some(i as i32),
        photo:    Some(photo(1000 + i)),
      });
    }
    // One photo the taxon already has, then ten new ones.
    let mut store = FakeSource::default()
      .with_descendant_photo(taxon.id, 48663, 1000);
    for i in 0..10 {
      store = store.with_descendant_photo(taxon.id, 48663, 2000 + i);
    }
    let enrichment = prepare_taxa(&store, std::slice::from_ref(&taxon))
      .await
      .unwrap();
    assert_eq!(enrichment.descendant_photos(taxon.id).len(), 11);

    let photos = full(&taxon, &enrichment).details.unwrap().taxon_photos;
    assert_eq!(photos.len(), MAX_TAXON_PHOTOS);
    let ids: Vec<i64> = photos.iter().map(|tp| tp.photo.id).collect();
    assert_eq!(&ids[..25], (1000..1025).collect::<Vec<i64>>().as_slice());
    assert_eq!(&ids[25..], &[2000, 2001, 2002, 2003, 2004]);
    assert!(photos[..25].iter().all(|tp| tp.taxon_id == taxon.id));
    assert!(photos[25..].iter().all(|tp| tp.taxon_id == 48663));
  }

  #[test]
  fn projection_is_deterministic() {
    let mut taxon = species();
    taxon.listed_taxa =
      vec![listed(1, Some(3), true), listed(2, Some(1), true)];
    let projector = Projector::utc(Some(LIFE));
    let render = || {
      let doc =
        projector.taxon(&taxon, IndexContext::TAXON, &Enrichment::empty());
      serde_json::to_string(&doc).unwrap()
    };
    assert_eq!(render(), render());
  }

  // ── Identifications ────────────────────────────────────────────────────

  fn project(
    projector: Projector,
    ident: &Identification,
  ) -> IdentificationDocument {
    let ctx = IndexContext::default();
    projector.identification(ident, ctx, &Enrichment::empty())
  }

  #[test]
  fn own_observation_and_current_taxon_flags() {
    let projector = Projector::utc(Some(LIFE));
    let obs = observation(10, 1, Some(52775));

    let both = identification(1, 1, 52775, Some(obs.clone()));
    let fields = project(projector, &both).observation_fields.unwrap();
    assert!(fields.own_observation);
    assert!(fields.current_taxon);

    let other_user = identification(2, 2, 52775, Some(obs.clone()));
    let fields = project(projector, &other_user).observation_fields.unwrap();
    assert!(!fields.own_observation);
    assert!(fields.current_taxon);

    let other_taxon = identification(3, 1, 1, Some(obs));
    let fields = project(projector, &other_taxon).observation_fields.unwrap();
    assert!(fields.own_observation);
    assert!(!fields.current_taxon);
  }

  #[test]
  fn identification_without_observation_has_no_nested_fields() {
    let ident = identification(1, 1, 52775, None);
    let doc = to_json(&project(Projector::default(), &ident));
    for key in ["own_observation", "current_taxon", "taxon", "observation"] {
      assert!(!doc.contains_key(key), "{key} should be absent");
    }
    for key in [
      "id",
      "uuid",
      "user",
      "created_at",
      "created_at_details",
      "body",
      "category",
      "current",
    ] {
      assert!(doc.contains_key(key), "missing {key}");
    }
  }

  #[test]
  fn nested_documents_are_detail_suppressed_identification_context() {
    let projector = Projector::utc(Some(LIFE));
    let obs = observation(10, 1, Some(52775));
    let ident = identification(1, 1, 52775, Some(obs));
    let doc = to_json(&project(projector, &ident));

    let taxon = doc["taxon"].as_object().unwrap();
    assert!(!taxon.contains_key("names"));
    assert!(!taxon.contains_key("place_ids"));
    assert!(taxon.contains_key("min_species_ancestors"));
    let ancestor_ids = taxon["ancestor_ids"].as_array().unwrap();
    assert!(!ancestor_ids.contains(&Value::from(LIFE)));

    let obs_taxon = doc["observation"]["taxon"].as_object().unwrap();
    assert!(!obs_taxon.contains_key("min_species_ancestors"));
    assert!(!obs_taxon.contains_key("names"));
    assert_eq!(doc["observation"]["user"]["login"], "user1");
    assert!(doc["observation"].get("place_ids").is_none());
  }

  #[tokio::test]
  async fn nested_observation_uses_batch_places() {
    let obs = observation(10, 1, Some(52775));
    let ident = identification(1, 1, 52775, Some(obs));
    let store = FakeSource::default().with_observation_places(&[(10, 77)]);
    let enrichment =
      prepare_identifications(&store, std::slice::from_ref(&ident))
        .await
        .unwrap();
    let doc = Projector::default().identification(
      &ident,
      IndexContext::default(),
      &enrichment,
    );
    let observation = doc.observation_fields.unwrap().observation;
    assert_eq!(observation.place_ids, Some(vec![77]));
  }

  #[test]
  fn no_details_identification_skips_nested_fields() {
    let obs = observation(10, 1, Some(52775));
    let ident = identification(1, 1, 52775, Some(obs));
    let doc = Projector::default().identification(
      &ident,
      IndexContext::TAXON.without_details(),
      &Enrichment::empty(),
    );
    assert!(doc.observation_fields.is_none());
  }

  #[test]
  fn created_at_details_use_observation_time_zone() {
    let mut obs = observation(10, 1, Some(52775));
    // 2019-06-30T22:00:00Z is already July 1st in India.
    obs.time_zone = Some("Asia/Kolkata".into());
    let mut ident = identification(1, 1, 52775, Some(obs));
    ident.created_at = "2019-06-30T22:00:00Z".parse().unwrap();

    let details = project(Projector::default(), &ident).created_at_details;
    assert_eq!(details.date, "2019-07-01");
    assert_eq!(details.hour, 3);

    ident.observation = None;
    let details = project(Projector::default(), &ident).created_at_details;
    assert_eq!(details.date, "2019-06-30");
    assert_eq!(details.hour, 22);
  }

  #[test]
  fn created_at_details_follow_daylight_saving_of_the_zone() {
    // Observed in Los Angeles in February, under PST (-08:00).
    let mut obs = observation(10, 1, Some(52775));
    obs.time_zone = Some("America/Los_Angeles".into());
    obs.created_at = "2019-02-20T18:00:00Z".parse().unwrap();
    let mut ident = identification(1, 1, 52775, Some(obs));
    // Identified after clocks sprang forward on 2019-03-10.
    ident.created_at = "2019-03-11T07:30:00Z".parse().unwrap();

    let details = project(Projector::default(), &ident).created_at_details;
    // 00:30 PDT on the 11th, not 23:30 on the 10th at the winter offset.
    assert_eq!(details.date, "2019-03-11");
    assert_eq!(details.hour, 0);
  }

  #[test]
  fn unknown_zone_falls_back_to_the_default() {
    let mut obs = observation(10, 1, Some(52775));
    obs.time_zone = Some("Mars/Olympus".into());
    let mut ident = identification(1, 1, 52775, Some(obs));
    ident.created_at = "2019-06-30T22:00:00Z".parse().unwrap();

    let tokyo = Projector::new(None, Tz::Asia__Tokyo);
    let details = project(tokyo, &ident).created_at_details;
    assert_eq!(details.date, "2019-07-01");
    assert_eq!(details.hour, 7);
  }

  #[tokio::test]
  async fn discover_asks_store_for_root_unless_overridden() {
    let store = FakeSource::default().with_root(LIFE);
    let found = Projector::discover(&store, None, Tz::UTC).await.unwrap();
    assert_eq!(found.root_taxon_id(), Some(LIFE));
    let forced = Projector::discover(&store, Some(1), Tz::UTC).await.unwrap();
    assert_eq!(forced.root_taxon_id(), Some(1));
  }
}
