//! In-memory `IndexSource` and entity builders for tests.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use biota_core::{
  identification::{Category, Identification},
  observation::{Observation, QualityGrade, User},
  rank::Rank,
  store::IndexSource,
  taxon::{ConservationStatus, DescendantPhoto, Photo, Taxon, TaxonName},
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

/// Id of the universal root taxon in fixtures.
pub const LIFE: i64 = 48460;

#[derive(Debug, thiserror::Error)]
#[error("fake store failure")]
pub struct FakeError;

/// A store whose loaded taxa may disagree with its authoritative names, to
/// exercise the consistency guard.
#[derive(Default)]
pub struct FakeSource {
  pub taxa:                   Vec<Taxon>,
  pub identifications:        Vec<Identification>,
  pub names:                  HashMap<i64, Vec<TaxonName>>,
  pub listed_places:          Vec<(i64, i64)>,
  pub observation_places:     Vec<(i64, i64)>,
  pub descendant_photos:      Vec<DescendantPhoto>,
  pub root:                   Option<i64>,
  pub fail_place_queries:     bool,
  pub fail_counts:            bool,
  pub fail_reloads:           bool,
  pub place_queries:          AtomicUsize,
  pub photo_queries:          AtomicUsize,
  pub counts:                 AtomicUsize,
  pub reloads:                AtomicUsize,
  pub last_observation_query: Mutex<Vec<i64>>,
  pub last_photo_query:       Mutex<Vec<i64>>,
}

impl FakeSource {
  pub fn with_taxa(mut self, taxa: Vec<Taxon>) -> Self {
    for taxon in &taxa {
      self.names.entry(taxon.id).or_insert_with(|| taxon.names.clone());
    }
    self.taxa = taxa;
    self
  }

  pub fn with_identifications(mut self, identifications: Vec<Identification>) -> Self {
    self.identifications = identifications;
    self
  }

  /// Authoritative names for `taxon_id`.
  pub fn with_names(mut self, taxon_id: i64, names: Vec<TaxonName>) -> Self {
    self.names.insert(taxon_id, names);
    self
  }

  pub fn with_listed_places(mut self, pairs: &[(i64, i64)]) -> Self {
    self.listed_places = pairs.to_vec();
    self
  }

  pub fn with_observation_places(mut self, pairs: &[(i64, i64)]) -> Self {
    self.observation_places = pairs.to_vec();
    self
  }

  /// A photo of `taxon_id`, reachable as a descendant of `ancestor_id`.
  pub fn with_descendant_photo(
    mut self,
    ancestor_id: i64,
    taxon_id: i64,
    photo_id: i64,
  ) -> Self {
    self.descendant_photos.push(DescendantPhoto {
      ancestor_id,
      taxon_id,
      photo: photo(photo_id),
    });
    self
  }

  pub fn with_root(mut self, root: i64) -> Self {
    self.root = Some(root);
    self
  }

  pub fn failing_place_queries(mut self) -> Self {
    self.fail_place_queries = true;
    self
  }

  pub fn failing_counts(mut self) -> Self {
    self.fail_counts = true;
    self
  }

  pub fn failing_reloads(mut self) -> Self {
    self.fail_reloads = true;
    self
  }
}

fn matching(pairs: &[(i64, i64)], ids: &[i64]) -> Vec<(i64, i64)> {
  pairs.iter().copied().filter(|(owner, _)| ids.contains(owner)).collect()
}

impl IndexSource for FakeSource {
  type Error = FakeError;

  async fn load_taxa(&self, ids: &[i64]) -> Result<Vec<Taxon>, FakeError> {
    Ok(self.taxa.iter().filter(|t| ids.contains(&t.id)).cloned().collect())
  }

  async fn load_identifications(
    &self,
    ids: &[i64],
  ) -> Result<Vec<Identification>, FakeError> {
    Ok(
      self
        .identifications
        .iter()
        .filter(|i| ids.contains(&i.id))
        .cloned()
        .collect(),
    )
  }

  async fn listed_place_pairs(
    &self,
    taxon_ids: &[i64],
  ) -> Result<Vec<(i64, i64)>, FakeError> {
    self.place_queries.fetch_add(1, Ordering::SeqCst);
    if self.fail_place_queries {
      return Err(FakeError);
    }
    Ok(matching(&self.listed_places, taxon_ids))
  }

  async fn observation_place_pairs(
    &self,
    observation_ids: &[i64],
  ) -> Result<Vec<(i64, i64)>, FakeError> {
    self.place_queries.fetch_add(1, Ordering::SeqCst);
    if self.fail_place_queries {
      return Err(FakeError);
    }
    *self.last_observation_query.lock().unwrap() = observation_ids.to_vec();
    Ok(matching(&self.observation_places, observation_ids))
  }

  async fn descendant_photos(
    &self,
    taxon_ids: &[i64],
    limit: usize,
  ) -> Result<Vec<DescendantPhoto>, FakeError> {
    self.photo_queries.fetch_add(1, Ordering::SeqCst);
    *self.last_photo_query.lock().unwrap() = taxon_ids.to_vec();
    let mut per_ancestor: HashMap<i64, usize> = HashMap::new();
    Ok(
      self
        .descendant_photos
        .iter()
        .filter(|dp| taxon_ids.contains(&dp.ancestor_id))
        .filter(|dp| {
          let taken = per_ancestor.entry(dp.ancestor_id).or_default();
          *taken += 1;
          *taken <= limit
        })
        .cloned()
        .collect(),
    )
  }

  async fn count_taxon_names(
    &self,
    taxon_ids: &[i64],
  ) -> Result<Vec<(i64, usize)>, FakeError> {
    self.counts.fetch_add(1, Ordering::SeqCst);
    if self.fail_counts {
      return Err(FakeError);
    }
    Ok(
      taxon_ids
        .iter()
        .filter_map(|id| self.names.get(id).map(|names| (*id, names.len())))
        .filter(|(_, count)| *count > 0)
        .collect(),
    )
  }

  async fn reload_taxon_names(
    &self,
    taxon_id: i64,
  ) -> Result<Vec<TaxonName>, FakeError> {
    self.reloads.fetch_add(1, Ordering::SeqCst);
    if self.fail_reloads {
      return Err(FakeError);
    }
    Ok(self.names.get(&taxon_id).cloned().unwrap_or_default())
  }

  async fn taxon_ids_after(
    &self,
    after: i64,
    limit: usize,
  ) -> Result<Vec<i64>, FakeError> {
    let mut ids: Vec<i64> =
      self.taxa.iter().map(|t| t.id).filter(|id| *id > after).collect();
    ids.sort_unstable();
    ids.truncate(limit);
    Ok(ids)
  }

  async fn identification_ids_after(
    &self,
    after: i64,
    limit: usize,
  ) -> Result<Vec<i64>, FakeError> {
    let mut ids: Vec<i64> = self
      .identifications
      .iter()
      .map(|i| i.id)
      .filter(|id| *id > after)
      .collect();
    ids.sort_unstable();
    ids.truncate(limit);
    Ok(ids)
  }

  async fn root_taxon_id(&self) -> Result<Option<i64>, FakeError> { Ok(self.root) }
}

// ─── Builders ────────────────────────────────────────────────────────────────

pub fn name(id: i64, name: &str, is_valid: bool, position: i32) -> TaxonName {
  TaxonName {
    id,
    name: name.into(),
    locale: Some("en".into()),
    lexicon: Some("english".into()),
    is_valid,
    position,
  }
}

pub fn photo(id: i64) -> Photo {
  Photo {
    id,
    user_id: Some(1),
    license_code: Some("cc-by".into()),
    attribution: Some("(c) someone".into()),
    native_page_url: None,
    square_url: Some(format!("https://photos.example/{id}/square.jpg")),
    small_url: Some(format!("https://photos.example/{id}/small.jpg")),
    medium_url: Some(format!("https://photos.example/{id}/medium.jpg")),
    large_url: Some(format!("https://photos.example/{id}/large.jpg")),
    original_url: None,
  }
}

/// Danaus plexippus, under Life.
pub fn species() -> Taxon {
  let mut taxon = Taxon::new(48662, "Danaus plexippus", Rank::Species);
  taxon.parent_id = Some(48661);
  taxon.ancestry = Some(format!("{LIFE}/1/47120/372739/47158/47157/47922/48661"));
  taxon.iconic_taxon_id = Some(47158);
  taxon.observations_count = 1_204;
  taxon.names = vec![
    name(1, "Danaus plexippus", true, 0),
    name(2, "Monarch", true, 1),
  ];
  taxon.conservation_statuses = vec![ConservationStatus {
    id:         1,
    place_id:   None,
    status:     "VU".into(),
    authority:  Some("IUCN Red List".into()),
    iucn:       Some(30),
    geoprivacy: None,
  }];
  taxon
}

/// A taxon at `rank` with a plain ancestry path.
pub fn taxon(id: i64, rank: Rank, ancestry: &str) -> Taxon {
  let mut taxon = Taxon::new(id, format!("Taxon {id}"), rank);
  taxon.ancestry = Some(ancestry.into());
  taxon.parent_id = ancestry.rsplit('/').next().and_then(|s| s.parse().ok());
  taxon
}

pub fn user(id: i64) -> User {
  User { id, login: format!("user{id}"), name: None }
}

pub fn observation(id: i64, user_id: i64, taxon_id: Option<i64>) -> Observation {
  let taxon = taxon_id.map(|tid| {
    let mut t = species();
    t.id = tid;
    t
  });
  Observation {
    id,
    uuid: Uuid::from_u128(id as u128),
    user_id,
    user: Some(user(user_id)),
    taxon_id,
    taxon,
    quality_grade: QualityGrade::NeedsId,
    time_zone: None,
    created_at: Utc.with_ymd_and_hms(2019, 6, 1, 12, 0, 0).unwrap(),
  }
}

pub fn identification(
  id: i64,
  user_id: i64,
  taxon_id: i64,
  observation: Option<Observation>,
) -> Identification {
  let mut taxon = species();
  taxon.id = taxon_id;
  Identification {
    id,
    uuid: Uuid::from_u128(1_000 + id as u128),
    user_id,
    user: Some(user(user_id)),
    taxon_id,
    taxon: Some(taxon),
    observation,
    body: Some("Looks like a monarch to me".into()),
    category: Some(Category::Improving),
    current: true,
    created_at: Utc.with_ymd_and_hms(2019, 6, 2, 9, 30, 0).unwrap(),
  }
}
