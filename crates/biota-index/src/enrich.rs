//! Batch enrichment.
//!
//! Before any document in a batch is built, the auxiliary data every entity
//! in it needs is fetched with one set-oriented query per kind and kept in an
//! [`Enrichment`] side table keyed by entity id. Entities themselves are left
//! untouched, so a batch can be re-enriched freely.

use std::collections::{BTreeSet, HashMap, HashSet};

use biota_core::{
  identification::Identification,
  observation::Observation,
  store::IndexSource,
  taxon::{DescendantPhoto, Taxon},
};

use crate::{Error, Result, projector::MAX_TAXON_PHOTOS};

/// Per-batch auxiliary data, keyed by entity id.
///
/// An id mapped to an empty set was looked up and had no matches; an id with
/// no entry at all was never looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
  taxon_place_ids:       HashMap<i64, BTreeSet<i64>>,
  taxon_name_counts:     HashMap<i64, usize>,
  descendant_photos:     HashMap<i64, Vec<DescendantPhoto>>,
  observation_place_ids: HashMap<i64, BTreeSet<i64>>,
}

impl Enrichment {
  /// A table with nothing looked up.
  pub fn empty() -> Self { Self::default() }

  pub fn taxon_place_ids(&self, taxon_id: i64) -> Option<&BTreeSet<i64>> {
    self.taxon_place_ids.get(&taxon_id)
  }

  /// Authoritative name count, if it was looked up.
  pub fn taxon_name_count(&self, taxon_id: i64) -> Option<usize> {
    self.taxon_name_counts.get(&taxon_id).copied()
  }

  /// Photos of the taxon's descendants, in backfill order.
  pub fn descendant_photos(&self, taxon_id: i64) -> &[DescendantPhoto] {
    self
      .descendant_photos
      .get(&taxon_id)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  pub fn observation_place_ids(
    &self,
    observation_id: i64,
  ) -> Option<&BTreeSet<i64>> {
    self.observation_place_ids.get(&observation_id)
  }
}

/// What to batch-load for observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservationEnrichment {
  pub places: bool,
}

// ─── Taxa ────────────────────────────────────────────────────────────────────

/// Load everything a batch of standalone taxon documents needs: listed-taxon
/// place ids, authoritative name counts, and descendant photos for taxa with
/// fewer than [`MAX_TAXON_PHOTOS`] of their own. One query per kind.
///
/// A failed name count is logged and leaves the counts unset, so the guard
/// skips its check instead of failing the batch.
pub async fn prepare_taxa<S: IndexSource>(
  store: &S,
  taxa: &[Taxon],
) -> Result<Enrichment> {
  if taxa.is_empty() {
    return Ok(Enrichment::empty());
  }
  let ids: Vec<i64> = taxa.iter().map(|t| t.id).collect();

  let mut taxon_place_ids: HashMap<i64, BTreeSet<i64>> =
    ids.iter().map(|&id| (id, BTreeSet::new())).collect();
  let pairs = store.listed_place_pairs(&ids).await.map_err(Error::store)?;
  tracing::debug!(
    taxa = ids.len(),
    placements = pairs.len(),
    "loaded taxon places"
  );
  fill(&mut taxon_place_ids, pairs);

  let taxon_name_counts = match store.count_taxon_names(&ids).await {
    Ok(counts) => {
      let mut table: HashMap<i64, usize> =
        ids.iter().map(|&id| (id, 0)).collect();
      for (taxon_id, count) in counts {
        if let Some(slot) = table.get_mut(&taxon_id) {
          *slot = count;
        }
      }
      table
    }
    Err(e) => {
      tracing::warn!(
        taxa = ids.len(),
        error = %e,
        "could not count taxon names; guard will skip this batch"
      );
      HashMap::new()
    }
  };

  let sparse: Vec<i64> = taxa
    .iter()
    .filter(|t| distinct_photo_count(t) < MAX_TAXON_PHOTOS)
    .map(|t| t.id)
    .collect();
  let mut descendant_photos: HashMap<i64, Vec<DescendantPhoto>> =
    sparse.iter().map(|&id| (id, Vec::new())).collect();
  if !sparse.is_empty() {
    let photos = store
      .descendant_photos(&sparse, MAX_TAXON_PHOTOS)
      .await
      .map_err(Error::store)?;
    tracing::debug!(
      taxa = sparse.len(),
      photos = photos.len(),
      "loaded descendant photos"
    );
    for photo in photos {
      if let Some(backfill) = descendant_photos.get_mut(&photo.ancestor_id) {
        backfill.push(photo);
      }
    }
  }

  Ok(Enrichment {
    taxon_place_ids,
    taxon_name_counts,
    descendant_photos,
    ..Enrichment::default()
  })
}

fn distinct_photo_count(taxon: &Taxon) -> usize {
  taxon
    .photos_in_order()
    .iter()
    .map(|(_, photo)| photo.id)
    .collect::<HashSet<_>>()
    .len()
}

// ─── Observations ────────────────────────────────────────────────────────────

/// Batch-load the requested auxiliary data for `observations`.
pub async fn prepare_observations<S: IndexSource>(
  store: &S,
  observations: &[&Observation],
  wanted: ObservationEnrichment,
) -> Result<Enrichment> {
  if !wanted.places {
    return Ok(Enrichment::empty());
  }

  let ids: Vec<i64> = observations.iter().map(|o| o.id).collect();
  let mut observation_place_ids: HashMap<i64, BTreeSet<i64>> =
    ids.iter().map(|&id| (id, BTreeSet::new())).collect();

  if !ids.is_empty() {
    let pairs = store
      .observation_place_pairs(&ids)
      .await
      .map_err(Error::store)?;
    tracing::debug!(
      observations = ids.len(),
      places = pairs.len(),
      "loaded observation places"
    );
    fill(&mut observation_place_ids, pairs);
  }

  Ok(Enrichment { observation_place_ids, ..Enrichment::default() })
}

// ─── Identifications ─────────────────────────────────────────────────────────

/// Enrich the observations the identifications belong to, so their embedded
/// observation documents reuse one batched place lookup.
pub async fn prepare_identifications<S: IndexSource>(
  store: &S,
  identifications: &[Identification],
) -> Result<Enrichment> {
  let mut seen = HashSet::new();
  let observations: Vec<&Observation> = identifications
    .iter()
    .filter_map(|i| i.observation.as_ref())
    .filter(|o| seen.insert(o.id))
    .collect();

  prepare_observations(store, &observations, ObservationEnrichment {
    places: true,
  })
  .await
}

/// Add each `(owner, place)` pair to the owner's set. Pairs for owners outside
/// the batch are ignored.
fn fill(table: &mut HashMap<i64, BTreeSet<i64>>, pairs: Vec<(i64, i64)>) {
  for (owner, place) in pairs {
    if let Some(places) = table.get_mut(&owner) {
      places.insert(place);
    }
  }
}
