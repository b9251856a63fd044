//! The batch-indexing driver.
//!
//! Each batch goes through the same phases: load the entities with their
//! load set, enrich the whole batch (including the name counts the guard
//! checks against), then project and send one document per entity.
//! Enrichment always finishes before the first document of its batch is
//! built. A storage or sink failure abandons the call; there is no partial
//! retry.

use std::sync::Arc;

use biota_core::{context::IndexContext, store::IndexSource};

use crate::{
  Error, Result,
  enrich::{prepare_identifications, prepare_taxa},
  guard::{GuardOutcome, ensure_names},
  projector::Projector,
  sink::DocumentSink,
};

pub const DEFAULT_BATCH_SIZE: usize = 500;

pub const TAXA_INDEX: &str = "taxa";
pub const IDENTIFICATIONS_INDEX: &str = "identifications";

/// Counters for one indexing call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
  pub batches:        usize,
  pub documents:      usize,
  /// Taxa whose names had to be reloaded by the consistency guard.
  pub names_reloaded: usize,
}

impl std::ops::AddAssign for IndexStats {
  fn add_assign(&mut self, other: Self) {
    self.batches += other.batches;
    self.documents += other.documents;
    self.names_reloaded += other.names_reloaded;
  }
}

pub struct Indexer<S, K> {
  store:      Arc<S>,
  sink:       K,
  projector:  Projector,
  batch_size: usize,
}

impl<S, K> Indexer<S, K>
where
  S: IndexSource,
  K: DocumentSink,
{
  pub fn new(store: Arc<S>, sink: K, projector: Projector) -> Self {
    Self { store, sink, projector, batch_size: DEFAULT_BATCH_SIZE }
  }

  /// Override the batch size. Zero is treated as one.
  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size.max(1);
    self
  }

  pub fn batch_size(&self) -> usize { self.batch_size }

  pub fn sink(&self) -> &K { &self.sink }

  pub fn into_sink(self) -> K { self.sink }

  // ── Taxa ──────────────────────────────────────────────────────────────

  /// Index the given taxa, in batches.
  pub async fn index_taxa(&mut self, ids: &[i64]) -> Result<IndexStats> {
    let mut stats = IndexStats::default();
    for batch in ids.chunks(self.batch_size) {
      stats += self.index_taxon_batch(batch).await?;
    }
    self.sink.flush()?;
    Ok(stats)
  }

  /// Walk every taxon in id order and index it.
  pub async fn reindex_all_taxa(&mut self) -> Result<IndexStats> {
    let mut stats = IndexStats::default();
    let mut cursor = 0;
    loop {
      let ids = self
        .store
        .taxon_ids_after(cursor, self.batch_size)
        .await
        .map_err(Error::store)?;
      let Some(&last) = ids.last() else { break };
      stats += self.index_taxon_batch(&ids).await?;
      cursor = last;
    }
    self.sink.flush()?;
    tracing::info!(
      batches = stats.batches,
      documents = stats.documents,
      names_reloaded = stats.names_reloaded,
      "taxa reindexed"
    );
    Ok(stats)
  }

  async fn index_taxon_batch(&mut self, ids: &[i64]) -> Result<IndexStats> {
    let mut taxa = self.store.load_taxa(ids).await.map_err(Error::store)?;
    let enrichment = prepare_taxa(self.store.as_ref(), &taxa).await?;

    let mut stats = IndexStats { batches: 1, ..IndexStats::default() };
    for taxon in &mut taxa {
      let outcome = ensure_names(
        self.store.as_ref(),
        taxon,
        IndexContext::TAXON,
        &enrichment,
      )
      .await;
      if matches!(outcome, GuardOutcome::Reloaded { .. }) {
        stats.names_reloaded += 1;
      }
      let document =
        self.projector.taxon(taxon, IndexContext::TAXON, &enrichment);
      self
        .sink
        .send(TAXA_INDEX, taxon.id, &serde_json::to_value(&document)?)?;
      stats.documents += 1;
    }

    tracing::debug!(
      requested = ids.len(),
      indexed = stats.documents,
      "taxon batch indexed"
    );
    Ok(stats)
  }

  // ── Identifications ───────────────────────────────────────────────────

  pub async fn index_identifications(&mut self, ids: &[i64]) -> Result<IndexStats> {
    let mut stats = IndexStats::default();
    for batch in ids.chunks(self.batch_size) {
      stats += self.index_identification_batch(batch).await?;
    }
    self.sink.flush()?;
    Ok(stats)
  }

  pub async fn reindex_all_identifications(&mut self) -> Result<IndexStats> {
    let mut stats = IndexStats::default();
    let mut cursor = 0;
    loop {
      let ids = self
        .store
        .identification_ids_after(cursor, self.batch_size)
        .await
        .map_err(Error::store)?;
      let Some(&last) = ids.last() else { break };
      stats += self.index_identification_batch(&ids).await?;
      cursor = last;
    }
    self.sink.flush()?;
    tracing::info!(
      batches = stats.batches,
      documents = stats.documents,
      "identifications reindexed"
    );
    Ok(stats)
  }

  async fn index_identification_batch(&mut self, ids: &[i64]) -> Result<IndexStats> {
    let identifications = self
      .store
      .load_identifications(ids)
      .await
      .map_err(Error::store)?;
    let enrichment =
      prepare_identifications(self.store.as_ref(), &identifications).await?;

    let mut stats = IndexStats { batches: 1, ..IndexStats::default() };
    for identification in &identifications {
      let document =
        self
          .projector
          .identification(identification, IndexContext::default(), &enrichment);
      self.sink.send(
        IDENTIFICATIONS_INDEX,
        identification.id,
        &serde_json::to_value(&document)?,
      )?;
      stats.documents += 1;
    }

    tracing::debug!(
      requested = ids.len(),
      indexed = stats.documents,
      "identification batch indexed"
    );
    Ok(stats)
  }
}
