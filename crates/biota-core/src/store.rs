//! The `IndexSource` trait: the read-only storage surface the indexer needs.
//!
//! The trait is implemented by storage backends (e.g. `biota-store-sqlite`).
//! The projection layer depends on this abstraction, never on a concrete
//! backend.

use std::future::Future;

use crate::{
  identification::Identification,
  taxon::{DescendantPhoto, Taxon, TaxonName},
};

/// Abstraction over the relational store the index is projected from.
///
/// Every method is a read. Bulk methods take a whole batch of ids so that a
/// backend can answer them with one set-oriented query.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait IndexSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entity loads ──────────────────────────────────────────────────────

  /// Load taxa with their full indexing load set: names, conservation
  /// statuses, photos, colors, listed taxa and atlas. Missing ids are
  /// skipped.
  fn load_taxa<'a>(
    &'a self,
    ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<Taxon>, Self::Error>> + Send + 'a;

  /// Load identifications with their user, taxon, and observation (which in
  /// turn carries its own user and taxon). Missing ids are skipped.
  fn load_identifications<'a>(
    &'a self,
    ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<Identification>, Self::Error>> + Send + 'a;

  // ── Bulk auxiliary queries ────────────────────────────────────────────

  /// `(taxon_id, place_id)` for every listed-taxon placement of the given
  /// taxa whose place exists.
  fn listed_place_pairs<'a>(
    &'a self,
    taxon_ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<(i64, i64)>, Self::Error>> + Send + 'a;

  /// `(observation_id, place_id)` for every place containing one of the
  /// given observations.
  fn observation_place_pairs<'a>(
    &'a self,
    observation_ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<(i64, i64)>, Self::Error>> + Send + 'a;

  /// Photos attached to active descendants of each given taxon, matched by
  /// ancestry prefix. At most `limit` per taxon, most observed descendants
  /// first.
  fn descendant_photos<'a>(
    &'a self,
    taxon_ids: &'a [i64],
    limit: usize,
  ) -> impl Future<Output = Result<Vec<DescendantPhoto>, Self::Error>> + Send + 'a;

  // ── Authoritative association reads ───────────────────────────────────

  /// `(taxon_id, count)` of names per taxon, straight from storage and
  /// bypassing anything already loaded. Taxa with no names may be omitted.
  fn count_taxon_names<'a>(
    &'a self,
    taxon_ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<(i64, usize)>, Self::Error>> + Send + 'a;

  /// Fetch a taxon's names fresh from storage.
  fn reload_taxon_names(
    &self,
    taxon_id: i64,
  ) -> impl Future<Output = Result<Vec<TaxonName>, Self::Error>> + Send + '_;

  // ── Batch iteration ───────────────────────────────────────────────────

  /// Up to `limit` taxon ids greater than `after`, ascending.
  fn taxon_ids_after(
    &self,
    after: i64,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  /// Up to `limit` identification ids greater than `after`, ascending.
  fn identification_ids_after(
    &self,
    after: i64,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  // ── Reference rows ────────────────────────────────────────────────────

  /// The id of the universal root taxon ("Life"), if the taxonomy has one.
  fn root_taxon_id(
    &self,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;
}
