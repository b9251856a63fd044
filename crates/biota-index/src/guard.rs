//! Consistency guard for a taxon's loaded names.
//!
//! Eager loading occasionally hands over a taxon with only part of its name
//! collection, which would silently index a taxon that cannot be found by
//! some of its names. Before a standalone taxon document is built, the loaded
//! names are compared against the authoritative count that
//! [`prepare_taxa`](crate::enrich::prepare_taxa) fetched for the whole batch.
//! On mismatch the anomaly is logged, the names are reloaded once, and
//! projection proceeds with whatever the reload returned. Nothing here ever
//! fails a projection.

use std::backtrace::Backtrace;

use biota_core::{
  context::IndexContext,
  store::IndexSource,
  taxon::{Taxon, TaxonName},
};

use crate::enrich::Enrichment;

/// Frames of backtrace kept in the anomaly log.
pub const BACKTRACE_LINES: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
  /// Loaded names matched the authoritative count.
  InSync,
  /// Names were out of sync and have been reloaded.
  Reloaded { before: usize, after: usize },
  /// The check was skipped for this context, or the store could not answer.
  Unchecked,
}

/// Compare the loaded name collection against the store's count.
pub fn names_in_sync(taxon: &Taxon, authoritative: usize) -> bool {
  authoritative == taxon.names.len()
}

/// Check `taxon`'s names and reload them once if they are out of sync.
///
/// Only standalone taxon documents are checked, and only when the batch
/// enrichment carries a count for the taxon. The reloaded collection is not
/// re-checked.
pub async fn ensure_names<S: IndexSource>(
  store: &S,
  taxon: &mut Taxon,
  ctx: IndexContext,
  enrichment: &Enrichment,
) -> GuardOutcome {
  if !ctx.is_top_level() {
    return GuardOutcome::Unchecked;
  }
  let Some(authoritative) = enrichment.taxon_name_count(taxon.id) else {
    tracing::debug!(taxon_id = taxon.id, "no name count; skipping guard");
    return GuardOutcome::Unchecked;
  };

  if names_in_sync(taxon, authoritative) {
    GuardOutcome::InSync
  } else {
    reload(store, taxon).await
  }
}

async fn reload<S: IndexSource>(store: &S, taxon: &mut Taxon) -> GuardOutcome {
  let before = taxon.names.len();
  let names_before = list_names(&taxon.names);

  match store.reload_taxon_names(taxon.id).await {
    Ok(names) => {
      taxon.names = names;
      tracing::error!(
        taxon_id = taxon.id,
        cause = "taxon names out of sync",
        loaded = before,
        reloaded = taxon.names.len(),
        names_before = %names_before,
        names_after = %list_names(&taxon.names),
        backtrace = %bounded_backtrace(BACKTRACE_LINES),
        "taxon indexed with stale names; reloaded"
      );
      GuardOutcome::Reloaded { before, after: taxon.names.len() }
    }
    Err(e) => {
      tracing::error!(
        taxon_id = taxon.id,
        cause = "taxon names out of sync",
        loaded = before,
        names_before = %names_before,
        error = %e,
        backtrace = %bounded_backtrace(BACKTRACE_LINES),
        "taxon names out of sync and reload failed; indexing loaded names"
      );
      GuardOutcome::Unchecked
    }
  }
}

fn list_names(names: &[TaxonName]) -> String {
  names
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("\n")
}

/// The current backtrace, cut to its first `lines` lines.
fn bounded_backtrace(lines: usize) -> String {
  let full = Backtrace::force_capture().to_string();
  let mut kept: Vec<&str> = full.lines().take(lines).collect();
  if full.lines().nth(lines).is_some() {
    kept.push("...");
  }
  kept.join("\n")
}
