//! Ancestry resolution.
//!
//! Taxa store their position in the tree as an adjacency list (`parent_id`)
//! plus a materialised path (`ancestry`): the `/`-delimited ids from the root
//! down to the immediate parent. Search documents need that path flattened
//! into an id list that includes the taxon itself, a comma-joined string of
//! the same, and a "min species" variant truncated at species level so that
//! infraspecific taxa facet together with their species.

use serde::Serialize;

use crate::rank::is_below_species;

/// Separator used by the stored ancestry path.
pub const STORED_SEPARATOR: char = '/';

/// Separator used by the indexed ancestry strings.
pub const INDEXED_SEPARATOR: &str = ",";

/// Parse a stored ancestry path into ancestor ids, root first.
///
/// Empty segments are ignored. Segments that are not integers are skipped and
/// logged; a malformed path never fails a document build.
pub fn parse_ancestry(path: Option<&str>) -> Vec<i64> {
  let Some(path) = path else {
    return Vec::new();
  };
  path
    .split(STORED_SEPARATOR)
    .map(str::trim)
    .filter(|segment| !segment.is_empty())
    .filter_map(|segment| match segment.parse::<i64>() {
      Ok(id) => Some(id),
      Err(e) => {
        tracing::warn!(
          ancestry = path,
          segment,
          error = %e,
          "skipping malformed ancestry segment"
        );
        None
      }
    })
    .collect()
}

/// Join ids with the indexed separator.
pub fn join_ids(ids: &[i64]) -> String {
  ids
    .iter()
    .map(i64::to_string)
    .collect::<Vec<_>>()
    .join(INDEXED_SEPARATOR)
}

/// Reference to an ancestor, as nested in `min_species_ancestors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AncestorRef {
  pub id: i64,
}

/// The resolved, index-ready ancestry of one taxon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
  /// Root-to-self ids. Always ends with the taxon's own id.
  pub ancestor_ids:         Vec<i64>,
  /// `ancestor_ids` joined with commas.
  pub ancestry:             String,
  /// `ancestry` with the taxon itself dropped when it ranks below species.
  pub min_species_ancestry: String,
}

impl Lineage {
  /// Resolve the lineage of taxon `id`.
  ///
  /// `excluded_root`, when given, is removed from the ancestor list before the
  /// joined strings are derived. The taxon's own id is never removed.
  pub fn resolve(
    id: i64,
    ancestry: Option<&str>,
    rank_level: Option<f64>,
    excluded_root: Option<i64>,
  ) -> Self {
    let mut ancestor_ids = parse_ancestry(ancestry);
    if let Some(root) = excluded_root {
      ancestor_ids.retain(|&ancestor| ancestor != root);
    }
    ancestor_ids.push(id);

    let ancestry = join_ids(&ancestor_ids);
    let min_species_ancestry = if is_below_species(rank_level) {
      join_ids(&ancestor_ids[..ancestor_ids.len() - 1])
    } else {
      ancestry.clone()
    };

    Self { ancestor_ids, ancestry, min_species_ancestry }
  }

  /// The ids of `min_species_ancestry` as nested references.
  pub fn min_species_ancestors(&self) -> Vec<AncestorRef> {
    self
      .min_species_ancestry
      .split(INDEXED_SEPARATOR)
      .filter_map(|id| id.parse().ok())
      .map(|id| AncestorRef { id })
      .collect()
  }

  pub fn has_ancestor(&self, id: i64) -> bool { self.ancestor_ids.contains(&id) }

  /// The taxon's own id.
  pub fn taxon_id(&self) -> i64 {
    // `resolve` always pushes the taxon's id last.
    self.ancestor_ids[self.ancestor_ids.len() - 1]
  }
}
