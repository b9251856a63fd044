//! The indexing context: from which relationship a document is being built,
//! and how much detail it should carry.

/// Controls which fields a projected document includes.
///
/// The default is a top-level taxon document with every detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexContext {
  /// Omit heavy nested collections. Used when the document is embedded in a
  /// parent document.
  pub no_details:         bool,
  /// Embedded under an observation document.
  pub for_observation:    bool,
  /// Embedded under an identification document.
  pub for_identification: bool,
}

impl IndexContext {
  /// A top-level taxon document.
  pub const TAXON: Self = Self {
    no_details:         false,
    for_observation:    false,
    for_identification: false,
  };

  pub const fn for_observation(self) -> Self {
    Self { for_observation: true, ..self }
  }

  pub const fn for_identification(self) -> Self {
    Self { for_identification: true, ..self }
  }

  pub const fn without_details(self) -> Self {
    Self { no_details: true, ..self }
  }

  /// Names and conservation statuses are included.
  pub const fn includes_names(self) -> bool { !self.no_details }

  /// Fields only meaningful on a standalone taxon document are included.
  pub const fn is_top_level(self) -> bool {
    !self.no_details && !self.for_observation
  }
}
