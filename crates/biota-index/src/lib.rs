//! Search-index projection for biota.
//!
//! Turns loaded taxa and identifications into flat, denormalised documents
//! for a full-text/faceted search engine. A batch is processed in two
//! phases: [`enrich`] runs set-oriented auxiliary queries for the whole
//! batch, then [`projector`] builds one document per entity from the loaded
//! graph plus the resulting [`enrich::Enrichment`] side table. The
//! [`indexer`] drives both phases over a storage backend and writes the
//! documents to a [`sink::DocumentSink`].

pub mod dates;
pub mod document;
pub mod enrich;
pub mod error;
pub mod guard;
pub mod indexer;
pub mod projector;
pub mod sink;

pub use error::{Error, Result};
pub use indexer::{IndexStats, Indexer};
pub use projector::Projector;

#[cfg(test)]
pub(crate) mod fixtures;
