//! Core types and trait definitions for the biota search-index projection.
//!
//! This crate is deliberately free of database and search-engine
//! dependencies. It describes the entities that get indexed, how a taxon's
//! ancestry is resolved, and the storage surface the indexer reads through.

pub mod ancestry;
pub mod context;
pub mod error;
pub mod identification;
pub mod observation;
pub mod rank;
pub mod store;
pub mod taxon;

pub use error::{Error, Result};
