//! Configuration for the `biota-indexer` binary.
//!
//! Settings come from an optional TOML file layered with `BIOTA_*`
//! environment variables, e.g. `BIOTA_STORE_PATH=/var/lib/biota.db`.

use std::path::{Path, PathBuf};

use biota_core::observation::parse_time_zone;
use biota_index::indexer::DEFAULT_BATCH_SIZE;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime indexer configuration, deserialised from `indexer.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IndexerConfig {
  pub store_path:        PathBuf,
  #[serde(default = "default_batch_size")]
  pub batch_size:        usize,
  /// Skip root discovery and exclude this taxon from identification
  /// ancestries.
  #[serde(default)]
  pub root_taxon_id:     Option<i64>,
  /// IANA zone used when an observation has no usable time zone of its own.
  #[serde(default = "default_time_zone")]
  pub default_time_zone: String,
  /// NDJSON destination; stdout when unset.
  #[serde(default)]
  pub output:            Option<PathBuf>,
}

fn default_batch_size() -> usize { DEFAULT_BATCH_SIZE }

fn default_time_zone() -> String { "UTC".to_owned() }

impl IndexerConfig {
  /// Read `path` (if it exists) and then the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(Environment::with_prefix("BIOTA").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  /// Parse a TOML document with no environment overlay.
  pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()?
      .try_deserialize()
  }

  pub fn time_zone(&self) -> biota_core::Result<Tz> {
    parse_time_zone(&self.default_time_zone)
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
