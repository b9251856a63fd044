//! biota-indexer binary.
//!
//! Reads `indexer.toml` (or the path given with `--config`), opens the SQLite
//! store, projects taxa or identifications into search documents and writes
//! them as Elasticsearch bulk NDJSON to the configured output or stdout.
//!
//! ```text
//! biota-indexer taxa                    # reindex every taxon
//! biota-indexer taxa --ids 48662,47158  # just these
//! biota-indexer identifications
//! ```

use std::{
  fs::File,
  io::{self, BufWriter, Write},
  path::PathBuf,
  sync::Arc,
};

use anyhow::Context as _;
use biota_index::{IndexStats, Indexer, Projector, sink::NdjsonSink};
use biota_indexer::IndexerConfig;
use biota_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Biota search-index projector")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "indexer.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Index taxa documents.
  Taxa {
    /// Comma-separated taxon ids; every taxon when omitted.
    #[arg(long, value_delimiter = ',')]
    ids: Vec<i64>,
  },
  /// Index identification documents.
  Identifications {
    /// Comma-separated identification ids; every identification when
    /// omitted.
    #[arg(long, value_delimiter = ',')]
    ids: Vec<i64>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays clean NDJSON.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = IndexerConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;
  let time_zone = cfg
    .time_zone()
    .context("invalid default_time_zone")?;

  let store_path = cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let projector = Projector::discover(&store, cfg.root_taxon_id, time_zone)
    .await
    .context("failed to resolve the root taxon")?;
  if projector.root_taxon_id().is_none() {
    tracing::warn!("no root taxon found; identification ancestries keep every ancestor");
  }

  let writer: Box<dyn Write> = match &cfg.output {
    Some(path) => Box::new(BufWriter::new(
      File::create(path).with_context(|| format!("failed to create {path:?}"))?,
    )),
    None => Box::new(BufWriter::new(io::stdout().lock())),
  };

  let mut indexer = Indexer::new(Arc::new(store), NdjsonSink::new(writer), projector)
    .with_batch_size(cfg.batch_size);

  let stats: IndexStats = match cli.command {
    Command::Taxa { ids } if ids.is_empty() => indexer.reindex_all_taxa().await,
    Command::Taxa { ids } => indexer.index_taxa(&ids).await,
    Command::Identifications { ids } if ids.is_empty() => {
      indexer.reindex_all_identifications().await
    }
    Command::Identifications { ids } => indexer.index_identifications(&ids).await,
  }
  .context("indexing failed")?;

  tracing::info!(
    batches = stats.batches,
    documents = stats.documents,
    names_reloaded = stats.names_reloaded,
    written = indexer.sink().written(),
    "done"
  );

  Ok(())
}
