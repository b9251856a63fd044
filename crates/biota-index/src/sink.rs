//! Document sinks: where finished documents go.
//!
//! The search engine's transport is not this crate's concern. A sink only
//! receives one mapping-shaped document per entity, keyed by index name and
//! entity id.

use std::io::Write;

use serde_json::{Value, json};

use crate::Result;

pub trait DocumentSink {
  /// Queue `document` for entity `id` in `index`.
  fn send(&mut self, index: &str, id: i64, document: &Value) -> Result<()>;

  /// Push out anything buffered.
  fn flush(&mut self) -> Result<()>;
}

impl<K: DocumentSink + ?Sized> DocumentSink for &mut K {
  fn send(&mut self, index: &str, id: i64, document: &Value) -> Result<()> {
    (**self).send(index, id, document)
  }

  fn flush(&mut self) -> Result<()> { (**self).flush() }
}

// ─── NDJSON ──────────────────────────────────────────────────────────────────

/// Writes Elasticsearch bulk-API NDJSON: an `index` action line followed by
/// the document source line.
pub struct NdjsonSink<W: Write> {
  writer:  W,
  written: usize,
}

impl<W: Write> NdjsonSink<W> {
  pub fn new(writer: W) -> Self { Self { writer, written: 0 } }

  /// Documents written so far.
  pub fn written(&self) -> usize { self.written }

  pub fn into_inner(self) -> W { self.writer }
}

impl<W: Write> DocumentSink for NdjsonSink<W> {
  fn send(&mut self, index: &str, id: i64, document: &Value) -> Result<()> {
    let action = json!({ "index": { "_index": index, "_id": id.to_string() } });
    serde_json::to_writer(&mut self.writer, &action)?;
    self.writer.write_all(b"\n")?;
    serde_json::to_writer(&mut self.writer, document)?;
    self.writer.write_all(b"\n")?;
    self.written += 1;
    Ok(())
  }

  fn flush(&mut self) -> Result<()> {
    self.writer.flush()?;
    Ok(())
  }
}

// ─── Memory ──────────────────────────────────────────────────────────────────

/// A document as received by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentDocument {
  pub index:    String,
  pub id:       i64,
  pub document: Value,
}

/// Keeps every document in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
  pub documents: Vec<SentDocument>,
  pub flushes:   usize,
}

impl MemorySink {
  pub fn get(&self, index: &str, id: i64) -> Option<&Value> {
    self
      .documents
      .iter()
      .rev()
      .find(|d| d.index == index && d.id == id)
      .map(|d| &d.document)
  }
}

impl DocumentSink for MemorySink {
  fn send(&mut self, index: &str, id: i64, document: &Value) -> Result<()> {
    self.documents.push(SentDocument {
      index: index.to_owned(),
      id,
      document: document.clone(),
    });
    Ok(())
  }

  fn flush(&mut self) -> Result<()> {
    self.flushes += 1;
    Ok(())
  }
}
