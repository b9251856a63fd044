//! [`SqliteStore`], the SQLite implementation of [`IndexSource`].

use std::{collections::BTreeSet, path::Path};

use rusqlite::{Connection, OptionalExtension as _, Row, params_from_iter};

use biota_core::{
  identification::Identification,
  observation::User,
  store::IndexSource,
  taxon::{
    Atlas, Color, ConservationStatus, DescendantPhoto, Photo, Taxon, TaxonName,
    TaxonPhoto,
  },
};

use crate::{
  Result,
  encode::{
    RawIdentification, RawIdentificationGraph, RawListedTaxon, RawObservation,
    RawTaxon, RawTaxonGraph, TAXON_COLUMNS, name_from_row, placeholders,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An index source backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self.execute_batch(SCHEMA).await
  }

  /// Run raw SQL statements. Used to seed fixtures and by import tooling.
  pub async fn execute_batch(&self, sql: impl Into<String>) -> Result<()> {
    let sql = sql.into();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Query helpers ───────────────────────────────────────────────────────────

/// Run `sql` with every `{ids}` replaced by one placeholder per id.
fn query_in<T>(
  conn: &Connection,
  sql: &str,
  ids: &[i64],
  map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
  if ids.is_empty() {
    return Ok(Vec::new());
  }
  let sql = sql.replace("{ids}", &placeholders(ids.len()));
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params_from_iter(ids.iter()), map)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn pair_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, i64)> {
  Ok((row.get(0)?, row.get(1)?))
}

fn taxa_in(conn: &Connection, ids: &[i64]) -> rusqlite::Result<Vec<RawTaxon>> {
  query_in(
    conn,
    &format!("SELECT {TAXON_COLUMNS} FROM taxa WHERE id IN ({{ids}}) ORDER BY id"),
    ids,
    RawTaxon::from_row,
  )
}

fn names_in(
  conn: &Connection,
  taxon_ids: &[i64],
) -> rusqlite::Result<Vec<(i64, TaxonName)>> {
  query_in(
    conn,
    "SELECT taxon_id, id, name, locale, lexicon, is_valid, position
       FROM taxon_names WHERE taxon_id IN ({ids}) ORDER BY taxon_id, id",
    taxon_ids,
    name_from_row,
  )
}

fn photo_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<Photo>> {
  let Some(id) = row.get::<_, Option<i64>>(offset)? else {
    return Ok(None);
  };
  Ok(Some(Photo {
    id,
    user_id: row.get(offset + 1)?,
    license_code: row.get(offset + 2)?,
    attribution: row.get(offset + 3)?,
    native_page_url: row.get(offset + 4)?,
    square_url: row.get(offset + 5)?,
    small_url: row.get(offset + 6)?,
    medium_url: row.get(offset + 7)?,
    large_url: row.get(offset + 8)?,
    original_url: row.get(offset + 9)?,
  }))
}

fn load_taxon_graph(conn: &Connection, ids: &[i64]) -> rusqlite::Result<RawTaxonGraph> {
  let taxa = taxa_in(conn, ids)?;
  let found: Vec<i64> = taxa.iter().map(|t| t.id).collect();

  let names = names_in(conn, &found)?;

  let statuses = query_in(
    conn,
    "SELECT taxon_id, id, place_id, status, authority, iucn, geoprivacy
       FROM conservation_statuses WHERE taxon_id IN ({ids}) ORDER BY taxon_id, id",
    &found,
    |row| {
      Ok((row.get(0)?, ConservationStatus {
        id:         row.get(1)?,
        place_id:   row.get(2)?,
        status:     row.get(3)?,
        authority:  row.get(4)?,
        iucn:       row.get(5)?,
        geoprivacy: row.get(6)?,
      }))
    },
  )?;

  // A taxon photo whose photo row is gone keeps `photo: None`.
  let photos = query_in(
    conn,
    "SELECT tp.taxon_id, tp.id, tp.position,
            p.id, p.user_id, p.license_code, p.attribution, p.native_page_url,
            p.square_url, p.small_url, p.medium_url, p.large_url, p.original_url
       FROM taxon_photos tp
       LEFT JOIN photos p ON p.id = tp.photo_id
      WHERE tp.taxon_id IN ({ids})
      ORDER BY tp.taxon_id, tp.id",
    &found,
    |row| {
      Ok((row.get(0)?, TaxonPhoto {
        id:       row.get(1)?,
        position: row.get(2)?,
        photo:    photo_from_row(row, 3)?,
      }))
    },
  )?;

  let colors = query_in(
    conn,
    "SELECT ct.taxon_id, c.id, c.value
       FROM colors_taxa ct JOIN colors c ON c.id = ct.color_id
      WHERE ct.taxon_id IN ({ids})
      ORDER BY ct.taxon_id, c.id",
    &found,
    |row| Ok((row.get(0)?, Color { id: row.get(1)?, value: row.get(2)? })),
  )?;

  let listed = query_in(
    conn,
    "SELECT taxon_id, id, place_id, establishment_means, occurrence_status_level
       FROM listed_taxa WHERE taxon_id IN ({ids}) ORDER BY taxon_id, id",
    &found,
    |row| {
      Ok(RawListedTaxon {
        taxon_id:                row.get(0)?,
        id:                      row.get(1)?,
        place_id:                row.get(2)?,
        establishment_means:     row.get(3)?,
        occurrence_status_level: row.get(4)?,
      })
    },
  )?;

  let atlases = query_in(
    conn,
    "SELECT taxon_id, id, is_active FROM atlases
      WHERE taxon_id IN ({ids}) ORDER BY taxon_id, id",
    &found,
    |row| Ok((row.get(0)?, Atlas { id: row.get(1)?, is_active: row.get(2)? })),
  )?;

  Ok(RawTaxonGraph { taxa, names, statuses, photos, colors, listed, atlases })
}

fn load_identification_graph(
  conn: &Connection,
  ids: &[i64],
) -> rusqlite::Result<RawIdentificationGraph> {
  let identifications = query_in(
    conn,
    "SELECT id, uuid, observation_id, user_id, taxon_id, body, category, current,
            created_at
       FROM identifications WHERE id IN ({ids}) ORDER BY id",
    ids,
    |row| {
      Ok(RawIdentification {
        id:             row.get(0)?,
        uuid:           row.get(1)?,
        observation_id: row.get(2)?,
        user_id:        row.get(3)?,
        taxon_id:       row.get(4)?,
        body:           row.get(5)?,
        category:       row.get(6)?,
        current:        row.get(7)?,
        created_at:     row.get(8)?,
      })
    },
  )?;

  let observation_ids: Vec<i64> = identifications
    .iter()
    .filter_map(|i| i.observation_id)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();
  let observations = query_in(
    conn,
    "SELECT id, uuid, user_id, taxon_id, quality_grade, time_zone, created_at
       FROM observations WHERE id IN ({ids}) ORDER BY id",
    &observation_ids,
    |row| {
      Ok(RawObservation {
        id:            row.get(0)?,
        uuid:          row.get(1)?,
        user_id:       row.get(2)?,
        taxon_id:      row.get(3)?,
        quality_grade: row.get(4)?,
        time_zone:     row.get(5)?,
        created_at:    row.get(6)?,
      })
    },
  )?;

  let user_ids: Vec<i64> = identifications
    .iter()
    .map(|i| i.user_id)
    .chain(observations.iter().map(|o| o.user_id))
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();
  let users = query_in(
    conn,
    "SELECT id, login, name FROM users WHERE id IN ({ids}) ORDER BY id",
    &user_ids,
    |row| Ok(User { id: row.get(0)?, login: row.get(1)?, name: row.get(2)? }),
  )?;

  // Embedded taxa are projected without details, so only core rows are read.
  let taxon_ids: Vec<i64> = identifications
    .iter()
    .map(|i| i.taxon_id)
    .chain(observations.iter().filter_map(|o| o.taxon_id))
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();
  let taxa = taxa_in(conn, &taxon_ids)?;

  Ok(RawIdentificationGraph { identifications, observations, users, taxa })
}

/// Photos of active descendants of each taxon in `ids`, ranked per ancestor
/// by descendant popularity and capped at `limit`.
///
/// A descendant's ancestry starts with its ancestor's ancestry followed by
/// the ancestor's own id, so `a.ancestry || '/' || a.id` is the prefix to
/// match; a root ancestor has no ancestry and contributes just its id.
fn descendant_photos_in(
  conn: &Connection,
  ids: &[i64],
  limit: usize,
) -> rusqlite::Result<Vec<DescendantPhoto>> {
  let limit = i64::try_from(limit).unwrap_or(i64::MAX);
  let sql = format!(
    "WITH prefixes AS (
       SELECT id, COALESCE(ancestry || '/', '') || id AS prefix
         FROM taxa WHERE id IN ({{ids}})
     ),
     ranked AS (
       SELECT pf.id AS ancestor_id, t.id AS taxon_id,
              p.id AS photo_id, p.user_id, p.license_code, p.attribution,
              p.native_page_url, p.square_url, p.small_url, p.medium_url,
              p.large_url, p.original_url,
              ROW_NUMBER() OVER (
                PARTITION BY pf.id
                ORDER BY t.observations_count DESC, t.id,
                         COALESCE(tp.position, 2147483647), tp.id
              ) AS n
         FROM prefixes pf
         JOIN taxa t
           ON t.ancestry = pf.prefix OR t.ancestry LIKE pf.prefix || '/%'
         JOIN taxon_photos tp ON tp.taxon_id = t.id
         JOIN photos p ON p.id = tp.photo_id
        WHERE t.is_active
     )
     SELECT ancestor_id, taxon_id,
            photo_id, user_id, license_code, attribution, native_page_url,
            square_url, small_url, medium_url, large_url, original_url
       FROM ranked WHERE n <= {limit}
      ORDER BY ancestor_id, n"
  );
  let rows: Vec<(i64, i64, Option<Photo>)> = query_in(conn, &sql, ids, |row| {
    Ok((row.get(0)?, row.get(1)?, photo_from_row(row, 2)?))
  })?;
  Ok(
    rows
      .into_iter()
      .filter_map(|(ancestor_id, taxon_id, photo)| {
        photo.map(|photo| DescendantPhoto { ancestor_id, taxon_id, photo })
      })
      .collect(),
  )
}

fn ids_after(
  conn: &Connection,
  table: &str,
  after: i64,
  limit: usize,
) -> rusqlite::Result<Vec<i64>> {
  let limit = i64::try_from(limit).unwrap_or(i64::MAX);
  let mut stmt =
    conn.prepare(&format!("SELECT id FROM {table} WHERE id > ?1 ORDER BY id LIMIT ?2"))?;
  let ids = stmt
    .query_map(rusqlite::params![after, limit], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()?;
  Ok(ids)
}

// ─── IndexSource impl ────────────────────────────────────────────────────────

impl IndexSource for SqliteStore {
  type Error = crate::Error;

  // ── Entity loads ──────────────────────────────────────────────────────────

  async fn load_taxa(&self, ids: &[i64]) -> Result<Vec<Taxon>> {
    let ids = ids.to_vec();
    let graph = self
      .conn
      .call(move |conn| Ok(load_taxon_graph(conn, &ids)?))
      .await?;
    let taxa = graph.into_taxa()?;
    tracing::trace!(loaded = taxa.len(), "taxa loaded");
    Ok(taxa)
  }

  async fn load_identifications(&self, ids: &[i64]) -> Result<Vec<Identification>> {
    let ids = ids.to_vec();
    let graph = self
      .conn
      .call(move |conn| Ok(load_identification_graph(conn, &ids)?))
      .await?;
    graph.into_identifications()
  }

  // ── Bulk auxiliary queries ────────────────────────────────────────────────

  async fn listed_place_pairs(&self, taxon_ids: &[i64]) -> Result<Vec<(i64, i64)>> {
    let ids = taxon_ids.to_vec();
    let pairs = self
      .conn
      .call(move |conn| {
        Ok(query_in(
          conn,
          "SELECT lt.taxon_id, lt.place_id
             FROM listed_taxa lt JOIN places p ON p.id = lt.place_id
            WHERE lt.taxon_id IN ({ids})
            ORDER BY lt.taxon_id, lt.place_id",
          &ids,
          pair_from_row,
        )?)
      })
      .await?;
    Ok(pairs)
  }

  async fn observation_place_pairs(
    &self,
    observation_ids: &[i64],
  ) -> Result<Vec<(i64, i64)>> {
    let ids = observation_ids.to_vec();
    let pairs = self
      .conn
      .call(move |conn| {
        Ok(query_in(
          conn,
          "SELECT observation_id, place_id FROM observations_places
            WHERE observation_id IN ({ids})
            ORDER BY observation_id, place_id",
          &ids,
          pair_from_row,
        )?)
      })
      .await?;
    Ok(pairs)
  }

  async fn descendant_photos(
    &self,
    taxon_ids: &[i64],
    limit: usize,
  ) -> Result<Vec<DescendantPhoto>> {
    let ids = taxon_ids.to_vec();
    let photos = self
      .conn
      .call(move |conn| Ok(descendant_photos_in(conn, &ids, limit)?))
      .await?;
    tracing::trace!(found = photos.len(), "descendant photos loaded");
    Ok(photos)
  }

  // ── Authoritative association reads ───────────────────────────────────────

  async fn count_taxon_names(
    &self,
    taxon_ids: &[i64],
  ) -> Result<Vec<(i64, usize)>> {
    let ids = taxon_ids.to_vec();
    let counts: Vec<(i64, i64)> = self
      .conn
      .call(move |conn| {
        Ok(query_in(
          conn,
          "SELECT taxon_id, COUNT(*) FROM taxon_names
            WHERE taxon_id IN ({ids})
            GROUP BY taxon_id ORDER BY taxon_id",
          &ids,
          pair_from_row,
        )?)
      })
      .await?;
    Ok(
      counts
        .into_iter()
        .map(|(id, n)| (id, usize::try_from(n).unwrap_or_default()))
        .collect(),
    )
  }

  async fn reload_taxon_names(&self, taxon_id: i64) -> Result<Vec<TaxonName>> {
    let names = self
      .conn
      .call(move |conn| Ok(names_in(conn, &[taxon_id])?))
      .await?;
    Ok(names.into_iter().map(|(_, name)| name).collect())
  }

  // ── Batch iteration ───────────────────────────────────────────────────────

  async fn taxon_ids_after(&self, after: i64, limit: usize) -> Result<Vec<i64>> {
    let ids = self
      .conn
      .call(move |conn| Ok(ids_after(conn, "taxa", after, limit)?))
      .await?;
    Ok(ids)
  }

  async fn identification_ids_after(&self, after: i64, limit: usize) -> Result<Vec<i64>> {
    let ids = self
      .conn
      .call(move |conn| Ok(ids_after(conn, "identifications", after, limit)?))
      .await?;
    Ok(ids)
  }

  // ── Reference rows ────────────────────────────────────────────────────────

  async fn root_taxon_id(&self) -> Result<Option<i64>> {
    let id = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT id FROM taxa WHERE parent_id IS NULL AND name = 'Life'
              ORDER BY id LIMIT 1",
            [],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(id)
  }
}
