//! SQL schema for the biota SQLite store.
//!
//! Mirrors the subset of the platform's relational schema the indexer reads.
//! Association ids (photo, place) are not foreign keys and may point at
//! deleted rows.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS places (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id     INTEGER PRIMARY KEY,
    login  TEXT NOT NULL,
    name   TEXT
);

CREATE TABLE IF NOT EXISTS taxa (
    id                   INTEGER PRIMARY KEY,
    name                 TEXT    NOT NULL,
    rank                 TEXT    NOT NULL,
    rank_level           REAL,
    iconic_taxon_id      INTEGER,
    parent_id            INTEGER,
    ancestry             TEXT,              -- '/'-delimited, root first
    is_active            INTEGER NOT NULL DEFAULT 1,
    created_at           TEXT    NOT NULL,  -- RFC 3339 UTC
    observations_count   INTEGER NOT NULL DEFAULT 0,
    taxon_changes_count  INTEGER NOT NULL DEFAULT 0,
    taxon_schemes_count  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS taxon_names (
    id        INTEGER PRIMARY KEY,
    taxon_id  INTEGER NOT NULL,
    name      TEXT    NOT NULL,
    locale    TEXT,
    lexicon   TEXT,
    is_valid  INTEGER NOT NULL DEFAULT 1,
    position  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS conservation_statuses (
    id          INTEGER PRIMARY KEY,
    taxon_id    INTEGER NOT NULL,
    place_id    INTEGER,
    status      TEXT    NOT NULL,
    authority   TEXT,
    iucn        INTEGER,
    geoprivacy  TEXT
);

CREATE TABLE IF NOT EXISTS photos (
    id               INTEGER PRIMARY KEY,
    user_id          INTEGER,
    license_code     TEXT,
    attribution      TEXT,
    native_page_url  TEXT,
    square_url       TEXT,
    small_url        TEXT,
    medium_url       TEXT,
    large_url        TEXT,
    original_url     TEXT
);

CREATE TABLE IF NOT EXISTS taxon_photos (
    id        INTEGER PRIMARY KEY,
    taxon_id  INTEGER NOT NULL,
    photo_id  INTEGER NOT NULL,
    position  INTEGER
);

CREATE TABLE IF NOT EXISTS colors (
    id     INTEGER PRIMARY KEY,
    value  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS colors_taxa (
    color_id  INTEGER NOT NULL,
    taxon_id  INTEGER NOT NULL,
    PRIMARY KEY (color_id, taxon_id)
);

CREATE TABLE IF NOT EXISTS listed_taxa (
    id                       INTEGER PRIMARY KEY,
    taxon_id                 INTEGER NOT NULL,
    place_id                 INTEGER,
    establishment_means      TEXT,
    occurrence_status_level  INTEGER
);

CREATE TABLE IF NOT EXISTS atlases (
    id         INTEGER PRIMARY KEY,
    taxon_id   INTEGER NOT NULL,
    is_active  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS observations (
    id                  INTEGER PRIMARY KEY,
    uuid                TEXT    NOT NULL,
    user_id             INTEGER NOT NULL,
    taxon_id            INTEGER,
    quality_grade       TEXT    NOT NULL DEFAULT 'casual',
    time_zone           TEXT,
    created_at          TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS observations_places (
    observation_id  INTEGER NOT NULL,
    place_id        INTEGER NOT NULL,
    PRIMARY KEY (observation_id, place_id)
);

CREATE TABLE IF NOT EXISTS identifications (
    id              INTEGER PRIMARY KEY,
    uuid            TEXT    NOT NULL,
    observation_id  INTEGER,
    user_id         INTEGER NOT NULL,
    taxon_id        INTEGER NOT NULL,
    body            TEXT,
    category        TEXT,
    current         INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS taxon_names_taxon_idx      ON taxon_names(taxon_id);
CREATE INDEX IF NOT EXISTS conservation_taxon_idx     ON conservation_statuses(taxon_id);
CREATE INDEX IF NOT EXISTS taxa_ancestry_idx          ON taxa(ancestry);
CREATE INDEX IF NOT EXISTS taxon_photos_taxon_idx     ON taxon_photos(taxon_id);
CREATE INDEX IF NOT EXISTS colors_taxa_taxon_idx      ON colors_taxa(taxon_id);
CREATE INDEX IF NOT EXISTS listed_taxa_taxon_idx      ON listed_taxa(taxon_id);
CREATE INDEX IF NOT EXISTS atlases_taxon_idx          ON atlases(taxon_id);
CREATE INDEX IF NOT EXISTS identifications_obs_idx    ON identifications(observation_id);

PRAGMA user_version = 2;
";
