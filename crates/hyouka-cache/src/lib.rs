//! # Hyouka Cache
//!
//! CSV persistence for fetched catalog records. Every `Record` field
//! round-trips losslessly: absent values are empty cells, never sentinel
//! numbers, so the scorer's absent-vs-zero distinction survives a
//! reload. Genre sets serialize as one comma-joined cell.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use hyouka_core::{AiringStatus, MediaKind, Record};

/// Errors from reading or writing the record cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache format error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Flat CSV row mirroring `Record` field for field.
#[derive(Debug, Serialize, Deserialize)]
struct Row {
    mal_id: Option<u64>,
    title: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
    year: Option<i32>,
    episodes: Option<u32>,
    score: Option<f64>,
    scored_by: Option<u64>,
    genres: String,
    url: Option<String>,
}

impl From<&Record> for Row {
    fn from(record: &Record) -> Self {
        Self {
            mal_id: record.mal_id,
            title: record.title.clone(),
            kind: record.kind.map(|k| k.to_string()),
            status: record.status.map(|s| s.to_string()),
            year: record.year,
            episodes: record.episodes,
            score: record.score,
            scored_by: record.scored_by,
            genres: record
                .genres
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            url: record.url.clone(),
        }
    }
}

impl From<Row> for Record {
    fn from(row: Row) -> Self {
        Self {
            mal_id: row.mal_id,
            title: row.title,
            kind: row.kind.as_deref().and_then(MediaKind::parse),
            status: row.status.as_deref().and_then(AiringStatus::parse),
            year: row.year,
            episodes: row.episodes,
            score: row.score,
            scored_by: row.scored_by,
            genres: split_genres(&row.genres),
            url: row.url,
        }
    }
}

fn split_genres(cell: &str) -> BTreeSet<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .map(String::from)
        .collect()
}

/// Writes `records` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// `CacheError` on filesystem or serialization failure; the previous
/// file contents may be partially overwritten in that case, which the
/// loader reports as a malformed cache.
pub fn save(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(Row::from(record))?;
    }
    writer.flush()?;
    info!(records = records.len(), path = %path.display(), "cache written");
    Ok(())
}

/// Loads the cached records.
///
/// A missing file is an empty cache. A malformed file is an error; the
/// caller decides how to report it and typically falls back to empty.
///
/// # Errors
///
/// `CacheError` on filesystem failure or malformed rows.
pub fn load(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        debug!(path = %path.display(), "no cache file");
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<Row>() {
        records.push(Record::from(row?));
    }
    debug!(records = records.len(), path = %path.display(), "cache loaded");
    Ok(records)
}
