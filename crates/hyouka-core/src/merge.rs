//! Cross-catalog merge.
//!
//! Joins the primary catalog's records with AniList entries by MAL id,
//! then appends AniList-only entries that no existing record already
//! covers under a normalized (title, year) key.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{AiringStatus, MediaKind, Record};

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static pattern compiles"));

/// One flattened AniList media entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AniListEntry {
    pub anilist_id: u64,
    pub mal_id: Option<u64>,
    pub title: String,
    pub title_romaji: Option<String>,
    pub kind: Option<MediaKind>,
    pub status: Option<AiringStatus>,
    pub year: Option<i32>,
    pub episodes: Option<u32>,
    /// Mean score rescaled to `[0.0, 10.0]`.
    pub score: Option<f64>,
    pub popularity: Option<u64>,
    pub favourites: Option<u64>,
    pub url: Option<String>,
}

impl AniListEntry {
    /// The cross-catalog signal carried into a merged record.
    #[must_use]
    pub fn signal(&self) -> AniListSignal {
        AniListSignal {
            anilist_id: self.anilist_id,
            title_romaji: self.title_romaji.clone(),
            score: self.score,
            popularity: self.popularity,
            favourites: self.favourites,
            url: self.url.clone(),
        }
    }

    /// A record standing in for an entry the primary catalog never saw.
    /// It carries no primary-catalog evidence: score and votes stay absent.
    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut record = Record::new(self.title.clone());
        record.mal_id = self.mal_id;
        record.kind = self.kind;
        record.status = self.status;
        record.year = self.year;
        record.episodes = self.episodes;
        record.url = self.url.clone();
        record
    }
}

/// Secondary-catalog signal attached to a record after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AniListSignal {
    pub anilist_id: u64,
    pub title_romaji: Option<String>,
    pub score: Option<f64>,
    pub popularity: Option<u64>,
    pub favourites: Option<u64>,
    pub url: Option<String>,
}

/// A record plus its optional cross-catalog signal.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub record: Record,
    pub anilist: Option<AniListSignal>,
}

fn merge_key(title: &str, year: Option<i32>) -> (String, Option<i32>) {
    let normalized = NON_ALNUM
        .replace_all(&title.to_ascii_lowercase(), "")
        .into_owned();
    (normalized, year)
}

/// Merges the two catalogs. Input order of `mal` is preserved; unmatched
/// AniList entries are appended after it.
#[must_use]
pub fn merge(mal: &[Record], anilist: &[AniListEntry]) -> Vec<MergedRecord> {
    let mut by_mal_id: HashMap<u64, &AniListEntry> = HashMap::new();
    for entry in anilist {
        if let Some(mal_id) = entry.mal_id {
            by_mal_id.insert(mal_id, entry);
        }
    }

    let mut merged = Vec::with_capacity(mal.len());
    let mut used: HashSet<u64> = HashSet::new();
    for record in mal {
        let entry = record.mal_id.and_then(|id| by_mal_id.get(&id).copied());
        if let Some(entry) = entry {
            used.insert(entry.anilist_id);
        }
        merged.push(MergedRecord {
            record: record.clone(),
            anilist: entry.map(AniListEntry::signal),
        });
    }

    let mut seen: HashSet<(String, Option<i32>)> = merged
        .iter()
        .map(|m| merge_key(&m.record.title, m.record.year))
        .collect();
    for entry in anilist {
        if used.contains(&entry.anilist_id) {
            continue;
        }
        if !seen.insert(merge_key(&entry.title, entry.year)) {
            continue;
        }
        merged.push(MergedRecord {
            record: entry.to_record(),
            anilist: Some(entry.signal()),
        });
    }

    tracing::debug!(
        mal = mal.len(),
        anilist = anilist.len(),
        merged = merged.len(),
        "catalogs merged"
    );
    merged
}
