use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Media format reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Tv,
    Movie,
    Ova,
    Special,
    Ona,
    Music,
}

impl MediaKind {
    /// Parses a user or API token, case-insensitively.
    ///
    /// Unrecognized formats (e.g. promotional videos) return `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "tv" => Some(Self::Tv),
            "movie" => Some(Self::Movie),
            "ova" => Some(Self::Ova),
            "special" => Some(Self::Special),
            "ona" => Some(Self::Ona),
            "music" => Some(Self::Music),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tv => write!(f, "tv"),
            Self::Movie => write!(f, "movie"),
            Self::Ova => write!(f, "ova"),
            Self::Special => write!(f, "special"),
            Self::Ona => write!(f, "ona"),
            Self::Music => write!(f, "music"),
        }
    }
}

/// Airing status in the catalog's three-state model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiringStatus {
    Airing,
    Complete,
    Upcoming,
}

impl AiringStatus {
    /// Parses a user token, case-insensitively.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "airing" => Some(Self::Airing),
            "complete" => Some(Self::Complete),
            "upcoming" => Some(Self::Upcoming),
            _ => None,
        }
    }
}

impl fmt::Display for AiringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Airing => write!(f, "airing"),
            Self::Complete => write!(f, "complete"),
            Self::Upcoming => write!(f, "upcoming"),
        }
    }
}

/// One flattened catalog entry.
///
/// Absent mean score or vote count stays absent: the scorer treats a
/// missing value as zero *weight*, never as a zero *value*, and the
/// distinction must survive flattening and the CSV cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Catalog identifier (MAL id).
    pub mal_id: Option<u64>,

    /// Display title.
    pub title: String,

    /// Media format, when the catalog reported a recognized one.
    pub kind: Option<MediaKind>,

    /// Airing status.
    pub status: Option<AiringStatus>,

    /// Release year.
    pub year: Option<i32>,

    /// Episode count.
    pub episodes: Option<u32>,

    /// Mean score in `[0.0, 10.0]`.
    pub score: Option<f64>,

    /// Number of users the mean is computed over.
    pub scored_by: Option<u64>,

    /// Canonical genre names.
    pub genres: BTreeSet<String>,

    /// Catalog page URL.
    pub url: Option<String>,
}

impl Record {
    /// Creates an empty record with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            mal_id: None,
            title: title.into(),
            kind: None,
            status: None,
            year: None,
            episodes: None,
            score: None,
            scored_by: None,
            genres: BTreeSet::new(),
            url: None,
        }
    }

    /// Vote count with absent treated as zero.
    #[must_use]
    pub fn votes(&self) -> u64 {
        self.scored_by.unwrap_or(0)
    }

    /// Returns `true` if the record carries usable scoring evidence:
    /// both a mean score and at least one vote.
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        self.score.is_some() && self.votes() > 0
    }

    /// Case-insensitive genre membership test.
    #[must_use]
    pub fn has_genre(&self, name: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(name))
    }
}
