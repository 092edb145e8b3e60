//! Typed session parameters for the interactive shell.
//!
//! The whole free-form `key value` surface maps onto one explicit
//! struct: each key has a typed parser, enumerated keys validate their
//! choice set, and boolean keys toggle when given without a value.

use std::fmt::Display;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

use hyouka_client::SearchQuery;
use hyouka_core::scoring::DEFAULT_POPULARITY_ALPHA;
use hyouka_core::{AiringStatus, FilterCriteria, GenreResolver, MediaKind};

pub const DEFAULT_LIMIT_PER_PAGE: u32 = 25;
pub const DEFAULT_MAX_PAGES: u32 = 5;
pub const DEFAULT_TOP_K: i64 = 20;

/// Default cache location under the user data directory.
#[must_use]
pub fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hyouka")
        .join("anime_cache.csv")
}

/// The live parameter set mutated by the shell, one explicit field per
/// key. A fresh copy of the relevant pieces is taken at the start of
/// every run, so a failed run never leaves partial state behind.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    /// Title keyword for the server-side search.
    pub query: String,
    pub kind: Option<MediaKind>,
    pub status: Option<AiringStatus>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_score: Option<f64>,
    pub min_scored_by: Option<u64>,
    /// Raw genre tokens (names or IDs); resolved at run time.
    pub any_genres: Option<Vec<String>>,
    pub all_genres: Option<Vec<String>>,
    pub limit_per_page: u32,
    pub max_pages: u32,
    pub sfw: bool,
    /// Skip fetching and analyze the cache instead.
    pub no_fetch: bool,
    pub cache_path: PathBuf,
    /// Bayesian prior weight override (`m`).
    pub prior_weight: Option<f64>,
    pub top_k: i64,
    /// Cross-reference AniList and use consensus scoring.
    pub use_anilist: bool,
    /// Fraction of AniList popularity counted as pseudo-votes.
    pub popularity_alpha: f64,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            kind: None,
            status: None,
            year_from: None,
            year_to: None,
            min_score: None,
            min_scored_by: None,
            any_genres: None,
            all_genres: None,
            limit_per_page: DEFAULT_LIMIT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            sfw: false,
            no_fetch: false,
            cache_path: default_cache_path(),
            prior_weight: None,
            top_k: DEFAULT_TOP_K,
            use_anilist: false,
            popularity_alpha: DEFAULT_POPULARITY_ALPHA,
        }
    }
}

impl SessionParams {
    /// Applies one `key value` / `key=value` assignment and returns the
    /// rendered new value for echoing back to the user.
    ///
    /// # Errors
    ///
    /// Unknown keys, failed parses, and out-of-range values; the
    /// parameter set is left untouched in every error case.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<String> {
        match key {
            "q" => {
                self.query = value.unwrap_or_default().trim().to_string();
                Ok(format!("{:?}", self.query))
            }
            "type" => {
                self.kind = parse_optional(value, |v| {
                    MediaKind::parse(v)
                        .ok_or_else(|| anyhow!("type choices: tv, movie, ova, special, ona, music"))
                })?;
                Ok(render_optional(&self.kind))
            }
            "status" => {
                self.status = parse_optional(value, |v| {
                    AiringStatus::parse(v)
                        .ok_or_else(|| anyhow!("status choices: airing, complete, upcoming"))
                })?;
                Ok(render_optional(&self.status))
            }
            "year_from" => {
                self.year_from = parse_optional(value, parse_int)?;
                Ok(render_optional(&self.year_from))
            }
            "year_to" => {
                self.year_to = parse_optional(value, parse_int)?;
                Ok(render_optional(&self.year_to))
            }
            "min_score" => {
                self.min_score = parse_optional(value, parse_float)?;
                Ok(render_optional(&self.min_score))
            }
            "min_scored_by" => {
                self.min_scored_by = parse_optional(value, |v| {
                    v.parse::<u64>()
                        .with_context(|| format!("non-negative integer required, got {v:?}"))
                })?;
                Ok(render_optional(&self.min_scored_by))
            }
            "any_genres" => {
                self.any_genres = parse_token_list(value);
                Ok(render_tokens(&self.any_genres))
            }
            "all_genres" => {
                self.all_genres = parse_token_list(value);
                Ok(render_tokens(&self.all_genres))
            }
            "limit_per_page" => {
                let limit = require(value, "limit_per_page").and_then(parse_int::<u32>)?;
                if !(1..=25).contains(&limit) {
                    bail!("limit_per_page must be in 1..=25");
                }
                self.limit_per_page = limit;
                Ok(limit.to_string())
            }
            "max_pages" => {
                let pages = require(value, "max_pages").and_then(parse_int::<u32>)?;
                if pages == 0 {
                    bail!("max_pages must be at least 1");
                }
                self.max_pages = pages;
                Ok(pages.to_string())
            }
            "sfw" => {
                self.sfw = parse_bool(value, self.sfw)?;
                Ok(self.sfw.to_string())
            }
            "no_fetch" => {
                self.no_fetch = parse_bool(value, self.no_fetch)?;
                Ok(self.no_fetch.to_string())
            }
            "csv" => {
                self.cache_path = match value.map(str::trim).filter(|v| !v.is_empty()) {
                    Some(path) => PathBuf::from(path),
                    None => default_cache_path(),
                };
                Ok(self.cache_path.display().to_string())
            }
            "prior_m" => {
                self.prior_weight = parse_optional(value, |v| {
                    let weight = parse_float(v)?;
                    if weight < 0.0 {
                        bail!("prior weight must be non-negative");
                    }
                    Ok(weight)
                })?;
                Ok(render_optional(&self.prior_weight))
            }
            "topk" => {
                self.top_k = require(value, "topk").and_then(parse_int::<i64>)?;
                Ok(self.top_k.to_string())
            }
            "use_anilist" => {
                self.use_anilist = parse_bool(value, self.use_anilist)?;
                Ok(self.use_anilist.to_string())
            }
            "al_pop_alpha" => {
                let alpha = require(value, "al_pop_alpha").and_then(parse_float)?;
                if alpha < 0.0 {
                    bail!("al_pop_alpha must be non-negative");
                }
                self.popularity_alpha = alpha;
                Ok(alpha.to_string())
            }
            other => bail!("unknown param: {other} (try `help`)"),
        }
    }

    /// Renders every parameter for the `show` command.
    #[must_use]
    pub fn show(&self) -> String {
        let mut out = String::from("Current params:\n");
        let _ = writeln!(out, "  q: {:?}", self.query);
        let _ = writeln!(out, "  type: {}", render_optional(&self.kind));
        let _ = writeln!(out, "  status: {}", render_optional(&self.status));
        let _ = writeln!(out, "  year_from: {}", render_optional(&self.year_from));
        let _ = writeln!(out, "  year_to: {}", render_optional(&self.year_to));
        let _ = writeln!(out, "  min_score: {}", render_optional(&self.min_score));
        let _ = writeln!(
            out,
            "  min_scored_by: {}",
            render_optional(&self.min_scored_by)
        );
        let _ = writeln!(out, "  any_genres: {}", render_tokens(&self.any_genres));
        let _ = writeln!(out, "  all_genres: {}", render_tokens(&self.all_genres));
        let _ = writeln!(out, "  limit_per_page: {}", self.limit_per_page);
        let _ = writeln!(out, "  max_pages: {}", self.max_pages);
        let _ = writeln!(out, "  sfw: {}", self.sfw);
        let _ = writeln!(out, "  no_fetch: {}", self.no_fetch);
        let _ = writeln!(out, "  csv: {}", self.cache_path.display());
        let _ = writeln!(out, "  prior_m: {}", render_optional(&self.prior_weight));
        let _ = writeln!(out, "  topk: {}", self.top_k);
        let _ = writeln!(out, "  use_anilist: {}", self.use_anilist);
        let _ = writeln!(out, "  al_pop_alpha: {}", self.popularity_alpha);
        out
    }

    /// Builds the filter criteria for one run, resolving genre tokens.
    ///
    /// # Errors
    ///
    /// `HyoukaError::UnknownGenre` naming the offending token; the run
    /// aborts rather than silently widening the filter.
    pub fn criteria(&self, resolver: &GenreResolver) -> hyouka_core::Result<FilterCriteria> {
        let any_genres = match &self.any_genres {
            Some(tokens) => non_empty(resolver.resolve_set(tokens)?),
            None => None,
        };
        let all_genres = match &self.all_genres {
            Some(tokens) => non_empty(resolver.resolve_set(tokens)?),
            None => None,
        };
        Ok(FilterCriteria {
            kind: self.kind,
            status: self.status,
            year_from: self.year_from,
            year_to: self.year_to,
            min_score: self.min_score,
            min_scored_by: self.min_scored_by,
            any_genres,
            all_genres,
        })
    }

    /// The server-side search mirror of the current parameters.
    #[must_use]
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            query: self.query.clone(),
            kind: self.kind,
            status: self.status,
            start_year: self.year_from,
            end_year: self.year_to,
            min_score: self.min_score,
            limit_per_page: self.limit_per_page,
            max_pages: Some(self.max_pages),
            sfw: self.sfw,
        }
    }
}

fn non_empty(
    set: std::collections::BTreeSet<String>,
) -> Option<std::collections::BTreeSet<String>> {
    if set.is_empty() { None } else { Some(set) }
}

/// Splits comma- or whitespace-separated tokens.
#[must_use]
pub fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

fn parse_token_list(value: Option<&str>) -> Option<Vec<String>> {
    let tokens = split_tokens(value.unwrap_or_default());
    if tokens.is_empty() { None } else { Some(tokens) }
}

/// Empty or missing value unsets; anything else must parse.
fn parse_optional<T>(
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T>,
) -> Result<Option<T>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse(v).map(Some),
    }
}

fn require<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{key} requires a value"))
}

fn parse_int<T: std::str::FromStr>(value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .with_context(|| format!("integer required, got {value:?}"))
}

fn parse_float(value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .with_context(|| format!("number required, got {value:?}"))
}

/// Empty value toggles; otherwise accepts common boolean literals.
fn parse_bool(value: Option<&str>, current: bool) -> Result<bool> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(!current);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => bail!("boolean required: true/false/1/0/yes/no/on/off or empty to toggle (got {other:?})"),
    }
}

fn render_optional<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "unset".to_string(), ToString::to_string)
}

fn render_tokens(tokens: &Option<Vec<String>>) -> String {
    tokens
        .as_ref()
        .map_or_else(|| "unset".to_string(), |t| t.join(", "))
}
