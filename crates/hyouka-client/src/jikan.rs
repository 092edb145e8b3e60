//! Jikan (MyAnimeList v4) REST client.
//!
//! Paginated search plus the genre catalog. Jikan's public quota is
//! tight: pages are fetched with a fixed delay between them, and an
//! HTTP 429 is retried after the server's `Retry-After` hint until the
//! retry budget runs out.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use hyouka_core::{AiringStatus, MediaKind, Record};

use crate::error::{ClientError, Result};

const BASE_URL: &str = "https://api.jikan.moe/v4";

pub(crate) const USER_AGENT: &str = "hyouka/0.1 (+https://github.com/enrell/hyouka)";
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
pub(crate) const PAGE_DELAY: Duration = Duration::from_millis(400);
pub(crate) const MAX_RETRIES: u32 = 5;
pub(crate) const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Search parameters forwarded to the catalog server-side.
///
/// These narrow what gets fetched; the local filter applies the same
/// constraints again (plus the genre clauses) to whatever comes back or
/// is loaded from cache.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Title keyword; empty means unrestricted.
    pub query: String,
    pub kind: Option<MediaKind>,
    pub status: Option<AiringStatus>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub min_score: Option<f64>,
    pub limit_per_page: u32,
    /// Page cap; `None` fetches until the catalog reports no more.
    pub max_pages: Option<u32>,
    /// Ask the catalog to exclude adult entries.
    pub sfw: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            kind: None,
            status: None,
            start_year: None,
            end_year: None,
            min_score: None,
            limit_per_page: 25,
            max_pages: Some(5),
            sfw: false,
        }
    }
}

fn build_params(query: &SearchQuery, page: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", page.to_string()),
        ("limit", query.limit_per_page.to_string()),
        ("order_by", "score".to_string()),
        ("sort", "desc".to_string()),
        ("sfw", query.sfw.to_string()),
    ];
    if !query.query.is_empty() {
        params.push(("q", query.query.clone()));
    }
    if let Some(kind) = query.kind {
        params.push(("type", kind.to_string()));
    }
    if let Some(status) = query.status {
        params.push(("status", status.to_string()));
    }
    if let Some(year) = query.start_year {
        params.push(("start_date", format!("{year}-01-01")));
    }
    if let Some(year) = query.end_year {
        params.push(("end_date", format!("{year}-12-31")));
    }
    if let Some(min) = query.min_score {
        params.push(("min_score", min.to_string()));
    }
    params
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<AnimeEntry>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    current_page: u32,
}

#[derive(Debug, Deserialize)]
struct AnimeEntry {
    mal_id: Option<u64>,
    title: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
    year: Option<i32>,
    aired: Option<Aired>,
    episodes: Option<u32>,
    score: Option<f64>,
    scored_by: Option<u64>,
    #[serde(default)]
    genres: Vec<GenreRef>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Aired {
    prop: Option<AiredProp>,
}

#[derive(Debug, Deserialize)]
struct AiredProp {
    from: Option<AiredDate>,
}

#[derive(Debug, Deserialize)]
struct AiredDate {
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct GenreRef {
    mal_id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    data: Vec<GenreRef>,
}

/// Maps the catalog's long-form status strings onto the local enum.
fn parse_status(raw: &str) -> Option<AiringStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "currently airing" | "airing" => Some(AiringStatus::Airing),
        "finished airing" | "complete" => Some(AiringStatus::Complete),
        "not yet aired" | "upcoming" => Some(AiringStatus::Upcoming),
        _ => None,
    }
}

/// Flattens one API entry. Untitled entries are dropped; unrecognized
/// kind/status strings flatten to absent rather than failing the fetch.
fn flatten(entry: AnimeEntry) -> Option<Record> {
    let year = entry.year.or_else(|| {
        entry
            .aired
            .as_ref()
            .and_then(|aired| aired.prop.as_ref())
            .and_then(|prop| prop.from.as_ref())
            .and_then(|from| from.year)
    });
    let kind = entry.kind.as_deref().and_then(MediaKind::parse);
    let status = entry.status.as_deref().and_then(parse_status);
    let title = entry.title?;
    Some(Record {
        mal_id: entry.mal_id,
        title,
        kind,
        status,
        year,
        episodes: entry.episodes,
        score: entry.score,
        scored_by: entry.scored_by,
        genres: entry.genres.into_iter().map(|g| g.name).collect(),
        url: entry.url,
    })
}

/// Reads the server's `Retry-After` hint in seconds.
pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Jikan REST client.
pub struct JikanClient {
    http: reqwest::Client,
}

impl JikanClient {
    /// # Errors
    ///
    /// `ClientError::Http` if the underlying client cannot be built.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Fetches every page the query allows and flattens the entries.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let response = self.get_page(query, page).await?;
            records.extend(response.data.into_iter().filter_map(flatten));

            let pagination = response.pagination;
            let at_cap = query.max_pages.is_some_and(|cap| page >= cap);
            if at_cap || !pagination.has_next_page {
                break;
            }
            page = pagination.current_page.max(page) + 1;
            tokio::time::sleep(PAGE_DELAY).await;
        }
        info!(records = records.len(), "jikan search complete");
        Ok(records)
    }

    /// Fetches the genre catalog for the resolver.
    pub async fn fetch_genres(&self) -> Result<Vec<(u32, String)>> {
        let url = format!("{BASE_URL}/genres/anime");
        let body: GenreListResponse = self.get_json(&url, &[]).await?;
        Ok(body.data.into_iter().map(|g| (g.mal_id, g.name)).collect())
    }

    async fn get_page(&self, query: &SearchQuery, page: u32) -> Result<SearchResponse> {
        let url = format!("{BASE_URL}/anime");
        let params = build_params(query, page);
        debug!(page, "fetching jikan page");
        self.get_json(&url, &params).await
    }

    async fn get_json<T>(&self, url: &str, params: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        for attempt in 1..=MAX_RETRIES {
            let response = self.http.get(url).query(params).send().await?;
            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let delay = retry_after_secs(response.headers()).max(1);
                warn!(attempt, delay, "rate limited, backing off");
                tokio::time::sleep(Duration::from_secs(delay)).await;
                continue;
            }
            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(ClientError::Api { status, body });
            }
            return Ok(response.json().await?);
        }
        Err(ClientError::RetriesExhausted {
            attempts: MAX_RETRIES,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
    use serde_json::json;

    #[test]
    fn build_params_includes_only_set_fields() {
        let params = build_params(&SearchQuery::default(), 1);
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert!(keys.contains(&"order_by"));
        assert!(keys.contains(&"sort"));
        assert!(!keys.contains(&"q"));
        assert!(!keys.contains(&"type"));
    }

    #[test]
    fn build_params_maps_years_to_date_bounds() {
        let query = SearchQuery {
            query: "bebop".into(),
            kind: Some(MediaKind::Tv),
            status: Some(AiringStatus::Complete),
            start_year: Some(1998),
            end_year: Some(1999),
            ..SearchQuery::default()
        };
        let params = build_params(&query, 2);
        assert!(params.contains(&("page", "2".to_string())));
        assert!(params.contains(&("q", "bebop".to_string())));
        assert!(params.contains(&("type", "tv".to_string())));
        assert!(params.contains(&("status", "complete".to_string())));
        assert!(params.contains(&("start_date", "1998-01-01".to_string())));
        assert!(params.contains(&("end_date", "1999-12-31".to_string())));
    }

    #[test]
    fn status_strings_map_to_the_three_state_model() {
        assert_eq!(parse_status("Currently Airing"), Some(AiringStatus::Airing));
        assert_eq!(
            parse_status("Finished Airing"),
            Some(AiringStatus::Complete)
        );
        assert_eq!(parse_status("Not yet aired"), Some(AiringStatus::Upcoming));
        assert_eq!(parse_status("On Hiatus"), None);
    }

    #[test]
    fn flatten_maps_a_full_entry() {
        let entry: AnimeEntry = serde_json::from_value(json!({
            "mal_id": 1,
            "title": "Cowboy Bebop",
            "type": "TV",
            "status": "Finished Airing",
            "year": null,
            "aired": { "prop": { "from": { "year": 1998 } } },
            "episodes": 26,
            "score": 8.75,
            "scored_by": 1_000_000,
            "genres": [
                { "mal_id": 1, "name": "Action" },
                { "mal_id": 24, "name": "Sci-Fi" }
            ],
            "url": "https://myanimelist.net/anime/1"
        }))
        .unwrap();

        let record = flatten(entry).unwrap();
        assert_eq!(record.mal_id, Some(1));
        assert_eq!(record.kind, Some(MediaKind::Tv));
        assert_eq!(record.status, Some(AiringStatus::Complete));
        // falls back to the aired date when the season year is null
        assert_eq!(record.year, Some(1998));
        assert_eq!(record.votes(), 1_000_000);
        assert!(record.has_genre("sci-fi"));
    }

    #[test]
    fn flatten_keeps_absent_values_absent() {
        let entry: AnimeEntry = serde_json::from_value(json!({
            "mal_id": 2,
            "title": "Obscure OVA",
            "type": "PV",
            "score": null,
            "scored_by": null
        }))
        .unwrap();

        let record = flatten(entry).unwrap();
        assert_eq!(record.kind, None);
        assert_eq!(record.score, None);
        assert_eq!(record.scored_by, None);
        assert_eq!(record.year, None);
    }

    #[test]
    fn flatten_drops_untitled_entries() {
        let entry: AnimeEntry = serde_json::from_value(json!({ "mal_id": 3 })).unwrap();
        assert!(flatten(entry).is_none());
    }

    #[test]
    fn retry_after_header_is_honored_with_a_default() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after_secs(&headers), 7);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after_secs(&headers), DEFAULT_RETRY_AFTER_SECS);

        assert_eq!(retry_after_secs(&HeaderMap::new()), DEFAULT_RETRY_AFTER_SECS);
    }
}
