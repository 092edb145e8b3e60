//! AniList GraphQL client.
//!
//! Fetches the secondary catalog for consensus scoring. Uses the same
//! page-and-backoff discipline as the Jikan client, but speaks GraphQL:
//! one page query with format/status tokens mapped in both directions.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use hyouka_core::merge::AniListEntry;
use hyouka_core::{AiringStatus, MediaKind};

use crate::error::{ClientError, Result};
use crate::jikan::{
    MAX_RETRIES, PAGE_DELAY, REQUEST_TIMEOUT, SearchQuery, USER_AGENT, retry_after_secs,
};

const GRAPHQL_URL: &str = "https://graphql.anilist.co";
const PER_PAGE: u32 = 50;

const PAGE_QUERY: &str = r"
query ($page: Int, $perPage: Int, $search: String, $format: MediaFormat, $status: MediaStatus, $start: FuzzyDateInt, $end: FuzzyDateInt) {
  Page(page: $page, perPage: $perPage) {
    pageInfo { currentPage hasNextPage }
    media(type: ANIME, search: $search, format: $format, status: $status, startDate_greater: $start, startDate_lesser: $end) {
      id
      idMal
      title { romaji english native }
      format
      status
      episodes
      averageScore
      popularity
      favourites
      seasonYear
      startDate { year }
      siteUrl
    }
  }
}
";

fn format_token(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Tv => "TV",
        MediaKind::Movie => "MOVIE",
        MediaKind::Ova => "OVA",
        MediaKind::Special => "SPECIAL",
        MediaKind::Ona => "ONA",
        MediaKind::Music => "MUSIC",
    }
}

fn status_token(status: AiringStatus) -> &'static str {
    match status {
        AiringStatus::Airing => "RELEASING",
        AiringStatus::Complete => "FINISHED",
        AiringStatus::Upcoming => "NOT_YET_RELEASED",
    }
}

fn parse_status(raw: &str) -> Option<AiringStatus> {
    match raw {
        "RELEASING" => Some(AiringStatus::Airing),
        "FINISHED" => Some(AiringStatus::Complete),
        "NOT_YET_RELEASED" => Some(AiringStatus::Upcoming),
        _ => None,
    }
}

/// AniList's fuzzy date integer: `yyyymmdd`.
fn fuzzy_date(year: i32, end: bool) -> i64 {
    i64::from(year) * 10_000 + if end { 1231 } else { 101 }
}

fn build_variables(query: &SearchQuery, page: u32) -> Value {
    json!({
        "page": page,
        "perPage": PER_PAGE,
        "search": if query.query.is_empty() { Value::Null } else { Value::String(query.query.clone()) },
        "format": query.kind.map(format_token),
        "status": query.status.map(status_token),
        "start": query.start_year.map(|year| fuzzy_date(year, false)),
        "end": query.end_year.map(|year| fuzzy_date(year, true)),
    })
}

#[derive(Debug, Deserialize)]
struct GqlResponse {
    data: Option<GqlData>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Debug, Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GqlData {
    #[serde(rename = "Page")]
    page: GqlPage,
}

#[derive(Debug, Deserialize)]
struct GqlPage {
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
    #[serde(default)]
    media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "currentPage", default)]
    current_page: u32,
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct Media {
    id: u64,
    #[serde(rename = "idMal")]
    id_mal: Option<u64>,
    title: Option<MediaTitle>,
    format: Option<String>,
    status: Option<String>,
    episodes: Option<u32>,
    #[serde(rename = "averageScore")]
    average_score: Option<f64>,
    popularity: Option<u64>,
    favourites: Option<u64>,
    #[serde(rename = "seasonYear")]
    season_year: Option<i32>,
    #[serde(rename = "startDate")]
    start_date: Option<StartDate>,
    #[serde(rename = "siteUrl")]
    site_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaTitle {
    romaji: Option<String>,
    english: Option<String>,
    native: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartDate {
    year: Option<i32>,
}

/// Flattens one media node. `averageScore` arrives on a 0–100 scale and
/// is rescaled to match the primary catalog.
fn flatten(media: Media) -> AniListEntry {
    let year = media
        .season_year
        .or_else(|| media.start_date.and_then(|d| d.year));
    let MediaTitle {
        romaji,
        english,
        native,
    } = media.title.unwrap_or_default();
    let title = english
        .or_else(|| romaji.clone())
        .or(native)
        .unwrap_or_default();
    AniListEntry {
        anilist_id: media.id,
        mal_id: media.id_mal,
        title,
        title_romaji: romaji,
        kind: media.format.as_deref().and_then(MediaKind::parse),
        status: media.status.as_deref().and_then(parse_status),
        year,
        episodes: media.episodes,
        score: media.average_score.map(|s| s / 10.0),
        popularity: media.popularity,
        favourites: media.favourites,
        url: media.site_url,
    }
}

/// AniList GraphQL client.
pub struct AniListClient {
    http: reqwest::Client,
}

impl AniListClient {
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

    /// Fetches every page the query allows and flattens the media nodes.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<AniListEntry>> {
        let mut entries = Vec::new();
        let mut page = 1;
        loop {
            let response = self.post_page(query, page).await?;
            let data = response.data.ok_or_else(|| {
                let detail: Vec<String> =
                    response.errors.iter().map(|e| e.message.clone()).collect();
                if detail.is_empty() {
                    ClientError::Decode("missing data field".into())
                } else {
                    ClientError::Decode(detail.join("; "))
                }
            })?;
            entries.extend(data.page.media.into_iter().map(flatten));

            let page_info = data.page.page_info;
            let at_cap = query.max_pages.is_some_and(|cap| page >= cap);
            if at_cap || !page_info.has_next_page {
                break;
            }
            page = page_info.current_page.max(page) + 1;
            tokio::time::sleep(PAGE_DELAY).await;
        }
        info!(entries = entries.len(), "anilist search complete");
        Ok(entries)
    }

    async fn post_page(&self, query: &SearchQuery, page: u32) -> Result<GqlResponse> {
        let payload = json!({
            "query": PAGE_QUERY,
            "variables": build_variables(query, page),
        });
        for attempt in 1..=MAX_RETRIES {
            let response = self.http.post(GRAPHQL_URL).json(&payload).send().await?;
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

    #[test]
    fn tokens_map_both_directions() {
        assert_eq!(format_token(MediaKind::Tv), "TV");
        assert_eq!(format_token(MediaKind::Movie), "MOVIE");
        assert_eq!(status_token(AiringStatus::Airing), "RELEASING");
        assert_eq!(parse_status("RELEASING"), Some(AiringStatus::Airing));
        assert_eq!(parse_status("FINISHED"), Some(AiringStatus::Complete));
        assert_eq!(parse_status("CANCELLED"), None);
        // the format strings round-trip through the shared parser
        assert_eq!(MediaKind::parse(format_token(MediaKind::Ona)), Some(MediaKind::Ona));
    }

    #[test]
    fn fuzzy_dates_bracket_the_year() {
        assert_eq!(fuzzy_date(2010, false), 2010_0101);
        assert_eq!(fuzzy_date(2010, true), 2010_1231);
    }

    #[test]
    fn variables_omit_unset_fields_as_null() {
        let vars = build_variables(&SearchQuery::default(), 1);
        assert!(vars["search"].is_null());
        assert!(vars["format"].is_null());
        assert_eq!(vars["page"], 1);
        assert_eq!(vars["perPage"], PER_PAGE);

        let query = SearchQuery {
            query: "bebop".into(),
            kind: Some(MediaKind::Movie),
            start_year: Some(2001),
            ..SearchQuery::default()
        };
        let vars = build_variables(&query, 3);
        assert_eq!(vars["search"], "bebop");
        assert_eq!(vars["format"], "MOVIE");
        assert_eq!(vars["start"], 2001_0101);
    }

    #[test]
    fn flatten_rescales_and_prefers_the_english_title() {
        let media: Media = serde_json::from_value(json!({
            "id": 5,
            "idMal": 1,
            "title": { "romaji": "Kaubōi Bibappu", "english": "Cowboy Bebop", "native": "カウボーイビバップ" },
            "format": "TV",
            "status": "FINISHED",
            "episodes": 26,
            "averageScore": 86,
            "popularity": 400_000,
            "seasonYear": 1998,
            "siteUrl": "https://anilist.co/anime/1"
        }))
        .unwrap();

        let entry = flatten(media);
        assert_eq!(entry.title, "Cowboy Bebop");
        assert_eq!(entry.title_romaji.as_deref(), Some("Kaubōi Bibappu"));
        assert_eq!(entry.kind, Some(MediaKind::Tv));
        assert_eq!(entry.status, Some(AiringStatus::Complete));
        assert!((entry.score.unwrap() - 8.6).abs() < 1e-9);
        assert_eq!(entry.year, Some(1998));
    }

    #[test]
    fn flatten_falls_back_to_romaji_and_start_date() {
        let media: Media = serde_json::from_value(json!({
            "id": 6,
            "title": { "romaji": "Mushishi" },
            "startDate": { "year": 2005 }
        }))
        .unwrap();

        let entry = flatten(media);
        assert_eq!(entry.title, "Mushishi");
        assert_eq!(entry.year, Some(2005));
        assert_eq!(entry.score, None);
        assert_eq!(entry.mal_id, None);
    }
}
