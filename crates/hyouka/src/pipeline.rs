//! Drives one `start` run end to end:
//! conditional fetch → cache write → filter → score → rank → chart.

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::warn;

use hyouka_client::{AniListClient, JikanClient};
use hyouka_core::{GenreResolver, Record, ScoringContext, filter, merge, rank, scoring};

use crate::chart;
use crate::params::SessionParams;

/// Session-lived application state: the async runtime, both clients,
/// and the lazily fetched genre catalog. Run state (criteria, context,
/// scores) is rebuilt from scratch on every `start`.
pub struct App {
    runtime: Runtime,
    jikan: JikanClient,
    anilist: AniListClient,
    resolver: Option<GenreResolver>,
}

impl App {
    /// # Errors
    ///
    /// Fails when the async runtime or an HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self {
            runtime: Runtime::new().context("failed to start async runtime")?,
            jikan: JikanClient::new().context("failed to build Jikan client")?,
            anilist: AniListClient::new().context("failed to build AniList client")?,
            resolver: None,
        })
    }

    /// Fetches the genre catalog on first use and keeps it for the
    /// whole session.
    ///
    /// # Errors
    ///
    /// Terminal fetch errors from the genre endpoint.
    pub fn resolver(&mut self) -> Result<&GenreResolver> {
        let resolver = match self.resolver.take() {
            Some(resolver) => resolver,
            None => {
                let pairs = self
                    .runtime
                    .block_on(self.jikan.fetch_genres())
                    .context("fetching genre catalog")?;
                GenreResolver::new(pairs)
            }
        };
        Ok(self.resolver.insert(resolver))
    }

    /// Runs the full pipeline for the current parameters. Every error
    /// is terminal to this run only: parameters, the session, and the
    /// on-disk cache all survive.
    ///
    /// # Errors
    ///
    /// Fetch failures, unresolvable genre tokens, and the scorer's
    /// insufficient-data / degenerate-prior conditions.
    pub fn run(&mut self, params: &SessionParams) -> Result<()> {
        let records = self.collect_records(params)?;
        if records.is_empty() {
            println!("No records to analyze.");
            return Ok(());
        }

        let criteria = if params.any_genres.is_some() || params.all_genres.is_some() {
            params.criteria(self.resolver()?)?
        } else {
            // no genre clauses, nothing to resolve
            params.criteria(&GenreResolver::default())?
        };
        let filtered = filter::apply(&records, &criteria);
        println!("Filtered: {} of {} records", filtered.len(), records.len());
        if filtered.is_empty() {
            println!("Nothing matched the filter.");
            return Ok(());
        }

        let scored = if params.use_anilist {
            let entries = if params.no_fetch {
                Vec::new()
            } else {
                println!("Fetching from AniList ...");
                self.runtime
                    .block_on(self.anilist.search(&params.search_query()))
                    .context("AniList fetch failed")?
            };
            let merged = merge::merge(&filtered, &entries);
            scoring::score_consensus(&merged, params.prior_weight, params.popularity_alpha)?
        } else {
            let ctx = ScoringContext::from_records(&filtered, params.prior_weight)?;
            scoring::score_all(&filtered, &ctx)?
        };

        let k = usize::try_from(params.top_k).unwrap_or(0);
        let ranked = rank::top_k(scored, k);
        if ranked.is_empty() {
            println!("No scored records to chart.");
            return Ok(());
        }

        let pairs: Vec<(String, f64)> = ranked
            .iter()
            .map(|scored| (label(&scored.record), scored.score))
            .collect();
        print!("{}", chart::render(&chart_title(params), &pairs));
        Ok(())
    }

    /// Either a fresh fetch (written through to the cache) or the cache
    /// itself. A broken cache degrades to empty instead of killing the
    /// session.
    fn collect_records(&mut self, params: &SessionParams) -> Result<Vec<Record>> {
        if params.no_fetch {
            println!("Skip fetching; loading cache.");
            return Ok(match hyouka_cache::load(&params.cache_path) {
                Ok(records) => records,
                Err(err) => {
                    warn!(error = %err, "cache unreadable, treating as empty");
                    println!("[!] Cache unreadable ({err}); treating as empty.");
                    Vec::new()
                }
            });
        }

        println!("Fetching from Jikan ...");
        let records = self
            .runtime
            .block_on(self.jikan.search(&params.search_query()))
            .context("Jikan fetch failed")?;
        if let Err(err) = hyouka_cache::save(&params.cache_path, &records) {
            warn!(error = %err, "cache write failed");
            println!("[!] Cache write failed ({err}); continuing without cache.");
        }
        Ok(records)
    }
}

fn label(record: &Record) -> String {
    match record.year {
        Some(year) => format!("{} ({year})", record.title),
        None => format!("{} (—)", record.title),
    }
}

fn chart_title(params: &SessionParams) -> String {
    let prefix = if params.use_anilist {
        "Anime Consensus Ranking (MAL+AniList)"
    } else {
        "Anime Bayesian Ranking"
    };
    let mut bits: Vec<String> = Vec::new();
    if !params.query.is_empty() {
        bits.push(format!("q={:?}", params.query));
    }
    if let Some(kind) = params.kind {
        bits.push(kind.to_string().to_uppercase());
    }
    if let Some(status) = params.status {
        bits.push(status.to_string());
    }
    if params.year_from.is_some() || params.year_to.is_some() {
        let from = params.year_from.map(|y| y.to_string()).unwrap_or_default();
        let to = params.year_to.map(|y| y.to_string()).unwrap_or_default();
        bits.push(format!("{from}-{to}"));
    }
    if let Some(min) = params.min_score {
        bits.push(format!("min_score>={min}"));
    }
    if let Some(min) = params.min_scored_by {
        bits.push(format!("min_votes>={min}"));
    }
    if let Some(genres) = &params.any_genres {
        bits.push(format!("genres_any={}", genres.join("|")));
    }
    if let Some(genres) = &params.all_genres {
        bits.push(format!("genres_all={}", genres.join("|")));
    }
    if bits.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix} - {}", bits.join(", "))
    }
}
