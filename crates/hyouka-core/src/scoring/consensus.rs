//! Consensus scoring across both catalogs.
//!
//! Each merged record's MAL and AniList means are blended with
//! `log10(1 + votes)` weights, AniList popularity standing in for votes
//! at a configurable rate. The blended (mean, votes) pairs then go
//! through the same shrinkage as the single-catalog path.

use crate::error::{HyoukaError, Result};
use crate::merge::MergedRecord;

use super::context::{MIN_PRIOR_WEIGHT, ScoringContext, median};
use super::shrinkage::{Scored, shrink};

/// Default fraction of AniList popularity counted as pseudo-votes.
pub const DEFAULT_POPULARITY_ALPHA: f64 = 0.30;

fn signal_weight(votes: f64) -> f64 {
    (1.0 + votes.max(0.0)).log10()
}

/// Blended (mean, votes) evidence for one merged record, or `None` when
/// neither catalog carries a usable signal.
fn consensus_evidence(row: &MergedRecord, popularity_alpha: f64) -> Option<(f64, f64)> {
    let mal_votes = row.record.votes() as f64;
    let mal_mean = row.record.score;
    let ani = row.anilist.as_ref();
    let ani_mean = ani.and_then(|a| a.score);
    let ani_votes = popularity_alpha * ani.and_then(|a| a.popularity).unwrap_or(0) as f64;

    let mut means: Vec<f64> = Vec::with_capacity(2);
    let mut weights: Vec<f64> = Vec::with_capacity(2);
    if let Some(mean) = mal_mean {
        if mal_votes > 0.0 {
            means.push(mean);
            weights.push(signal_weight(mal_votes));
        }
    }
    if let Some(mean) = ani_mean {
        if ani_votes > 0.0 {
            means.push(mean);
            weights.push(signal_weight(ani_votes));
        }
    }

    let total_weight: f64 = weights.iter().sum();
    if !means.is_empty() && total_weight > 0.0 {
        let blended = means
            .iter()
            .zip(&weights)
            .map(|(mean, weight)| mean * weight)
            .sum::<f64>()
            / total_weight;
        return Some((blended, mal_votes + ani_votes));
    }

    // Single-catalog fallback: keep the raw mean with at least one vote
    // of evidence so the record still participates.
    if let Some(mean) = mal_mean {
        return Some((mean, mal_votes.max(1.0)));
    }
    if let Some(mean) = ani_mean {
        return Some((mean, ani_votes.max(1.0)));
    }
    None
}

/// Scores merged records with the consensus blend.
///
/// # Errors
///
/// `HyoukaError::InsufficientData` when no row carries a signal from
/// either catalog; `HyoukaError::DegeneratePrior` propagates from a
/// zero-weight override meeting a zero-vote row.
pub fn score_consensus(
    rows: &[MergedRecord],
    prior_override: Option<f64>,
    popularity_alpha: f64,
) -> Result<Vec<Scored>> {
    let mut kept: Vec<(&MergedRecord, f64, f64)> = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some((mean, votes)) = consensus_evidence(row, popularity_alpha) {
            kept.push((row, mean, votes));
        }
    }
    if kept.is_empty() {
        return Err(HyoukaError::InsufficientData);
    }

    let total: f64 = kept.iter().map(|(_, _, votes)| votes).sum();
    let prior_mean = kept
        .iter()
        .map(|(_, mean, votes)| mean * votes)
        .sum::<f64>()
        / total;
    let prior_weight = match prior_override {
        Some(weight) => weight,
        None => {
            let mut votes: Vec<f64> = kept.iter().map(|(_, _, votes)| *votes).collect();
            MIN_PRIOR_WEIGHT.max(median(&mut votes))
        }
    };
    let ctx = ScoringContext::new(prior_mean, prior_weight);

    kept.into_iter()
        .map(|(row, mean, votes)| {
            shrink(mean, votes, &ctx).map(|score| Scored {
                record: row.record.clone(),
                score,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::AniListSignal;
    use crate::types::Record;

    fn row(
        mal: Option<(f64, u64)>,
        ani: Option<(f64, u64)>,
    ) -> MergedRecord {
        let mut record = Record::new("x");
        if let Some((score, votes)) = mal {
            record.score = Some(score);
            record.scored_by = Some(votes);
        }
        let anilist = ani.map(|(score, popularity)| AniListSignal {
            anilist_id: 1,
            title_romaji: None,
            score: Some(score),
            popularity: Some(popularity),
            favourites: None,
            url: None,
        });
        MergedRecord { record, anilist }
    }

    #[test]
    fn blends_both_signals_with_log_weights() {
        let merged = row(Some((8.0, 9_999)), Some((9.0, 33_330)));
        // mal weight log10(1 + 9999) = 4; ani pseudo-votes 0.3 * 33330 = 9999 -> weight 4
        let (mean, votes) = consensus_evidence(&merged, 0.30).unwrap();
        assert!((mean - 8.5).abs() < 1e-9, "blended mean {mean}");
        assert!((votes - 19_998.0).abs() < 1e-6);
    }

    #[test]
    fn falls_back_to_the_only_catalog_with_a_signal() {
        let mal_only = row(Some((7.0, 100)), None);
        let (mean, votes) = consensus_evidence(&mal_only, 0.30).unwrap();
        assert!((mean - 7.0).abs() < 1e-9);
        assert!((votes - 100.0).abs() < 1e-9);

        // an AniList-only stand-in has no MAL votes at all
        let ani_only = row(None, Some((8.4, 1000)));
        let (mean, votes) = consensus_evidence(&ani_only, 0.30).unwrap();
        assert!((mean - 8.4).abs() < 1e-9);
        assert!((votes - 300.0).abs() < 1e-9);
    }

    #[test]
    fn zero_popularity_alpha_silences_the_second_catalog() {
        let merged = row(Some((8.0, 1000)), Some((2.0, 1_000_000)));
        let (mean, _) = consensus_evidence(&merged, 0.0).unwrap();
        assert!((mean - 8.0).abs() < 1e-9);
    }

    #[test]
    fn signalless_rows_drop_and_empty_batches_error() {
        let rows = vec![row(None, None)];
        assert!(matches!(
            score_consensus(&rows, None, 0.30),
            Err(HyoukaError::InsufficientData)
        ));

        let rows = vec![row(Some((8.0, 1000)), None), row(None, None)];
        let scored = score_consensus(&rows, None, 0.30).unwrap();
        assert_eq!(scored.len(), 1);
    }

    #[test]
    fn consensus_scores_are_convex() {
        let rows = vec![
            row(Some((8.0, 50_000)), Some((8.6, 120_000))),
            row(Some((6.0, 200)), None),
            row(None, Some((9.1, 4_000))),
        ];
        let scored = score_consensus(&rows, None, 0.30).unwrap();
        for s in &scored {
            assert!(s.score > 0.0 && s.score < 10.0);
        }
    }
}
