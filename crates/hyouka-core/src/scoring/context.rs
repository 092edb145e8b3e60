use serde::{Deserialize, Serialize};

use crate::error::{HyoukaError, Result};
use crate::types::Record;

/// Prior weight floor when no override is supplied.
pub const MIN_PRIOR_WEIGHT: f64 = 1000.0;

/// Shrinkage prior derived from one filtered batch.
///
/// Both fields depend on the records the current filter kept, so the
/// context is recomputed on every run and never cached across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringContext {
    /// Vote-weighted mean score across records carrying evidence.
    pub prior_mean: f64,
    /// Pseudo-vote count assigned to the prior.
    pub prior_weight: f64,
}

impl ScoringContext {
    #[must_use]
    pub fn new(prior_mean: f64, prior_weight: f64) -> Self {
        Self {
            prior_mean,
            prior_weight,
        }
    }

    /// Derives the prior from `records`.
    ///
    /// The mean is weighted by vote count over records that carry both a
    /// score and votes; the weight is the override if given, otherwise
    /// `max(MIN_PRIOR_WEIGHT, median votes)` with the median taken over
    /// the *whole* batch, absent counts as zero.
    ///
    /// # Errors
    ///
    /// `HyoukaError::InsufficientData` when no record has both a mean
    /// score and a positive vote count.
    pub fn from_records(records: &[Record], prior_override: Option<f64>) -> Result<Self> {
        let mut weighted_sum = 0.0;
        let mut total_votes = 0.0;
        for record in records {
            let votes = record.votes();
            if votes == 0 {
                continue;
            }
            if let Some(score) = record.score {
                weighted_sum += score * votes as f64;
                total_votes += votes as f64;
            }
        }
        if total_votes <= 0.0 {
            return Err(HyoukaError::InsufficientData);
        }

        let prior_weight = match prior_override {
            Some(weight) => weight,
            None => {
                let mut votes: Vec<f64> = records.iter().map(|r| r.votes() as f64).collect();
                MIN_PRIOR_WEIGHT.max(median(&mut votes))
            }
        };

        Ok(Self {
            prior_mean: weighted_sum / total_votes,
            prior_weight,
        })
    }

    /// Fraction of a final score attributable to the prior for a record
    /// with `votes` votes.
    #[must_use]
    pub fn effective_alpha(&self, votes: u64) -> f64 {
        self.prior_weight / (votes as f64 + self.prior_weight)
    }
}

/// Median with the middle pair averaged on even-length input.
pub(crate) fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
