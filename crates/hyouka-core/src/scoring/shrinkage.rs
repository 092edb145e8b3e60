use crate::error::{HyoukaError, Result};
use crate::types::Record;

use super::context::ScoringContext;

/// A record paired with its shrinkage-adjusted score.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub record: Record,
    pub score: f64,
}

/// Convex shrinkage of an observed mean toward the prior:
/// `(n / (n + m)) * mean + (m / (n + m)) * prior_mean`.
///
/// # Errors
///
/// `HyoukaError::DegeneratePrior` when `votes + prior_weight` is zero,
/// which can only happen with a user-overridden weight of zero.
pub fn shrink(mean: f64, votes: f64, ctx: &ScoringContext) -> Result<f64> {
    let denom = votes + ctx.prior_weight;
    if denom == 0.0 {
        return Err(HyoukaError::DegeneratePrior);
    }
    Ok((votes / denom) * mean + (ctx.prior_weight / denom) * ctx.prior_mean)
}

/// Scores one record against the batch prior.
///
/// A record without a mean score uses the prior mean as its own, so its
/// final score collapses exactly to the prior: it contributes no
/// information of its own.
pub fn bayesian_score(record: &Record, ctx: &ScoringContext) -> Result<f64> {
    let mean = record.score.unwrap_or(ctx.prior_mean);
    shrink(mean, record.votes() as f64, ctx)
}

/// Scores a whole batch. Pure: identical inputs give identical output.
pub fn score_all(records: &[Record], ctx: &ScoringContext) -> Result<Vec<Scored>> {
    records
        .iter()
        .map(|record| {
            bayesian_score(record, ctx).map(|score| Scored {
                record: record.clone(),
                score,
            })
        })
        .collect()
}
