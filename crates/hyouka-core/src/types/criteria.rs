use std::collections::BTreeSet;

use super::record::{AiringStatus, MediaKind};

/// One run's filter configuration.
///
/// Unset clauses are vacuously true. All clauses combine conjunctively;
/// `any_genres` is the only internally disjunctive one. Genre sets hold
/// canonical names produced by the resolver, never raw user tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub kind: Option<MediaKind>,
    pub status: Option<AiringStatus>,
    /// Inclusive lower year bound.
    pub year_from: Option<i32>,
    /// Inclusive upper year bound.
    pub year_to: Option<i32>,
    pub min_score: Option<f64>,
    pub min_scored_by: Option<u64>,
    /// Record must carry at least one of these.
    pub any_genres: Option<BTreeSet<String>>,
    /// Record must carry all of these.
    pub all_genres: Option<BTreeSet<String>>,
}
