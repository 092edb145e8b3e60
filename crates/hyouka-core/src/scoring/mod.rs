pub mod consensus;
pub mod context;
pub mod shrinkage;

pub use consensus::{DEFAULT_POPULARITY_ALPHA, score_consensus};
pub use context::{MIN_PRIOR_WEIGHT, ScoringContext};
pub use shrinkage::{Scored, bayesian_score, score_all};
