//! # Hyouka Core
//!
//! The heart of the hyouka catalog explorer. Provides the flattened
//! record model, genre resolution, local filtering, Bayesian-shrinkage
//! scoring, cross-catalog consensus, and deterministic ranking over one
//! in-memory batch of catalog records.
//!
//! The pipeline is pure and synchronous: fetching, persistence, and
//! rendering live in sibling crates.
//!
//! ## Quick Start
//!
//! ```rust
//! use hyouka_core::{FilterCriteria, Record, ScoringContext, filter, rank, scoring};
//!
//! let mut a = Record::new("Steins;Gate");
//! a.score = Some(9.0);
//! a.scored_by = Some(1_400_000);
//! let mut b = Record::new("Island");
//! b.score = Some(6.5);
//! b.scored_by = Some(40_000);
//!
//! let kept = filter::apply(&[a, b], &FilterCriteria::default());
//! let ctx = ScoringContext::from_records(&kept, None).unwrap();
//! let ranked = rank::top_k(scoring::score_all(&kept, &ctx).unwrap(), 10);
//!
//! assert_eq!(ranked[0].record.title, "Steins;Gate");
//! ```
pub mod error;
pub mod filter;
pub mod genres;
pub mod merge;
pub mod rank;
pub mod scoring;
pub mod types;

// Re-export primary API
pub use error::{HyoukaError, Result};
pub use genres::GenreResolver;
pub use merge::{AniListEntry, AniListSignal, MergedRecord};
pub use scoring::{Scored, ScoringContext};
pub use types::{AiringStatus, FilterCriteria, MediaKind, Record};
