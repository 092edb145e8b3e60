//! Local record filtering.

use crate::types::{FilterCriteria, Record};

/// Returns `true` when `record` satisfies every configured clause.
#[must_use]
pub fn matches(record: &Record, criteria: &FilterCriteria) -> bool {
    if let Some(kind) = criteria.kind {
        if record.kind != Some(kind) {
            return false;
        }
    }
    if let Some(status) = criteria.status {
        if record.status != Some(status) {
            return false;
        }
    }
    if criteria.year_from.is_some() || criteria.year_to.is_some() {
        // A record without a year cannot prove it lies inside the bounds.
        let Some(year) = record.year else {
            return false;
        };
        if criteria.year_from.is_some_and(|from| year < from) {
            return false;
        }
        if criteria.year_to.is_some_and(|to| year > to) {
            return false;
        }
    }
    if let Some(min_score) = criteria.min_score {
        match record.score {
            Some(score) if score >= min_score => {}
            _ => return false,
        }
    }
    if let Some(min_votes) = criteria.min_scored_by {
        if record.votes() < min_votes {
            return false;
        }
    }
    if let Some(required) = &criteria.all_genres {
        if !required.iter().all(|genre| record.has_genre(genre)) {
            return false;
        }
    }
    if let Some(wanted) = &criteria.any_genres {
        if !wanted.iter().any(|genre| record.has_genre(genre)) {
            return false;
        }
    }
    true
}

/// Applies `criteria` to a batch, preserving input order.
///
/// The output is always a subsequence of the input; applying the same
/// criteria twice yields the same result as applying them once.
#[must_use]
pub fn apply(records: &[Record], criteria: &FilterCriteria) -> Vec<Record> {
    let kept: Vec<Record> = records
        .iter()
        .filter(|record| matches(record, criteria))
        .cloned()
        .collect();
    tracing::debug!(input = records.len(), kept = kept.len(), "filter applied");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AiringStatus, MediaKind};
    use std::collections::BTreeSet;

    fn record(title: &str, year: Option<i32>, votes: Option<u64>) -> Record {
        let mut r = Record::new(title);
        r.kind = Some(MediaKind::Tv);
        r.status = Some(AiringStatus::Complete);
        r.year = year;
        r.score = Some(7.0);
        r.scored_by = votes;
        r
    }

    fn genre_set(names: &[&str]) -> Option<BTreeSet<String>> {
        Some(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn empty_criteria_keep_everything_in_order() {
        let records = vec![
            record("b", Some(2001), Some(10)),
            record("a", Some(2002), Some(20)),
            record("c", None, None),
        ];
        let out = apply(&records, &FilterCriteria::default());
        assert_eq!(out, records);
    }

    #[test]
    fn filtering_twice_equals_filtering_once() {
        let records = vec![
            record("a", Some(2001), Some(10)),
            record("b", Some(2011), Some(20)),
            record("c", Some(2021), Some(30)),
        ];
        let criteria = FilterCriteria {
            year_from: Some(2005),
            ..FilterCriteria::default()
        };
        let once = apply(&records, &criteria);
        let twice = apply(&once, &criteria);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn kind_mismatch_excludes() {
        let criteria = FilterCriteria {
            kind: Some(MediaKind::Movie),
            year_from: Some(2010),
            year_to: Some(2020),
            ..FilterCriteria::default()
        };
        // tv record fails the movie clause
        assert!(!matches(&record("x", Some(2015), Some(10)), &criteria));

        let mut movie = record("y", Some(2015), Some(10));
        movie.kind = Some(MediaKind::Movie);
        assert!(matches(&movie, &criteria));
    }

    #[test]
    fn year_outside_bounds_excludes() {
        let criteria = FilterCriteria {
            year_from: Some(2010),
            year_to: Some(2020),
            ..FilterCriteria::default()
        };
        assert!(!matches(&record("x", Some(2021), Some(10)), &criteria));
        assert!(!matches(&record("x", Some(2009), Some(10)), &criteria));
        assert!(matches(&record("x", Some(2010), Some(10)), &criteria));
        assert!(matches(&record("x", Some(2020), Some(10)), &criteria));
    }

    #[test]
    fn absent_year_fails_when_any_bound_is_set() {
        let from_only = FilterCriteria {
            year_from: Some(2010),
            ..FilterCriteria::default()
        };
        let to_only = FilterCriteria {
            year_to: Some(2020),
            ..FilterCriteria::default()
        };
        let unbounded = FilterCriteria::default();
        let dateless = record("x", None, Some(10));
        assert!(!matches(&dateless, &from_only));
        assert!(!matches(&dateless, &to_only));
        assert!(matches(&dateless, &unbounded));
    }

    #[test]
    fn absent_votes_count_as_zero_for_threshold() {
        let criteria = FilterCriteria {
            min_scored_by: Some(50_000),
            ..FilterCriteria::default()
        };
        assert!(!matches(&record("x", Some(2015), None), &criteria));
        assert!(!matches(&record("x", Some(2015), Some(49_999)), &criteria));
        assert!(matches(&record("x", Some(2015), Some(50_000)), &criteria));
    }

    #[test]
    fn min_score_excludes_absent_score() {
        let criteria = FilterCriteria {
            min_score: Some(6.0),
            ..FilterCriteria::default()
        };
        let mut unscored = record("x", Some(2015), Some(10));
        unscored.score = None;
        assert!(!matches(&unscored, &criteria));
        assert!(matches(&record("x", Some(2015), Some(10)), &criteria));
    }

    #[test]
    fn all_genres_requires_superset() {
        let criteria = FilterCriteria {
            all_genres: genre_set(&["Action", "Fantasy"]),
            ..FilterCriteria::default()
        };
        let mut r = record("x", Some(2015), Some(10));
        r.genres.insert("action".into());
        assert!(!matches(&r, &criteria));
        r.genres.insert("Fantasy".into());
        assert!(matches(&r, &criteria));
    }

    #[test]
    fn any_genres_requires_intersection() {
        let criteria = FilterCriteria {
            any_genres: genre_set(&["Action", "Fantasy"]),
            ..FilterCriteria::default()
        };
        let mut r = record("x", Some(2015), Some(10));
        r.genres.insert("Drama".into());
        assert!(!matches(&r, &criteria));
        r.genres.insert("FANTASY".into());
        assert!(matches(&r, &criteria));
    }
}
