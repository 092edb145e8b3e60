//! Deterministic ranking of scored records.

use crate::scoring::Scored;

/// Sorts descending by score and keeps the best `k`.
///
/// Ties break by descending vote count, then ascending title, so equal
/// scores always render in the same order.
#[must_use]
pub fn top_k(mut scored: Vec<Scored>, k: usize) -> Vec<Scored> {
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.record.votes().cmp(&a.record.votes()))
            .then_with(|| a.record.title.cmp(&b.record.title))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    fn scored(title: &str, score: f64, votes: u64) -> Scored {
        let mut record = Record::new(title);
        record.scored_by = Some(votes);
        Scored { record, score }
    }

    #[test]
    fn output_length_is_min_of_k_and_input() {
        let input = vec![
            scored("a", 1.0, 1),
            scored("b", 2.0, 1),
            scored("c", 3.0, 1),
        ];
        assert_eq!(top_k(input.clone(), 0).len(), 0);
        assert_eq!(top_k(input.clone(), 2).len(), 2);
        assert_eq!(top_k(input, 10).len(), 3);
    }

    #[test]
    fn sorted_non_increasing_by_score() {
        let input = vec![
            scored("a", 7.1, 1),
            scored("b", 9.3, 1),
            scored("c", 8.2, 1),
        ];
        let out = top_k(input, 10);
        for pair in out.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(out[0].record.title, "b");
    }

    #[test]
    fn equal_scores_break_on_votes_then_title() {
        let input = vec![
            scored("zeta", 8.0, 100),
            scored("alpha", 8.0, 100),
            scored("mid", 8.0, 500),
        ];
        let out = top_k(input, 10);
        assert_eq!(out[0].record.title, "mid");
        assert_eq!(out[1].record.title, "alpha");
        assert_eq!(out[2].record.title, "zeta");
    }

    #[test]
    fn truncates_after_sorting() {
        let input = vec![scored("low", 1.0, 1), scored("high", 9.0, 1)];
        let out = top_k(input, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record.title, "high");
    }
}
