//! Genre catalog resolution.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{HyoukaError, Result};

/// In-memory genre catalog, fetched once per session.
///
/// Tokens resolve either by numeric ID or by case-insensitive name.
/// Unknown tokens are an error rather than being dropped: a silently
/// vanished genre clause would widen the filter without anyone noticing.
#[derive(Debug, Clone, Default)]
pub struct GenreResolver {
    by_id: BTreeMap<u32, String>,
    by_name: HashMap<String, u32>,
}

impl GenreResolver {
    /// Builds the resolver from fetched `(id, name)` pairs.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (u32, String)>) -> Self {
        let mut by_id = BTreeMap::new();
        let mut by_name = HashMap::new();
        for (id, name) in pairs {
            by_name.insert(name.trim().to_ascii_lowercase(), id);
            by_id.insert(id, name);
        }
        Self { by_id, by_name }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All known genres, ordered by ID.
    pub fn list_all(&self) -> impl Iterator<Item = (u32, &str)> {
        self.by_id.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Resolves one token to its canonical name.
    ///
    /// # Errors
    ///
    /// `HyoukaError::UnknownGenre` naming the offending token.
    pub fn resolve(&self, token: &str) -> Result<&str> {
        let token = token.trim();
        let id = if let Ok(id) = token.parse::<u32>() {
            Some(id)
        } else {
            self.by_name.get(&token.to_ascii_lowercase()).copied()
        };
        id.and_then(|id| self.by_id.get(&id))
            .map(String::as_str)
            .ok_or_else(|| HyoukaError::UnknownGenre {
                token: token.to_string(),
            })
    }

    /// Resolves a token list into a canonical-name set.
    ///
    /// Blank tokens are skipped; duplicates collapse. The same operation
    /// serves both the any- and all-genre clauses, which differ only at
    /// match time.
    ///
    /// # Errors
    ///
    /// `HyoukaError::UnknownGenre` for the first unresolvable token.
    pub fn resolve_set<I, S>(&self, tokens: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = BTreeSet::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            out.insert(self.resolve(token)?.to_string());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> GenreResolver {
        GenreResolver::new([
            (1, "Action".to_string()),
            (10, "Fantasy".to_string()),
            (36, "Slice of Life".to_string()),
        ])
    }

    #[test]
    fn resolves_by_id_and_name_equivalently() {
        let resolver = resolver();
        let by_name = resolver.resolve_set(["Action"]).unwrap();
        let by_id = resolver.resolve_set(["1"]).unwrap();
        assert_eq!(by_name, by_id);
    }

    #[test]
    fn resolution_is_case_insensitive() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("sLiCe of LIFE").unwrap(), "Slice of Life");
    }

    #[test]
    fn duplicates_collapse() {
        let resolver = resolver();
        let set = resolver
            .resolve_set(["Action", "1", "action", "Fantasy"])
            .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("Action"));
        assert!(set.contains("Fantasy"));
    }

    #[test]
    fn unknown_token_is_reported() {
        let resolver = resolver();
        let err = resolver.resolve_set(["Action", "Acton"]).unwrap_err();
        assert!(matches!(
            err,
            HyoukaError::UnknownGenre { ref token } if token == "Acton"
        ));
    }

    #[test]
    fn unknown_id_is_reported() {
        let resolver = resolver();
        assert!(resolver.resolve("999").is_err());
    }

    #[test]
    fn blank_tokens_are_skipped() {
        let resolver = resolver();
        let set = resolver.resolve_set(["", "  ", "Action"]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn list_all_is_ordered_by_id() {
        let resolver = resolver();
        let ids: Vec<u32> = resolver.list_all().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 10, 36]);
    }
}
