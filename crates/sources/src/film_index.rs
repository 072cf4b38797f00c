//! Inverted index from feature tag to the films carrying it.

use data_loader::FilmId;
use std::collections::{BTreeSet, HashMap};

/// Posting sets per tag. Sets are ordered so candidate iteration is stable.
#[derive(Debug, Default)]
pub struct FilmIndex {
    postings: HashMap<String, BTreeSet<FilmId>>,
}

impl FilmIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `film_id` to the posting set of every tag
    pub fn add(&mut self, film_id: FilmId, features: &[String]) {
        for tag in features {
            self.postings
                .entry(tag.clone())
                .or_default()
                .insert(film_id);
        }
    }

    /// Films indexed under `tag`
    pub fn postings(&self, tag: &str) -> Option<&BTreeSet<FilmId>> {
        self.postings.get(tag)
    }

    /// Union of the posting sets of `features`
    pub fn candidates_for(&self, features: &[String]) -> BTreeSet<FilmId> {
        features
            .iter()
            .filter_map(|tag| self.postings.get(tag))
            .flatten()
            .copied()
            .collect()
    }

    /// Number of distinct tags
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
