//! Weighted top-K candidate pruning over the inverted index.
//!
//! ## Algorithm
//! 1. Every tag of the source film adds its weight to each film in its
//!    posting set
//! 2. If no more than `k` films received weight, all of them are kept
//! 3. Otherwise the `k` heaviest films are kept, ties broken by ascending id

use crate::film_index::FilmIndex;
use crate::types::{Candidate, CandidateSource};
use crate::weights::WeightResolver;
use data_loader::FilmId;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Default lower bound on the number of candidates kept per source film
pub const DEFAULT_BASE_K: usize = 200;

/// Candidates kept per feature of the source film
const K_PER_FEATURE: usize = 20;

/// Size of the candidate cut for a film with `feature_count` tags
pub fn candidate_k(base_k: usize, feature_count: usize) -> usize {
    base_k.max(feature_count * K_PER_FEATURE)
}

/// Selects the structurally closest films for a source film
pub struct CandidateSelector<'a> {
    index: &'a FilmIndex,
    resolver: &'a WeightResolver,
    base_k: usize,
}

impl<'a> CandidateSelector<'a> {
    pub fn new(index: &'a FilmIndex, resolver: &'a WeightResolver) -> Self {
        Self {
            index,
            resolver,
            base_k: DEFAULT_BASE_K,
        }
    }

    /// Configure the lower bound of the cut (default: 200)
    pub fn with_base_k(mut self, base_k: usize) -> Self {
        self.base_k = base_k;
        self
    }

    /// Candidates for a source film described by `features`
    #[instrument(skip(self, features), fields(features = features.len()))]
    pub fn select(&self, features: &[String]) -> Vec<Candidate> {
        let k = candidate_k(self.base_k, features.len());
        let candidates = top_k_by_weight(features, self.index, self.resolver, k);
        debug!("Selected {} structural candidates (k = {})", candidates.len(), k);
        candidates
    }
}

/// The `k` films sharing the most feature weight with `features`.
///
/// Returned candidates are ordered by weight descending, then id ascending.
pub fn top_k_by_weight(
    features: &[String],
    index: &FilmIndex,
    resolver: &WeightResolver,
    k: usize,
) -> Vec<Candidate> {
    let mut weights: BTreeMap<FilmId, f32> = BTreeMap::new();
    for tag in features {
        let Some(postings) = index.postings(tag) else {
            continue;
        };
        let w = resolver.weight(tag);
        for &film_id in postings {
            *weights.entry(film_id).or_insert(0.0) += w;
        }
    }

    let mut ranked: Vec<(FilmId, f32)> = weights.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(k);

    ranked
        .into_iter()
        .map(|(film_id, weight)| Candidate::new(film_id, CandidateSource::FeatureIndex, weight))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::FeatureWeights;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn build() -> (FilmIndex, WeightResolver) {
        let mut index = FilmIndex::new();
        index.add(1, &tags(&["genre:crime", "director:michael mann"]));
        index.add(2, &tags(&["genre:crime", "actor:al pacino"]));
        index.add(3, &tags(&["genre:crime"]));
        index.add(4, &tags(&["genre:crime"]));
        index.add(5, &tags(&["genre:comedy"]));
        (index, WeightResolver::new(FeatureWeights::default()))
    }

    #[test]
    fn test_candidate_k() {
        assert_eq!(candidate_k(200, 3), 200);
        assert_eq!(candidate_k(200, 15), 300);
        assert_eq!(candidate_k(0, 0), 0);
    }

    #[test]
    fn test_returns_all_when_under_k() {
        let (index, resolver) = build();
        let source = tags(&["genre:crime"]);

        let ids: Vec<FilmId> = top_k_by_weight(&source, &index, &resolver, 10)
            .iter()
            .map(|c| c.film_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_keeps_heaviest() {
        let (index, resolver) = build();
        let source = tags(&["genre:crime", "director:michael mann", "actor:al pacino"]);

        let top = top_k_by_weight(&source, &index, &resolver, 2);
        assert_eq!(top.len(), 2);
        // 1: 1.5 + 3.0, 2: 1.5 + 2.0
        assert_eq!(top[0].film_id, 1);
        assert!((top[0].selection_weight - 4.5).abs() < 1e-6);
        assert_eq!(top[1].film_id, 2);
    }

    #[test]
    fn test_ties_cut_by_ascending_id() {
        let (index, resolver) = build();
        let source = tags(&["genre:crime"]);

        let ids: Vec<FilmId> = top_k_by_weight(&source, &index, &resolver, 3)
            .iter()
            .map(|c| c.film_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_selector_uses_feature_scaled_k() {
        let (index, resolver) = build();
        let selector = CandidateSelector::new(&index, &resolver).with_base_k(1);

        // one feature gives k = max(1, 20)
        let selected = selector.select(&tags(&["genre:crime"]));
        assert_eq!(selected.len(), 4);
        assert!(selected.iter().all(|c| c.source == CandidateSource::FeatureIndex));
    }
}
