//! Ordered chain of candidate exclusions.
//!
//! A ranking run applies [`FilterPipeline::exclusions`] to the candidates of
//! every reviewed film before scoring them.

use crate::filters::{AlreadyWatchedFilter, SourceFilmFilter};
use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use sources::Candidate;

/// Filters applied one after another to a candidate list
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyWatchedFilter)
///     .add_filter(SourceFilmFilter);
///
/// let filtered = pipeline.apply(candidates, &FilterContext::new(&user, source_id))?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Pipeline that keeps every candidate
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The exclusions every ranking run applies: watched films and the source film
    pub fn exclusions() -> Self {
        Self::new()
            .add_filter(AlreadyWatchedFilter)
            .add_filter(SourceFilmFilter)
    }

    /// Append `filter`; filters run in the order they were added
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Run the filters in order; stops early once nothing is left
    pub fn apply(&self, candidates: Vec<Candidate>, context: &FilterContext<'_>) -> Result<Vec<Candidate>> {
        let mut current = candidates;
        for filter in &self.filters {
            if current.is_empty() {
                break;
            }
            let before = current.len();
            current = filter.apply(current, context)?;
            tracing::trace!(
                filter = filter.name(),
                before,
                after = current.len(),
                "Filter applied"
            );
        }
        Ok(current)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{CandidateSource, UserContext};

    #[test]
    fn test_pipeline_without_filters_keeps_everything() {
        let pipeline = FilterPipeline::default();
        let user = UserContext::new(1);

        let candidates = vec![
            Candidate::new(1, CandidateSource::FeatureIndex, 0.9),
            Candidate::new(2, CandidateSource::GenrePrior, 0.0),
        ];

        let filtered = pipeline.apply(candidates, &FilterContext::new(&user, 99)).unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_watched_film_is_dropped() {
        let mut user = UserContext::new(1);
        user.watched_films.insert(1);

        let pipeline = FilterPipeline::new().add_filter(AlreadyWatchedFilter);

        let candidates = vec![
            Candidate::new(1, CandidateSource::FeatureIndex, 0.9),
            Candidate::new(2, CandidateSource::FeatureIndex, 0.8),
        ];

        let filtered = pipeline.apply(candidates, &FilterContext::new(&user, 99)).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].film_id, 2);
    }

    #[test]
    fn test_exclusions_drop_watched_and_source() {
        let mut user = UserContext::new(1);
        user.watched_films.insert(2);

        let pipeline = FilterPipeline::exclusions();
        assert_eq!(pipeline.len(), 2);

        let candidates = (1..=4)
            .map(|id| Candidate::new(id, CandidateSource::FeatureIndex, 1.0))
            .collect();

        let filtered = pipeline.apply(candidates, &FilterContext::new(&user, 3)).unwrap();
        let ids: Vec<u32> = filtered.iter().map(|c| c.film_id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
