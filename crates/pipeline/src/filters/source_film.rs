//! Filter to keep a film from being its own candidate.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use sources::Candidate;

/// Removes the source film from its own candidate set.
pub struct SourceFilmFilter;

impl Filter for SourceFilmFilter {
    fn name(&self) -> &str {
        "SourceFilmFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &FilterContext<'_>) -> Result<Vec<Candidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.film_id != context.source_film)
            .collect())
    }
}
