//! Drops films the user has already reviewed.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use sources::Candidate;

/// Keeps only films absent from `UserContext::watched_films`
pub struct AlreadyWatchedFilter;

impl Filter for AlreadyWatchedFilter {
    fn name(&self) -> &str {
        "AlreadyWatchedFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &FilterContext<'_>) -> Result<Vec<Candidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| !context.user.has_watched(candidate.film_id))
            .collect())
    }
}
