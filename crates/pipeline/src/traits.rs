//! Filter trait and the context filters are given.

use anyhow::Result;
use data_loader::FilmId;
use sources::{Candidate, UserContext};

/// What a filter knows about the candidates it is filtering
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// The user the run is for
    pub user: &'a UserContext,

    /// The reviewed film the candidates were gathered for
    pub source_film: FilmId,
}

impl<'a> FilterContext<'a> {
    pub fn new(user: &'a UserContext, source_film: FilmId) -> Self {
        Self { user, source_film }
    }
}

/// A step of the [`FilterPipeline`](crate::FilterPipeline)
///
/// Filters consume the candidate list and return the survivors in their
/// original order.
pub trait Filter: Send + Sync {
    /// Name used in trace logs
    fn name(&self) -> &str;

    fn apply(&self, candidates: Vec<Candidate>, context: &FilterContext<'_>) -> Result<Vec<Candidate>>;
}
