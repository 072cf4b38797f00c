//! Genre-profile boost for a candidate.

use serde::{Deserialize, Serialize};
use sources::UserGenreProfile;
use std::collections::BTreeSet;

/// How a candidate's per-genre affinities are folded into one boost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenreBoostStrategy {
    /// Strongest affinity among the candidate's genres
    #[default]
    Max,
    /// Average affinity over the candidate's genres
    Mean,
    /// Summed affinity (can exceed 1.0)
    Sum,
}

/// Boost for a candidate with `candidate_genres`, read from the user's profile
///
/// Genres the user has no affinity for count as 0.0. Returns 0.0 when the
/// profile or the genre set is empty.
pub fn compute_genre_boost(
    profile: &UserGenreProfile,
    candidate_genres: &BTreeSet<String>,
    strategy: GenreBoostStrategy,
) -> f32 {
    if profile.is_empty() || candidate_genres.is_empty() {
        return 0.0;
    }
    let affinities = candidate_genres.iter().map(|g| profile.get(g));
    match strategy {
        GenreBoostStrategy::Max => affinities.fold(0.0, f32::max),
        GenreBoostStrategy::Sum => affinities.sum(),
        GenreBoostStrategy::Mean => affinities.sum::<f32>() / candidate_genres.len() as f32,
    }
}
