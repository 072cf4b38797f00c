//! Core types shared by the candidate sources and the scoring pipeline.

use data_loader::{FilmId, UserId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CandidateSource {
    /// Shares weighted feature tags with the source film
    FeatureIndex,
    /// Returned by the metadata provider for one of the user's top genres
    GenrePrior,
}

/// A film considered for recommendation against one source film
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub film_id: FilmId,
    pub source: CandidateSource,

    /// Cumulative tag weight shared with the source film (0 for genre-prior candidates)
    pub selection_weight: f32,
}

impl Candidate {
    pub fn new(film_id: FilmId, source: CandidateSource, selection_weight: f32) -> Self {
        Self {
            film_id,
            source,
            selection_weight,
        }
    }
}

/// Genre tag → affinity in [0, 1]; the strongest genre is exactly 1.0
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserGenreProfile {
    affinities: HashMap<String, f32>,
}

impl UserGenreProfile {
    /// Normalise raw accumulated weights by their maximum.
    ///
    /// An empty map, or one whose maximum is not positive, is returned as is.
    pub fn from_accumulated(raw: HashMap<String, f32>) -> Self {
        let max = raw.values().copied().fold(f32::MIN, f32::max);
        if raw.is_empty() || max <= 0.0 {
            return Self { affinities: raw };
        }
        let affinities = raw.into_iter().map(|(g, v)| (g, v / max)).collect();
        Self { affinities }
    }

    /// Affinity of a genre tag, 0.0 if the user has none
    pub fn get(&self, genre_tag: &str) -> f32 {
        self.affinities.get(genre_tag).copied().unwrap_or(0.0)
    }

    /// The `n` strongest genres, by affinity descending then tag ascending
    pub fn top_genres(&self, n: usize) -> Vec<(&str, f32)> {
        let mut genres: Vec<(&str, f32)> = self
            .affinities
            .iter()
            .map(|(g, v)| (g.as_str(), *v))
            .collect();
        genres.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        genres.truncate(n);
        genres
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.affinities.iter().map(|(g, v)| (g.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.affinities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affinities.is_empty()
    }
}

/// Everything about a user that one ranking run needs
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_id: UserId,

    /// Films the user has reviewed
    pub watched_films: HashSet<FilmId>,

    pub genre_profile: UserGenreProfile,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    pub fn has_watched(&self, film_id: FilmId) -> bool {
        self.watched_films.contains(&film_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(pairs: &[(&str, f32)]) -> UserGenreProfile {
        UserGenreProfile::from_accumulated(
            pairs.iter().map(|(g, v)| (g.to_string(), *v)).collect(),
        )
    }

    #[test]
    fn test_profile_normalised_to_max() {
        let p = profile(&[("genre:drama", 4.0), ("genre:crime", 2.0)]);
        assert_eq!(p.get("genre:drama"), 1.0);
        assert_eq!(p.get("genre:crime"), 0.5);
        assert_eq!(p.get("genre:western"), 0.0);
    }

    #[test]
    fn test_empty_profile() {
        let p = UserGenreProfile::from_accumulated(HashMap::new());
        assert!(p.is_empty());
        assert!(p.top_genres(3).is_empty());
    }

    #[test]
    fn test_top_genres_tie_break() {
        let p = profile(&[
            ("genre:thriller", 1.0),
            ("genre:drama", 2.0),
            ("genre:crime", 1.0),
            ("genre:action", 0.5),
        ]);
        let top: Vec<&str> = p.top_genres(3).into_iter().map(|(g, _)| g).collect();
        assert_eq!(top, vec!["genre:drama", "genre:crime", "genre:thriller"]);
    }

    #[test]
    fn test_candidate_creation() {
        let candidate = Candidate::new(1, CandidateSource::FeatureIndex, 4.5);
        assert_eq!(candidate.film_id, 1);
        assert_eq!(candidate.source, CandidateSource::FeatureIndex);
        assert_eq!(candidate.selection_weight, 4.5);
    }

    #[test]
    fn test_user_context_watched() {
        let mut context = UserContext::new(3);
        context.watched_films.insert(10);
        assert!(context.has_watched(10));
        assert!(!context.has_watched(11));
    }
}
