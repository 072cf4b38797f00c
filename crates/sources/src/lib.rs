//! # Sources Crate
//!
//! This crate implements candidate retrieval for film recommendations.
//!
//! ## Components
//!
//! ### Feature Index (structural)
//! Films sharing weighted feature tags with a film the user rated:
//! - `FeatureCache` extracts `genre:` / `actor:` / `director:` tags once per film
//! - `FilmIndex` maps each tag to the films carrying it
//! - `CandidateSelector` keeps the top-K films by shared tag weight
//!
//! ### External Signals (provider)
//! Optional candidates from a metadata provider:
//! - Genre prior: films in the user's top 3 genres
//! - Similar / recommended films per source film
//! - Every provider call degrades to an empty set on failure
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CandidateSelector, FeatureCache, FilmIndex, WeightResolver, FeatureWeights};
//!
//! let mut cache = FeatureCache::new();
//! let mut index = FilmIndex::new();
//! let mut resolver = WeightResolver::new(FeatureWeights::default());
//!
//! for film in &pool {
//!     cache.prepare(film);
//!     resolver.prime(cache.features(film.id));
//!     index.add(film.id, cache.features(film.id));
//! }
//!
//! let selector = CandidateSelector::new(&index, &resolver);
//! let candidates = selector.select(cache.features(source_film_id));
//! ```
//!
//! Every structure here is built fresh for one run and dropped afterwards.

// Public modules
pub mod types;
pub mod factors;
pub mod feature_cache;
pub mod weights;
pub mod film_index;
pub mod selector;
pub mod user_context;
pub mod external;

// Re-export commonly used types
pub use types::{Candidate, CandidateSource, UserContext, UserGenreProfile};
pub use factors::RatingBounds;
pub use feature_cache::FeatureCache;
pub use weights::{FeatureWeights, WeightResolver};
pub use film_index::FilmIndex;
pub use selector::{CandidateSelector, top_k_by_weight};
pub use external::{
    ExternalSignalAdapter, ExternalSignals, LocalIds, ProviderGenreId, ProviderSets, SignalError,
    SignalResult, StaticSignalAdapter, genre_prior_candidates,
};

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Film;

    fn film(id: u32, genres: &[&str], actors: &[&str], director: &str) -> Film {
        let mut film = Film::new(id, format!("Film {}", id));
        film.genres = genres.iter().map(|s| s.to_string()).collect();
        film.actors = actors.iter().map(|s| s.to_string()).collect();
        film.director = Some(director.to_string());
        film
    }

    #[test]
    fn test_index_and_select_end_to_end() {
        let pool = vec![
            film(1, &["Crime"], &["Al Pacino"], "Michael Mann"),
            film(2, &["Crime"], &["Al Pacino"], "Brian De Palma"),
            film(3, &["Crime"], &["Tom Cruise"], "Michael Mann"),
            film(4, &["Comedy"], &["Jim Carrey"], "Tom Shadyac"),
        ];

        let mut cache = FeatureCache::new();
        let mut index = FilmIndex::new();
        let mut resolver = WeightResolver::new(FeatureWeights::default());
        for f in &pool {
            cache.prepare(f);
            resolver.prime(cache.features(f.id));
            index.add(f.id, cache.features(f.id));
        }

        let selector = CandidateSelector::new(&index, &resolver);
        let ids: Vec<u32> = selector
            .select(cache.features(1))
            .iter()
            .map(|c| c.film_id)
            .collect();

        // 1 shares everything with itself; 3 shares director + genre (4.5), 2 actor + genre (3.5)
        assert_eq!(ids, vec![1, 3, 2]);
    }
}
