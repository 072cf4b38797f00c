//! Feature extraction and per-run caching.
//!
//! A film is described by a list of feature tags of the form `"type:value"`:
//! `genre:drama`, `actor:tom hardy`, `director:christopher nolan`. Tags are
//! lower-cased, deduplicated per film, and keep their first-seen order.

use data_loader::{Film, FilmId};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};

pub const GENRE: &str = "genre";
pub const ACTOR: &str = "actor";
pub const DIRECTOR: &str = "director";

const GENRE_PREFIX: &str = "genre:";

/// Type part of a tag (text before the first `:`), or the whole tag if it has none
pub fn feature_type(tag: &str) -> &str {
    tag.split_once(':').map(|(ty, _)| ty).unwrap_or(tag)
}

/// True for `genre:*` tags
pub fn is_genre(tag: &str) -> bool {
    tag.starts_with(GENRE_PREFIX)
}

/// Value part of a tag (text after the first `:`)
pub fn feature_value(tag: &str) -> &str {
    tag.split_once(':').map(|(_, value)| value).unwrap_or("")
}

fn make_tag(ty: &str, value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        None
    } else {
        Some(format!("{}:{}", ty, value))
    }
}

/// Extract the ordered, deduplicated tags of a film.
///
/// Genres come first, then actors in billing order, then the director.
pub fn extract_features(film: &Film) -> Vec<String> {
    let genres = film.genres.iter().filter_map(|g| make_tag(GENRE, g));
    let actors = film.actors.iter().filter_map(|a| make_tag(ACTOR, a));
    let director = film.director.iter().filter_map(|d| make_tag(DIRECTOR, d));

    let mut seen = HashSet::new();
    genres
        .chain(actors)
        .chain(director)
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Caches extracted features so each film is processed once per run.
///
/// Owned by a single engine run; never shared between runs.
#[derive(Debug, Default)]
pub struct FeatureCache {
    features: HashMap<FilmId, Vec<String>>,
    genres: HashMap<FilmId, BTreeSet<String>>,
}

impl FeatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract and cache the features of a film. Idempotent: a film that is
    /// already cached is left untouched.
    pub fn prepare(&mut self, film: &Film) {
        if self.features.contains_key(&film.id) {
            return;
        }
        let features = extract_features(film);
        let genres = features.iter().filter(|t| is_genre(t)).cloned().collect();
        self.features.insert(film.id, features);
        self.genres.insert(film.id, genres);
    }

    /// Prepare a whole pool, extracting tags in parallel
    pub fn prepare_all(&mut self, pool: &[Film]) {
        let extracted: Vec<(FilmId, Vec<String>)> = pool
            .par_iter()
            .filter(|film| !self.features.contains_key(&film.id))
            .map(|film| (film.id, extract_features(film)))
            .collect();

        for (id, features) in extracted {
            if self.features.contains_key(&id) {
                continue;
            }
            let genres = features.iter().filter(|t| is_genre(t)).cloned().collect();
            self.features.insert(id, features);
            self.genres.insert(id, genres);
        }
    }

    /// Cached features of a film; empty if the film was never prepared
    pub fn features(&self, id: FilmId) -> &[String] {
        self.features.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Cached genre tags of a film; `None` if the film was never prepared
    pub fn genres(&self, id: FilmId) -> Option<&BTreeSet<String>> {
        self.genres.get(&id)
    }

    /// Iterate over every prepared film and its tags
    pub fn iter(&self) -> impl Iterator<Item = (FilmId, &[String])> {
        self.features.iter().map(|(id, f)| (*id, f.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heat() -> Film {
        let mut film = Film::new(1, "Heat");
        film.genres = vec!["Crime".into(), " Drama ".into(), "crime".into()];
        film.actors = vec!["Al Pacino".into(), "Robert De Niro".into()];
        film.director = Some("Michael Mann".into());
        film
    }

    #[test]
    fn test_extract_features_order_and_dedup() {
        let features = extract_features(&heat());
        assert_eq!(
            features,
            vec![
                "genre:crime",
                "genre:drama",
                "actor:al pacino",
                "actor:robert de niro",
                "director:michael mann",
            ]
        );
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let mut cache = FeatureCache::new();
        let film = heat();

        cache.prepare(&film);
        let first = cache.features(1).to_vec();
        cache.prepare(&film);

        assert_eq!(cache.features(1), first.as_slice());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_genres_are_genre_tags_only() {
        let mut cache = FeatureCache::new();
        cache.prepare(&heat());

        let genres = cache.genres(1).unwrap();
        assert_eq!(genres.len(), 2);
        assert!(genres.contains("genre:crime"));
        assert!(!genres.contains("actor:al pacino"));
    }

    #[test]
    fn test_film_without_attributes_has_no_features() {
        let mut cache = FeatureCache::new();
        let mut film = Film::new(5, "Untitled");
        film.director = Some("   ".into());
        cache.prepare(&film);

        assert!(cache.features(5).is_empty());
        assert!(cache.genres(5).unwrap().is_empty());
    }

    #[test]
    fn test_prepare_all_matches_prepare() {
        let mut other = heat();
        other.id = 2;
        other.director = None;
        let pool = vec![heat(), other];

        let mut bulk = FeatureCache::new();
        bulk.prepare_all(&pool);
        let mut single = FeatureCache::new();
        for film in &pool {
            single.prepare(film);
        }

        assert_eq!(bulk.len(), 2);
        assert_eq!(bulk.features(1), single.features(1));
        assert_eq!(bulk.features(2), single.features(2));
        assert_eq!(bulk.genres(2), single.genres(2));
    }

    #[test]
    fn test_unknown_film_is_empty() {
        let cache = FeatureCache::new();
        assert!(cache.features(42).is_empty());
        assert!(cache.genres(42).is_none());
    }

    #[test]
    fn test_tag_parts() {
        assert_eq!(feature_type("actor:tom hardy"), "actor");
        assert_eq!(feature_value("actor:tom hardy"), "tom hardy");
        assert_eq!(feature_type("keyword:a:b"), "keyword");
        assert_eq!(feature_value("keyword:a:b"), "a:b");
        assert_eq!(feature_type("plain"), "plain");
        assert!(is_genre("genre:drama"));
        assert!(!is_genre("director:genre"));
    }
}
