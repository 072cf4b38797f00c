//! In-process cache of TMDB response bodies.
//!
//! Provider data changes slowly, so bodies are kept per request for a
//! per-endpoint TTL and shared by every ranking run that uses the adapter.

use data_loader::ExternalId;
use sources::ProviderGenreId;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const HOUR: u64 = 60 * 60;

/// Genre list and per-genre listings: 7 days
pub const GENRES_TTL: Duration = Duration::from_secs(7 * 24 * HOUR);

/// Similar films: 12 hours
pub const SIMILAR_TTL: Duration = Duration::from_secs(12 * HOUR);

/// Recommended films: 12 hours
pub const RECOMMENDED_TTL: Duration = Duration::from_secs(12 * HOUR);

/// One cacheable TMDB request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    GenreList,
    Discover { genre: ProviderGenreId, page: u32 },
    Similar { film: ExternalId, page: u32 },
    Recommended { film: ExternalId, page: u32 },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::GenreList => write!(f, "tmdb:genres"),
            CacheKey::Discover { genre, page } => write!(f, "tmdb:discover:{}:{}", genre, page),
            CacheKey::Similar { film, page } => write!(f, "tmdb:similar:{}:{}", film, page),
            CacheKey::Recommended { film, page } => write!(f, "tmdb:recommended:{}:{}", film, page),
        }
    }
}

impl CacheKey {
    /// Request path, relative to the base URL
    pub fn path(&self) -> String {
        match self {
            CacheKey::GenreList => "/genre/movie/list".to_string(),
            CacheKey::Discover { .. } => "/discover/movie".to_string(),
            CacheKey::Similar { film, .. } => format!("/movie/{}/similar", film),
            CacheKey::Recommended { film, .. } => format!("/movie/{}/recommendations", film),
        }
    }

    /// Query parameters besides `api_key` and `language`
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            CacheKey::GenreList => Vec::new(),
            CacheKey::Discover { genre, page } => {
                vec![("with_genres", genre.to_string()), ("page", page.to_string())]
            }
            CacheKey::Similar { page, .. } | CacheKey::Recommended { page, .. } => {
                vec![("page", page.to_string())]
            }
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            CacheKey::GenreList | CacheKey::Discover { .. } => GENRES_TTL,
            CacheKey::Similar { .. } => SIMILAR_TTL,
            CacheKey::Recommended { .. } => RECOMMENDED_TTL,
        }
    }
}

/// Response bodies by request, each with its own expiry
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, (Instant, String)>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live body for `key`; an expired entry is evicted
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((expires, body)) if *expires > Instant::now() => Some(body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, body: String, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, (Instant::now() + ttl, body));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_map_to_requests() {
        let key = CacheKey::Discover { genre: 28, page: 1 };
        assert_eq!(key.path(), "/discover/movie");
        assert_eq!(key.params(), vec![("with_genres", "28".to_string()), ("page", "1".to_string())]);
        assert_eq!(key.to_string(), "tmdb:discover:28:1");

        let key = CacheKey::Recommended { film: 280, page: 1 };
        assert_eq!(key.path(), "/movie/280/recommendations");
        assert_eq!(key.ttl(), RECOMMENDED_TTL);
        assert_eq!(CacheKey::GenreList.ttl(), GENRES_TTL);
    }

    #[test]
    fn test_hit_and_expiry() {
        let cache = ResponseCache::new();
        let key = CacheKey::Similar { film: 280, page: 1 };

        cache.insert(key.clone(), "{}".to_string(), SIMILAR_TTL);
        assert_eq!(cache.get(&key).as_deref(), Some("{}"));
        assert_eq!(cache.get(&CacheKey::Similar { film: 281, page: 1 }), None);

        cache.insert(key.clone(), "{}".to_string(), Duration::ZERO);
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());
    }
}
