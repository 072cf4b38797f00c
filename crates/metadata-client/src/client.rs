//! Blocking TMDB client implementing [`ExternalSignalAdapter`].
//!
//! Calls are made from the ranker's blocking thread, so the client uses
//! `reqwest::blocking`. Transient failures (timeouts, refused connections,
//! 429 and 5xx gateway statuses) are retried with doubling backoff.
//! Successful bodies are cached per request for the endpoint's TTL.

use crate::cache::{CacheKey, ResponseCache};
use crate::config::TmdbConfig;
use crate::error::{MetadataClientError, Result};
use crate::payload::{GenreList, MoviePage};
use data_loader::ExternalId;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use sources::{ExternalSignalAdapter, ProviderGenreId, SignalResult};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Delay before the first retry; doubles on each further one
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// TMDB adapter
pub struct TmdbAdapter {
    client: Client,
    config: TmdbConfig,
    api_key: String,
    backoff: Duration,
    cache: ResponseCache,
}

impl TmdbAdapter {
    /// Build an adapter; fails if no API key is configured
    ///
    /// Must not be called from inside an async context.
    pub fn new(config: TmdbConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(MetadataClientError::MissingApiKey)?;
        let client = Client::builder().timeout(config.timeout()).build()?;

        info!(base_url = %config.base_url, language = %config.language, "TMDB adapter ready");
        Ok(Self {
            client,
            config,
            api_key,
            backoff: DEFAULT_BACKOFF,
            cache: ResponseCache::new(),
        })
    }

    /// Build an adapter from `TMDB_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(TmdbConfig::from_env()?)
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn config(&self) -> &TmdbConfig {
        &self.config
    }

    /// Number of responses currently cached
    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    /// Decode the response for `key`, from the cache when still fresh
    fn get<T: DeserializeOwned>(&self, key: CacheKey) -> Result<T> {
        if let Some(body) = self.cache.get(&key) {
            debug!(key = %key, "TMDB cache hit");
            return Ok(serde_json::from_str(&body)?);
        }

        let body = self.fetch(&key.path(), &key.params())?;
        let value = serde_json::from_str(&body)?;
        let ttl = key.ttl();
        self.cache.insert(key, body, ttl);
        Ok(value)
    }

    /// GET `path` with the common parameters, retrying transient failures
    fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let attempts = self.config.retries.max(1);
        let mut attempt = 1;

        loop {
            let err = match self.send_once(&url, path, params) {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };
            if attempt >= attempts || !is_retryable(&err) {
                return Err(err);
            }

            let delay = backoff_delay(self.backoff, attempt);
            warn!(path, attempt, error = %err, "TMDB request failed, retrying in {:?}", delay);
            thread::sleep(delay);
            attempt += 1;
        }
    }

    fn send_once(&self, url: &str, path: &str, params: &[(&str, String)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str()), ("language", self.config.language.as_str())])
            .query(params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataClientError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let body = response.text()?;
        debug!(path, bytes = body.len(), "TMDB response");
        Ok(body)
    }

    fn first_page(&self, key: CacheKey) -> Result<Vec<ExternalId>> {
        let page: MoviePage = self.get(key)?;
        Ok(page.ids())
    }
}

fn is_retryable(err: &MetadataClientError) -> bool {
    match err {
        MetadataClientError::Http(e) => e.is_timeout() || e.is_connect(),
        MetadataClientError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
        _ => false,
    }
}

/// `base`, `2 * base`, `4 * base`, ... for attempts 1, 2, 3, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

impl ExternalSignalAdapter for TmdbAdapter {
    fn name(&self) -> &str {
        "tmdb"
    }

    fn genre_taxonomy(&self) -> SignalResult<HashMap<String, ProviderGenreId>> {
        let list: GenreList = self.get(CacheKey::GenreList)?;
        Ok(list.genres.into_iter().map(|g| (g.name, g.id)).collect())
    }

    fn candidates_by_genre(&self, genre: ProviderGenreId) -> SignalResult<Vec<ExternalId>> {
        Ok(self.first_page(CacheKey::Discover { genre, page: 1 })?)
    }

    fn similar(&self, film: ExternalId) -> SignalResult<Vec<ExternalId>> {
        Ok(self.first_page(CacheKey::Similar { film, page: 1 })?)
    }

    fn recommended(&self, film: ExternalId) -> SignalResult<Vec<ExternalId>> {
        Ok(self.first_page(CacheKey::Recommended { film, page: 1 })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(4));
    }

    #[test]
    fn test_retryable_statuses() {
        let status = |status| MetadataClientError::Status {
            status,
            path: "/movie/1/similar".to_string(),
        };
        for code in [429, 500, 502, 503, 504] {
            assert!(is_retryable(&status(code)), "{} should be retried", code);
        }
        for code in [400, 401, 404, 501] {
            assert!(!is_retryable(&status(code)), "{} should fail fast", code);
        }
        assert!(!is_retryable(&MetadataClientError::MissingApiKey));
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            TmdbAdapter::new(TmdbConfig::default()),
            Err(MetadataClientError::MissingApiKey)
        ));
        assert!(matches!(
            TmdbAdapter::new(TmdbConfig::default().with_api_key("  ")),
            Err(MetadataClientError::MissingApiKey)
        ));
    }
}
