use serde::Deserialize;
use std::time::Duration;

/// TMDB connection settings, read from `TMDB_*` environment variables
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TmdbConfig {
    /// `TMDB_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// `TMDB_BASE_URL`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `TMDB_LANGUAGE`
    #[serde(default = "default_language")]
    pub language: String,

    /// `TMDB_TIMEOUT_SECS`
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `TMDB_RETRIES`: attempts per request, the first one included
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_language() -> String {
    "ru-RU".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_retries() -> u32 {
    3
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

impl TmdbConfig {
    /// Load configuration from the environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed("TMDB_").from_env::<TmdbConfig>()
    }

    /// Load configuration from explicit `(name, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed("TMDB_").from_iter(vars)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
