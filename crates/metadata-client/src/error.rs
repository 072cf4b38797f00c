use sources::SignalError;
use thiserror::Error;

/// Errors that can occur when talking to TMDB
#[derive(Error, Debug)]
pub enum MetadataClientError {
    #[error("TMDB_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TMDB returned status {status} for {path}")]
    Status { status: u16, path: String },

    #[error("Failed to decode TMDB response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid TMDB configuration: {0}")]
    Config(#[from] envy::Error),
}

pub type Result<T> = std::result::Result<T, MetadataClientError>;

impl From<MetadataClientError> for SignalError {
    fn from(err: MetadataClientError) -> Self {
        match err {
            MetadataClientError::Http(e) => SignalError::Transport(e.to_string()),
            MetadataClientError::Decode(e) => SignalError::Decode(e.to_string()),
            other => SignalError::Unavailable(other.to_string()),
        }
    }
}
