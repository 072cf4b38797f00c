//! Metadata provider client for the ReelRecs recommendation engine.
//!
//! This crate talks to TMDB over HTTP and exposes it as an
//! `ExternalSignalAdapter`:
//! - Genre taxonomy (`/genre/movie/list`)
//! - Films per genre (`/discover/movie`)
//! - Similar and recommended films per film
//!
//! Responses are cached in process for a per-endpoint TTL. Configuration
//! comes from `TMDB_*` environment variables (and `.env`).

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;

pub use cache::{CacheKey, ResponseCache};
pub use client::TmdbAdapter;
pub use config::TmdbConfig;
pub use error::{MetadataClientError, Result};
