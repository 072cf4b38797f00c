//! Engine crate for the ReelRecs recommendation engine.
//!
//! This crate ties candidate retrieval and scoring into one ranking run
//! ([`Ranker`]) and coordinates runs across users ([`RecommendationOrchestrator`]),
//! writing finished lists to a [`ResultStore`].

pub mod config;
pub mod orchestrator;
pub mod ranker;
pub mod result_store;

pub use config::{ConfigError, RankerConfig};
pub use orchestrator::{FilmRecommendation, RecommendationOrchestrator, RecomputeSummary};
pub use ranker::{Ranker, Recommendation};
pub use result_store::{DEFAULT_TTL, InMemoryResultStore, ResultStore, StoreError, user_key};
