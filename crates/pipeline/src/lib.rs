//! Per-candidate signals for film recommendations.
//!
//! This crate provides:
//! - Similarity primitives (weighted Jaccard, genre Jaccard)
//! - TextSimilarityIndex for TF-IDF synopsis similarity
//! - Genre-profile boost strategies
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - SignalScorer for fusing signals into explained contributions
//!
//! ## Architecture
//! The pipeline processes the candidates of one source film in stages:
//! 1. Filters remove excluded candidates (already watched, the source film itself)
//! 2. SignalScorer computes every sub-signal for the remaining candidates
//! 3. Positive contributions are returned with a Reason each
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterContext, FilterPipeline, SignalScorer, SourceReview};
//!
//! let pipeline = FilterPipeline::exclusions();
//! let filtered = pipeline.apply(candidates, &FilterContext::new(&user, film.id))?;
//!
//! let scorer = SignalScorer::new(&cache, &resolver, &text_index, &user.genre_profile);
//! let scored = scorer.score(&source, &filtered, &membership);
//! ```

pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod similarity;
pub mod text_similarity;
pub mod genre_boost;
pub mod scorer;

// Re-export main types
pub use traits::{Filter, FilterContext};
pub use filter_pipeline::FilterPipeline;
pub use text_similarity::TextSimilarityIndex;
pub use genre_boost::{GenreBoostStrategy, compute_genre_boost};
pub use similarity::{genre_similarity, weighted_jaccard};
pub use scorer::{ProviderMembership, Reason, SignalScorer, SignalWeights, SourceReview};
