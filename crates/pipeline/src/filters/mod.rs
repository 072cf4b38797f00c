//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod already_watched;
pub mod source_film;

// Re-export for convenience
pub use already_watched::AlreadyWatchedFilter;
pub use source_film::SourceFilmFilter;
