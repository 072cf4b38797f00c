//! Core domain types for the film catalog.
//!
//! This module defines the read-only snapshot the ranking engine works on:
//! films with their descriptive attributes, user reviews, and the in-memory
//! `Catalog` that serves both by id.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with film IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Local identifier of a film in the catalog
pub type FilmId = u32;

/// Identifier of a film at the external metadata provider (e.g. a TMDB id)
pub type ExternalId = u32;

// =============================================================================
// Film
// =============================================================================

/// A film in the catalog.
///
/// Films are supplied by the catalog collaborator and never mutated by the
/// engine. Every descriptive field may be empty; an empty film simply
/// produces no features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub tagline: String,
    /// Genre names as stored in the catalog ("Action", "Science Fiction")
    #[serde(default)]
    pub genres: Vec<String>,
    /// Billed cast, in billing order
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    /// Id of the same film at the metadata provider, if known
    #[serde(default)]
    pub external_id: Option<ExternalId>,
}

impl Film {
    /// Create a film with only an id and a title.
    pub fn new(id: FilmId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Self::default()
        }
    }

    /// Synopsis text used for text similarity: overview and tagline joined.
    pub fn synopsis(&self) -> String {
        format!("{} {}", self.overview, self.tagline)
    }
}

// =============================================================================
// Review
// =============================================================================

/// A user's rating of a film they watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: UserId,
    pub film_id: FilmId,
    /// Overall rating on the catalog scale (1-10 by default)
    pub rating: f32,
    /// Day the user watched the film; drives the recency boost
    #[serde(default)]
    pub watched_at: Option<NaiveDate>,
}

impl Review {
    pub fn new(user_id: UserId, film_id: FilmId, rating: f32, watched_at: Option<NaiveDate>) -> Self {
        Self {
            user_id,
            film_id,
            rating,
            watched_at,
        }
    }
}

/// The five per-criterion scores a review form collects.
///
/// The overall rating of a review is their plain average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingCriteria {
    pub plot: f32,
    pub acting: f32,
    pub directing: f32,
    pub visuals: f32,
    pub soundtrack: f32,
}

impl RatingCriteria {
    pub fn overall(&self) -> f32 {
        (self.plot + self.acting + self.directing + self.visuals + self.soundtrack) / 5.0
    }
}

// =============================================================================
// Catalog - The In-Memory Snapshot
// =============================================================================

/// Read-only snapshot of films and reviews.
///
/// Films are kept in a `BTreeMap` so that the candidate pool is always
/// produced in ascending id order, which keeps every run reproducible.
#[derive(Debug, Default)]
pub struct Catalog {
    pub(crate) films: BTreeMap<FilmId, Film>,
    /// All reviews written by each user, in insertion order
    pub(crate) user_reviews: HashMap<UserId, Vec<Review>>,
    /// Provider id -> local id
    pub(crate) external_index: HashMap<ExternalId, FilmId>,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a film by ID
    pub fn get_film(&self, id: FilmId) -> Option<&Film> {
        self.films.get(&id)
    }

    /// Resolve a provider id to the local film id
    pub fn film_by_external_id(&self, external_id: ExternalId) -> Option<FilmId> {
        self.external_index.get(&external_id).copied()
    }

    /// Get all reviews written by a user
    ///
    /// Returns an empty slice if the user has no reviews
    pub fn get_user_reviews(&self, user_id: UserId) -> &[Review] {
        self.user_reviews
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate over all films in ascending id order
    pub fn films(&self) -> impl Iterator<Item = &Film> {
        self.films.values()
    }

    /// Candidate pool snapshot for one engine run (ascending id order)
    pub fn candidate_pool(&self) -> Vec<Film> {
        self.films.values().cloned().collect()
    }

    /// All users that wrote at least one review, ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_reviews.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Insert a film into the catalog.
    ///
    /// A film with an id that already exists replaces the previous record.
    pub fn insert_film(&mut self, film: Film) {
        if let Some(external_id) = film.external_id {
            self.external_index.insert(external_id, film.id);
        }
        self.films.insert(film.id, film);
    }

    /// Insert a review and index it by user
    pub fn insert_review(&mut self, review: Review) {
        self.user_reviews
            .entry(review.user_id)
            .or_default()
            .push(review);
    }

    /// Get counts for debugging/validation: (films, users, reviews)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_reviews = self.user_reviews.values().map(|v| v.len()).sum();
        (self.films.len(), self.user_reviews.len(), total_reviews)
    }
}
