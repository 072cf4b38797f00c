//! Parser for catalog snapshot files.
//!
//! A snapshot is a JSON document exported by the catalog service:
//!
//! ```json
//! {
//!   "films":   [{ "id": 1, "title": "Heat", "genres": ["Crime"], "actors": [{"name": "Al Pacino"}],
//!                 "director": "Michael Mann", "overview": "...", "tagline": null, "tmdb_id": 949 }],
//!   "reviews": [{ "user_id": 7, "film_id": 1, "rating": 9, "watched_at": "2026-09-30" }]
//! }
//! ```
//!
//! Records are decoded in parallel, keeping file order. A record that cannot
//! be decoded, or that lacks its id, is skipped with a warning instead of
//! failing the whole load.

use crate::error::{CatalogError, Result};
use crate::types::*;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Top-level shape of a snapshot file
#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    films: Vec<Value>,
    #[serde(default)]
    reviews: Vec<Value>,
}

/// A person or genre reference: either a bare name or an object with a name
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NamedRef {
    Name(String),
    Object { name: String },
}

impl NamedRef {
    fn into_name(self) -> String {
        match self {
            NamedRef::Name(name) | NamedRef::Object { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawFilm {
    id: Option<FilmId>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    genres: Vec<NamedRef>,
    #[serde(default)]
    actors: Vec<NamedRef>,
    #[serde(default)]
    director: Option<NamedRef>,
    #[serde(default, alias = "tmdb_id")]
    external_id: Option<ExternalId>,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    user_id: Option<UserId>,
    film_id: Option<FilmId>,
    #[serde(default, alias = "user_rating")]
    rating: Option<f32>,
    #[serde(default)]
    criteria: Option<RatingCriteria>,
    #[serde(default)]
    watched_at: Option<NaiveDate>,
}

/// Read and parse a snapshot file into films and reviews
pub fn parse_snapshot_file(path: &Path) -> Result<(Vec<Film>, Vec<Review>)> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    parse_snapshot(&content)
}

/// Parse snapshot JSON text into films and reviews
pub fn parse_snapshot(content: &str) -> Result<(Vec<Film>, Vec<Review>)> {
    let raw: RawSnapshot = serde_json::from_str(content)?;

    let films: Vec<Film> = raw
        .films
        .into_par_iter()
        .enumerate()
        .filter_map(|(idx, value)| parse_film(idx, value))
        .collect();

    let reviews: Vec<Review> = raw
        .reviews
        .into_par_iter()
        .enumerate()
        .filter_map(|(idx, value)| parse_review(idx, value))
        .collect();

    Ok((films, reviews))
}

/// Decode one film record, or `None` if it is malformed
fn parse_film(idx: usize, value: Value) -> Option<Film> {
    let raw: RawFilm = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(record = idx, error = %e, "Skipping undecodable film record");
            return None;
        }
    };

    let Some(id) = raw.id else {
        warn!(record = idx, "Skipping film record without id");
        return None;
    };

    Some(Film {
        id,
        title: raw.title.unwrap_or_default(),
        overview: raw.overview.unwrap_or_default(),
        tagline: raw.tagline.unwrap_or_default(),
        genres: raw.genres.into_iter().map(NamedRef::into_name).collect(),
        actors: raw.actors.into_iter().map(NamedRef::into_name).collect(),
        director: raw
            .director
            .map(NamedRef::into_name)
            .filter(|name| !name.trim().is_empty()),
        external_id: raw.external_id,
    })
}

/// Decode one review record, or `None` if it is malformed
///
/// The overall rating is taken from `rating` when present, otherwise it is
/// the average of the per-criterion scores.
fn parse_review(idx: usize, value: Value) -> Option<Review> {
    let raw: RawReview = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(record = idx, error = %e, "Skipping undecodable review record");
            return None;
        }
    };

    let (Some(user_id), Some(film_id)) = (raw.user_id, raw.film_id) else {
        warn!(record = idx, "Skipping review record without user_id or film_id");
        return None;
    };

    let rating = match raw.rating.or_else(|| raw.criteria.map(|c| c.overall())) {
        Some(rating) if rating.is_finite() => rating,
        _ => {
            warn!(record = idx, user_id, film_id, "Skipping review record without a usable rating");
            return None;
        }
    };

    Some(Review {
        user_id,
        film_id,
        rating,
        watched_at: raw.watched_at,
    })
}
