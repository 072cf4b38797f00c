//! Helper functions to build a UserContext from a user's reviews
//!
//! The context gathers what a run needs about the user once, up front:
//! the watched set for filtering and the genre-affinity profile for scoring.

use crate::factors::{RatingBounds, normalize_rating, recency_boost};
use crate::feature_cache::{FeatureCache, is_genre};
use crate::types::{UserContext, UserGenreProfile};
use chrono::NaiveDate;
use data_loader::{Review, UserId};
use std::collections::HashMap;
use tracing::debug;

/// Build a UserContext for `user_id` from their reviews
///
/// Every reviewed film counts as watched, including films that are missing
/// from the pool. Films must already be prepared in `cache`.
pub fn build_user_context(
    user_id: UserId,
    reviews: &[Review],
    cache: &FeatureCache,
    bounds: RatingBounds,
    today: NaiveDate,
) -> UserContext {
    let mut context = UserContext::new(user_id);
    context.watched_films = reviews.iter().map(|r| r.film_id).collect();
    context.genre_profile = build_genre_profile(reviews, cache, bounds, today);

    debug!(
        user_id,
        watched = context.watched_films.len(),
        genres = context.genre_profile.len(),
        "Built user context"
    );
    context
}

/// Accumulate `normalized_rating * recency` per genre tag, then scale so the
/// strongest genre is 1.0
///
/// Reviews of films without features are ignored.
pub fn build_genre_profile(
    reviews: &[Review],
    cache: &FeatureCache,
    bounds: RatingBounds,
    today: NaiveDate,
) -> UserGenreProfile {
    let mut accumulated: HashMap<String, f32> = HashMap::new();

    for review in reviews {
        let features = cache.features(review.film_id);
        if features.is_empty() {
            continue;
        }
        let weight = normalize_rating(review.rating, bounds) * recency_boost(review.watched_at, today);
        for genre in features.iter().filter(|t| is_genre(t)) {
            *accumulated.entry(genre.clone()).or_insert(0.0) += weight;
        }
    }

    UserGenreProfile::from_accumulated(accumulated)
}
