//! Per-review scaling factors: rating normalisation, recency decay and softening.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive bounds of the rating scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingBounds {
    pub min: f32,
    pub max: f32,
}

impl RatingBounds {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

impl Default for RatingBounds {
    fn default() -> Self {
        Self { min: 1.0, max: 10.0 }
    }
}

/// Clamp a rating into `bounds` and rescale it linearly to [0, 1].
///
/// Degenerate bounds (`min == max`) map every rating to 0.0.
pub fn normalize_rating(rating: f32, bounds: RatingBounds) -> f32 {
    if bounds.max == bounds.min {
        return 0.0;
    }
    let clamped = rating.max(bounds.min).min(bounds.max);
    (clamped - bounds.min) / (bounds.max - bounds.min)
}

/// Logarithmically decaying weight for how long ago a film was watched.
///
/// `1 / (1 + ln(1 + days))`; 1.0 when there is no date or the date is not in
/// the past.
pub fn recency_boost(watched_at: Option<NaiveDate>, today: NaiveDate) -> f32 {
    let Some(watched_at) = watched_at else {
        return 1.0;
    };
    let days = (today - watched_at).num_days();
    if days <= 0 {
        return 1.0;
    }
    1.0 / (1.0 + (days as f32).ln_1p())
}

/// Lift a [0, 1] factor so it never drops below `floor`
pub fn soften(x: f32, floor: f32) -> f32 {
    floor + (1.0 - floor) * x
}
