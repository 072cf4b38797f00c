//! Ranking configuration.
//!
//! Every knob of a ranking run lives in [`RankerConfig`]. It deserialises
//! from JSON with a default for every missing field, and is validated once
//! when the [`Ranker`](crate::Ranker) is built, before any computation.

use pipeline::{GenreBoostStrategy, SignalWeights};
use serde::{Deserialize, Serialize};
use sources::{FeatureWeights, RatingBounds};
use sources::external::DEFAULT_GENRE_PRIOR_LIMIT;
use sources::selector::DEFAULT_BASE_K;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid rating bounds: min {min} > max {max}")]
    InvalidRatingBounds { min: f32, max: f32 },

    #[error("Invalid weight {name}: {value} (must be finite and non-negative)")]
    InvalidWeight { name: String, value: f32 },

    #[error("Invalid softness floor {name}: {value} (must be within [0, 1])")]
    InvalidFloor { name: &'static str, value: f32 },

    #[error("{name} must be greater than zero")]
    ZeroLimit { name: &'static str },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration of a ranking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Weight per feature type
    pub feature_weights: FeatureWeights,

    /// Weights of the fused signals and the provider bonuses
    pub signal_weights: SignalWeights,

    pub rating_bounds: RatingBounds,

    /// Lowest value the rating factor can take
    pub rating_floor: f32,

    /// Lowest value the recency factor can take
    pub recency_floor: f32,

    /// TF-IDF vocabulary cap
    pub tfidf_max_features: usize,

    /// Lower bound of the structural top-K cut
    pub base_k: usize,

    /// Cap on genre-prior candidates
    pub genre_prior_limit: usize,

    pub genre_boost: GenreBoostStrategy,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            feature_weights: FeatureWeights::default(),
            signal_weights: SignalWeights::default(),
            rating_bounds: RatingBounds::default(),
            rating_floor: 0.5,
            recency_floor: 0.5,
            tfidf_max_features: pipeline::text_similarity::DEFAULT_MAX_FEATURES,
            base_k: DEFAULT_BASE_K,
            genre_prior_limit: DEFAULT_GENRE_PRIOR_LIMIT,
            genre_boost: GenreBoostStrategy::default(),
        }
    }
}

impl RankerConfig {
    /// Load a config from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn with_feature_weights(mut self, weights: FeatureWeights) -> Self {
        self.feature_weights = weights;
        self
    }

    pub fn with_signal_weights(mut self, weights: SignalWeights) -> Self {
        self.signal_weights = weights;
        self
    }

    pub fn with_rating_bounds(mut self, min: f32, max: f32) -> Self {
        self.rating_bounds = RatingBounds::new(min, max);
        self
    }

    pub fn with_floors(mut self, rating_floor: f32, recency_floor: f32) -> Self {
        self.rating_floor = rating_floor;
        self.recency_floor = recency_floor;
        self
    }

    pub fn with_tfidf_max_features(mut self, max_features: usize) -> Self {
        self.tfidf_max_features = max_features;
        self
    }

    pub fn with_base_k(mut self, base_k: usize) -> Self {
        self.base_k = base_k;
        self
    }

    pub fn with_genre_prior_limit(mut self, limit: usize) -> Self {
        self.genre_prior_limit = limit;
        self
    }

    pub fn with_genre_boost(mut self, strategy: GenreBoostStrategy) -> Self {
        self.genre_boost = strategy;
        self
    }

    /// Check every invariant the ranking run relies on
    pub fn validate(&self) -> Result<()> {
        let RatingBounds { min, max } = self.rating_bounds;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConfigError::InvalidRatingBounds { min, max });
        }

        for (name, value) in self.feature_weights.iter() {
            check_weight(&format!("feature_weights.{}", name), value)?;
        }

        let w = &self.signal_weights;
        for (name, value) in [
            ("structural", w.structural),
            ("text", w.text),
            ("genre_profile", w.genre_profile),
            ("genre_similarity", w.genre_similarity),
            ("api_genre_prior", w.api_genre_prior),
            ("api_similar", w.api_similar),
            ("api_recommended", w.api_recommended),
        ] {
            check_weight(&format!("signal_weights.{}", name), value)?;
        }

        check_floor("rating_floor", self.rating_floor)?;
        check_floor("recency_floor", self.recency_floor)?;

        if self.tfidf_max_features == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "tfidf_max_features",
            });
        }
        if self.genre_prior_limit == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "genre_prior_limit",
            });
        }
        Ok(())
    }
}

fn check_weight(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight {
            name: name.to_string(),
            value,
        })
    }
}

fn check_floor(name: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFloor { name, value })
    }
}
