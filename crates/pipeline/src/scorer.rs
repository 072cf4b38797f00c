//! Per-candidate signal fusion.
//!
//! For one reviewed (source) film, every surviving candidate gets:
//! - `structural`: weighted Jaccard over feature tags
//! - `text`: TF-IDF cosine of the synopses
//! - `genre_boost`: the user's affinity for the candidate's genres
//! - `genre_similarity`: plain Jaccard over genre tags
//! - `api_bonus`: fixed bonuses for each provider set the candidate is in
//!
//! The weighted sum is scaled by the review's rating and recency factors
//! into the candidate's contribution. Candidates are scored in parallel.

use crate::genre_boost::{GenreBoostStrategy, compute_genre_boost};
use crate::similarity::{genre_similarity, weighted_jaccard};
use crate::text_similarity::TextSimilarityIndex;
use data_loader::{Film, FilmId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sources::{Candidate, FeatureCache, UserGenreProfile, WeightResolver};
use std::collections::{BTreeSet, HashSet};

static NO_GENRES: BTreeSet<String> = BTreeSet::new();

/// Weights of the fused signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub structural: f32,
    pub text: f32,
    pub genre_profile: f32,
    pub genre_similarity: f32,
    pub api_genre_prior: f32,
    pub api_similar: f32,
    pub api_recommended: f32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            structural: 0.7,
            text: 0.3,
            genre_profile: 0.25,
            genre_similarity: 0.2,
            api_genre_prior: 0.1,
            api_similar: 0.15,
            api_recommended: 0.2,
        }
    }
}

/// Why a candidate received part of its score: one record per source review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reason {
    pub source_film_id: FilmId,
    pub source_title: String,
    pub structural: f32,
    pub text: f32,
    pub genre_boost: f32,
    pub genre_similarity: f32,
    pub api_bonus: f32,
    pub in_genre_prior: bool,
    pub in_similar: bool,
    pub in_recommended: bool,
    pub rating_factor: f32,
    pub recency_factor: f32,
    pub contribution: f32,
}

/// A reviewed film together with its softened review factors
#[derive(Debug, Clone, Copy)]
pub struct SourceReview<'a> {
    pub film: &'a Film,
    pub rating_factor: f32,
    pub recency_factor: f32,
}

/// Provider sets consulted for the API bonus
#[derive(Debug, Clone, Copy)]
pub struct ProviderMembership<'a> {
    pub genre_prior: &'a BTreeSet<FilmId>,
    pub similar: &'a HashSet<FilmId>,
    pub recommended: &'a HashSet<FilmId>,
}

/// Scores candidates against one source film
pub struct SignalScorer<'a> {
    cache: &'a FeatureCache,
    resolver: &'a WeightResolver,
    text: &'a TextSimilarityIndex,
    profile: &'a UserGenreProfile,
    weights: SignalWeights,
    strategy: GenreBoostStrategy,
}

impl<'a> SignalScorer<'a> {
    pub fn new(
        cache: &'a FeatureCache,
        resolver: &'a WeightResolver,
        text: &'a TextSimilarityIndex,
        profile: &'a UserGenreProfile,
    ) -> Self {
        Self {
            cache,
            resolver,
            text,
            profile,
            weights: SignalWeights::default(),
            strategy: GenreBoostStrategy::default(),
        }
    }

    pub fn with_weights(mut self, weights: SignalWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_strategy(mut self, strategy: GenreBoostStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Score every candidate; returns `(film_id, reason)` for positive
    /// contributions only, ordered by film id
    pub fn score(
        &self,
        source: &SourceReview<'_>,
        candidates: &[Candidate],
        membership: &ProviderMembership<'_>,
    ) -> Vec<(FilmId, Reason)> {
        let mut scored: Vec<(FilmId, Reason)> = candidates
            .par_iter()
            .filter_map(|candidate| {
                self.score_one(source, candidate.film_id, membership)
                    .map(|reason| (candidate.film_id, reason))
            })
            .collect();
        scored.sort_by_key(|(film_id, _)| *film_id);
        scored
    }

    fn score_one(
        &self,
        source: &SourceReview<'_>,
        candidate: FilmId,
        membership: &ProviderMembership<'_>,
    ) -> Option<Reason> {
        let source_id = source.film.id;
        let source_genres = self.cache.genres(source_id).unwrap_or(&NO_GENRES);
        let candidate_genres = self.cache.genres(candidate).unwrap_or(&NO_GENRES);

        let structural = weighted_jaccard(
            self.cache.features(source_id),
            self.cache.features(candidate),
            self.resolver,
        );
        let text = self.text.similarity(source_id, candidate);
        let genre_boost = compute_genre_boost(self.profile, candidate_genres, self.strategy);
        let g_sim = genre_similarity(source_genres, candidate_genres);

        let in_genre_prior = membership.genre_prior.contains(&candidate);
        let in_similar = membership.similar.contains(&candidate);
        let in_recommended = membership.recommended.contains(&candidate);

        let w = &self.weights;
        let mut api_bonus = 0.0;
        if in_genre_prior {
            api_bonus += w.api_genre_prior;
        }
        if in_similar {
            api_bonus += w.api_similar;
        }
        if in_recommended {
            api_bonus += w.api_recommended;
        }

        let base = w.structural * structural
            + w.text * text
            + w.genre_profile * genre_boost
            + w.genre_similarity * g_sim
            + api_bonus;
        let contribution = base * source.rating_factor * source.recency_factor;

        if contribution.is_nan() || contribution <= 0.0 {
            return None;
        }

        Some(Reason {
            source_film_id: source_id,
            source_title: source.film.title.clone(),
            structural,
            text,
            genre_boost,
            genre_similarity: g_sim,
            api_bonus,
            in_genre_prior,
            in_similar,
            in_recommended,
            rating_factor: source.rating_factor,
            recency_factor: source.recency_factor,
            contribution,
        })
    }
}
