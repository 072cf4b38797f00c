//! # Ranker
//!
//! One ranking run for one user over a snapshot of the catalog:
//! 1. Build the per-run structures: feature cache, weight resolver, inverted
//!    index, TF-IDF index, user context
//! 2. Ask the provider (if any) for genre-prior candidates
//! 3. For each review, in order:
//!    - gather candidates (structural top-K ∪ genre prior)
//!    - drop watched films and the source film
//!    - score the rest and accumulate positive contributions with a Reason
//! 4. Scale scores so the best is 1.0 and sort (score desc, film id asc)
//!
//! Nothing built here outlives the run, so concurrent runs share only the
//! read-only inputs.

use crate::config::{ConfigError, RankerConfig};
use chrono::{NaiveDate, Utc};
use data_loader::{Film, FilmId, Review, UserId};
use pipeline::{
    FilterContext, FilterPipeline, ProviderMembership, Reason, SignalScorer, SourceReview,
    TextSimilarityIndex,
};
use serde::Serialize;
use sources::factors::{normalize_rating, recency_boost, soften};
use sources::user_context::build_user_context;
use sources::{
    Candidate, CandidateSelector, CandidateSource, ExternalSignalAdapter, ExternalSignals,
    FeatureCache, FilmIndex, LocalIds, WeightResolver, genre_prior_candidates,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A ranked film with the explanation of its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub film_id: FilmId,

    /// Normalised score in [0, 1]; the best film of a run scores 1.0
    pub score: f32,

    /// One entry per review that contributed, in review order
    pub reasons: Vec<Reason>,
}

/// Ranks a user's unseen films by similarity to the films they reviewed
#[derive(Debug, Clone)]
pub struct Ranker {
    config: RankerConfig,
    today: Option<NaiveDate>,
}

impl Ranker {
    /// Build a ranker; the only failure is an invalid configuration
    pub fn new(config: RankerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            today: None,
        })
    }

    /// Fix the date recency is measured against (default: today, UTC)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Rank `pool` for `user_id` given their `reviews`
    ///
    /// Never fails: provider errors degrade to "no bonus", and a user with no
    /// reviews or no surviving candidates gets an empty list.
    #[instrument(skip(self, reviews, pool, adapter), fields(reviews = reviews.len(), pool = pool.len()))]
    pub fn build_recommendations(
        &self,
        user_id: UserId,
        reviews: &[Review],
        pool: &[Film],
        adapter: Option<&dyn ExternalSignalAdapter>,
    ) -> Vec<Recommendation> {
        let start_time = Instant::now();
        if reviews.is_empty() {
            debug!("No reviews, nothing to rank");
            return Vec::new();
        }
        let config = &self.config;
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());

        // Per-run structures
        let mut cache = FeatureCache::new();
        cache.prepare_all(pool);

        let mut resolver = WeightResolver::new(config.feature_weights.clone());
        let mut index = FilmIndex::new();
        for film in pool {
            let features = cache.features(film.id);
            resolver.prime(features);
            index.add(film.id, features);
        }

        let text_index = TextSimilarityIndex::build(pool, config.tfidf_max_features);
        let user = build_user_context(user_id, reviews, &cache, config.rating_bounds, today);
        let films_by_id: HashMap<FilmId, &Film> = pool.iter().map(|f| (f.id, f)).collect();
        debug!(
            tags = index.len(),
            vocabulary = text_index.vocabulary_size(),
            genres = user.genre_profile.len(),
            "Built per-run indexes"
        );

        let mut signals = ExternalSignals::new(adapter, LocalIds::from_pool(pool));
        let genre_prior: BTreeSet<FilmId> = match adapter {
            Some(adapter) => genre_prior_candidates(
                adapter,
                &user.genre_profile,
                signals.local_ids(),
                config.genre_prior_limit,
            ),
            None => BTreeSet::new(),
        };

        let selector = CandidateSelector::new(&index, &resolver).with_base_k(config.base_k);
        let exclusions = FilterPipeline::exclusions();
        let scorer = SignalScorer::new(&cache, &resolver, &text_index, &user.genre_profile)
            .with_weights(config.signal_weights)
            .with_strategy(config.genre_boost);

        let mut scores: BTreeMap<FilmId, f32> = BTreeMap::new();
        let mut reasons: HashMap<FilmId, Vec<Reason>> = HashMap::new();

        for review in reviews {
            let Some(&film) = films_by_id.get(&review.film_id) else {
                continue;
            };
            let features = cache.features(film.id);
            if features.is_empty() {
                continue;
            }

            let source = SourceReview {
                film,
                rating_factor: soften(normalize_rating(review.rating, config.rating_bounds), config.rating_floor),
                recency_factor: soften(recency_boost(review.watched_at, today), config.recency_floor),
            };

            let candidates = merge_candidates(selector.select(features), &genre_prior);
            let candidates = match exclusions.apply(candidates, &FilterContext::new(&user, film.id)) {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(film_id = film.id, error = %e, "Candidate filtering failed, skipping review");
                    continue;
                }
            };
            if candidates.is_empty() {
                continue;
            }

            let provider = signals.provider_sets(film);
            let membership = ProviderMembership {
                genre_prior: &genre_prior,
                similar: &provider.similar,
                recommended: &provider.recommended,
            };

            for (film_id, reason) in scorer.score(&source, &candidates, &membership) {
                *scores.entry(film_id).or_insert(0.0) += reason.contribution;
                reasons.entry(film_id).or_default().push(reason);
            }
        }

        let recommendations = normalize_and_rank(scores, reasons);
        info!(
            user_id,
            recommendations = recommendations.len(),
            genre_prior = genre_prior.len(),
            provider_failures = signals.failures(),
            "Ranked in {:.2?}",
            start_time.elapsed()
        );
        recommendations
    }
}

/// Structural candidates followed by genre-prior films not already present
fn merge_candidates(structural: Vec<Candidate>, genre_prior: &BTreeSet<FilmId>) -> Vec<Candidate> {
    let seen: HashSet<FilmId> = structural.iter().map(|c| c.film_id).collect();
    let mut merged = structural;
    merged.extend(
        genre_prior
            .iter()
            .filter(|id| !seen.contains(id))
            .map(|&id| Candidate::new(id, CandidateSource::GenrePrior, 0.0)),
    );
    merged
}

/// Divide by the best score and sort by score desc, then film id asc
fn normalize_and_rank(
    scores: BTreeMap<FilmId, f32>,
    mut reasons: HashMap<FilmId, Vec<Reason>>,
) -> Vec<Recommendation> {
    let max = scores.values().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }

    let mut ranked: Vec<Recommendation> = scores
        .into_iter()
        .map(|(film_id, score)| Recommendation {
            film_id,
            score: score / max,
            reasons: reasons.remove(&film_id).unwrap_or_default(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.film_id.cmp(&b.film_id))
    });
    ranked
}
