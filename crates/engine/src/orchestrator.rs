//! # Recommendation Orchestrator
//!
//! This module runs the ranker for catalog users:
//! 1. Fetch the user's reviews from the shared catalog
//! 2. Run the synchronous ranker on the blocking pool (`spawn_blocking`)
//! 3. Attach film metadata to the ranked ids
//! 4. Write the list to the result store under `recs:user:{id}`
//!
//! Runs for different users are independent: each builds its own indexes
//! and shares only the read-only catalog, pool and provider. A failed or
//! panicked run is logged and reported for that user alone.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::config::RankerConfig;
use crate::ranker::{Ranker, Recommendation};
use crate::result_store::{DEFAULT_TTL, ResultStore, user_key};
use data_loader::{Catalog, Film, FilmId, UserId};
use pipeline::Reason;
use sources::ExternalSignalAdapter;

/// Recommendation enriched with film metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmRecommendation {
    pub film_id: FilmId,
    pub title: String,
    pub genres: Vec<String>,
    pub score: f32,
    pub reasons: Vec<Reason>,
}

/// Outcome of recomputing every user of the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Coordinates ranking runs over a shared catalog
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<Catalog>,
    pool: Arc<Vec<Film>>,
    ranker: Arc<Ranker>,
    adapter: Option<Arc<dyn ExternalSignalAdapter>>,
    store: Option<Arc<dyn ResultStore>>,
    ttl: Duration,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator; fails on an invalid configuration
    pub fn new(catalog: Arc<Catalog>, config: RankerConfig) -> Result<Self> {
        let ranker = Ranker::new(config).context("Invalid ranker configuration")?;
        Ok(Self::with_ranker(catalog, ranker))
    }

    /// Create an orchestrator around an already built ranker
    pub fn with_ranker(catalog: Arc<Catalog>, ranker: Ranker) -> Self {
        let pool = Arc::new(catalog.candidate_pool());
        Self {
            catalog,
            pool,
            ranker: Arc::new(ranker),
            adapter: None,
            store: None,
            ttl: DEFAULT_TTL,
        }
    }

    /// Consult a metadata provider during runs
    pub fn with_adapter(mut self, adapter: Arc<dyn ExternalSignalAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Write finished lists to `store`
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Expiry of stored lists (default: 24 hours)
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Main entry point: rank, store, and return the top `limit` films
    pub async fn get_recommendations(&self, user_id: UserId, limit: usize) -> Result<Vec<FilmRecommendation>> {
        let mut recommendations = self.recompute_user(user_id).await?;
        recommendations.truncate(limit);
        Ok(recommendations)
    }

    /// Rank a user and write the full list to the store
    #[instrument(skip(self))]
    pub async fn recompute_user(&self, user_id: UserId) -> Result<Vec<FilmRecommendation>> {
        let start_time = Instant::now();

        let ranked = self.rank_user(user_id).await?;
        let recommendations = self.enrich(ranked);
        self.store_results(user_id, &recommendations);

        info!(
            "Recomputed {} recommendations for user {} in {:.2?}",
            recommendations.len(),
            user_id,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Recompute every catalog user concurrently
    ///
    /// A failing user is logged and counted; the other runs carry on.
    pub async fn recompute_all(&self) -> RecomputeSummary {
        let user_ids = self.catalog.user_ids();
        info!("Recomputing recommendations for {} users", user_ids.len());

        let mut tasks = JoinSet::new();
        for user_id in user_ids {
            let orchestrator = self.clone();
            tasks.spawn(async move { (user_id, orchestrator.recompute_user(user_id).await) });
        }

        let mut summary = RecomputeSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => summary.succeeded += 1,
                Ok((user_id, Err(e))) => {
                    error!(user_id, error = %format!("{:#}", e), "Recommendation run failed");
                    summary.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "Recommendation task panicked");
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Recompute finished: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
        summary
    }

    /// Run the ranker for one user on the blocking pool
    async fn rank_user(&self, user_id: UserId) -> Result<Vec<Recommendation>> {
        let catalog = self.catalog.clone();
        let pool = self.pool.clone();
        let ranker = self.ranker.clone();
        let adapter = self.adapter.clone();

        tokio::task::spawn_blocking(move || {
            let reviews = catalog.get_user_reviews(user_id);
            ranker.build_recommendations(user_id, reviews, &pool, adapter.as_deref())
        })
        .await
        .with_context(|| format!("Ranking task for user {} panicked", user_id))
    }

    /// Attach title and genres; ids missing from the catalog are dropped
    fn enrich(&self, ranked: Vec<Recommendation>) -> Vec<FilmRecommendation> {
        ranked
            .into_iter()
            .filter_map(|rec| {
                let film = self.catalog.get_film(rec.film_id)?;
                Some(FilmRecommendation {
                    film_id: rec.film_id,
                    title: film.title.clone(),
                    genres: film.genres.clone(),
                    score: rec.score,
                    reasons: rec.reasons,
                })
            })
            .collect()
    }

    /// Best-effort write; a store failure never fails the run
    fn store_results(&self, user_id: UserId, recommendations: &[FilmRecommendation]) {
        let Some(store) = &self.store else {
            return;
        };
        let key = user_key(user_id);
        let written = serde_json::to_string(recommendations)
            .map_err(Into::into)
            .and_then(|json| store.put(&key, json, self.ttl));
        if let Err(e) = written {
            warn!(user_id, key = %key, error = %e, "Failed to store recommendations");
        }
    }
}
