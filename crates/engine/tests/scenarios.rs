//! End-to-end ranking scenarios.
//!
//! These tests run the full ranker (candidate selection, exclusions, scoring,
//! normalisation) over small hand-built catalogs.

use chrono::NaiveDate;
use data_loader::{Catalog, ExternalId, Film, FilmId, Review};
use engine::{InMemoryResultStore, Ranker, RankerConfig, RecommendationOrchestrator, ResultStore};
use sources::external::{ProviderGenreId, SignalError, SignalResult};
use sources::{ExternalSignalAdapter, StaticSignalAdapter};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn film(id: FilmId, genre: &str, overview: &str, external_id: ExternalId) -> Film {
    let mut film = Film::new(id, format!("Film {}", id));
    film.genres = vec![genre.to_string()];
    film.overview = overview.to_string();
    film.external_id = Some(external_id);
    film
}

/// A (Action), B (Action, similar synopsis), C (Comedy, unrelated synopsis)
fn scenario_pool() -> Vec<Film> {
    vec![
        film(1, "Action", "A retired agent fights a gang of mercenaries in the city", 100),
        film(2, "Action", "An agent fights mercenaries across the city at night", 101),
        film(3, "Comedy", "Two friends open a bakery by the sea", 102),
    ]
}

fn ranker() -> Ranker {
    Ranker::new(RankerConfig::default()).unwrap().with_today(today())
}

fn ids(recs: &[engine::Recommendation]) -> Vec<FilmId> {
    recs.iter().map(|r| r.film_id).collect()
}

/// Mock provider that fails every call and counts them
#[derive(Default)]
struct FailingAdapter {
    calls: AtomicUsize,
}

impl FailingAdapter {
    fn fail<T>(&self) -> SignalResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SignalError::Transport("connection reset".to_string()))
    }
}

impl ExternalSignalAdapter for FailingAdapter {
    fn name(&self) -> &str {
        "failing"
    }
    fn genre_taxonomy(&self) -> SignalResult<HashMap<String, ProviderGenreId>> {
        self.fail()
    }
    fn candidates_by_genre(&self, _genre: ProviderGenreId) -> SignalResult<Vec<ExternalId>> {
        self.fail()
    }
    fn similar(&self, _film: ExternalId) -> SignalResult<Vec<ExternalId>> {
        self.fail()
    }
    fn recommended(&self, _film: ExternalId) -> SignalResult<Vec<ExternalId>> {
        self.fail()
    }
}

#[test]
fn test_single_review_ranks_similar_film_first() {
    let pool = scenario_pool();
    let reviews = vec![Review::new(1, 1, 9.0, Some(today()))];

    let recs = ranker().build_recommendations(1, &reviews, &pool, None);

    assert!(!ids(&recs).contains(&1), "reviewed film is never recommended");
    assert_eq!(recs[0].film_id, 2);
    assert_eq!(recs[0].score, 1.0);
    assert!(!ids(&recs).contains(&3), "C shares no feature with A");

    let reason = &recs[0].reasons[0];
    assert_eq!(reason.source_film_id, 1);
    assert!(reason.structural > 0.0);
    assert!(reason.text > 0.0);
    assert_eq!(reason.recency_factor, 1.0);
}

#[test]
fn test_shared_actor_ranks_below_shared_genre_and_actor() {
    let mut pool = scenario_pool();
    for film in &mut pool {
        film.actors = vec!["Dana Kim".to_string()];
    }
    let reviews = vec![Review::new(1, 1, 9.0, Some(today()))];

    let recs = ranker().build_recommendations(1, &reviews, &pool, None);

    let position = |id: FilmId| recs.iter().position(|r| r.film_id == id);
    let (b, c) = (position(2).unwrap(), position(3).unwrap());
    assert!(b < c);
    assert!(recs[c].score < recs[b].score);
    assert!(recs[c].reasons[0].structural > 0.0);
}

#[test]
fn test_empty_history_returns_nothing() {
    let recs = ranker().build_recommendations(1, &[], &scenario_pool(), None);
    assert!(recs.is_empty());
}

#[test]
fn test_failing_provider_falls_back_to_local_signals() {
    let pool = scenario_pool();
    let reviews = vec![Review::new(1, 1, 9.0, Some(today()))];
    let adapter = FailingAdapter::default();

    let local_only = ranker().build_recommendations(1, &reviews, &pool, None);
    let with_failures = ranker().build_recommendations(1, &reviews, &pool, Some(&adapter));

    assert_eq!(with_failures, local_only);
    assert!(adapter.calls.load(Ordering::SeqCst) > 0);
}

#[test]
fn test_no_provider_means_no_bonus() {
    let pool = scenario_pool();
    let reviews = vec![Review::new(1, 1, 9.0, Some(today())), Review::new(1, 3, 4.0, None)];

    let recs = ranker().build_recommendations(1, &reviews, &pool, None);

    for rec in &recs {
        for reason in &rec.reasons {
            assert_eq!(reason.api_bonus, 0.0);
            assert!(!reason.in_genre_prior && !reason.in_similar && !reason.in_recommended);
        }
    }
}

#[test]
fn test_provider_adds_genre_prior_and_bonuses() {
    let pool = scenario_pool();
    let reviews = vec![Review::new(1, 1, 9.0, Some(today()))];
    let adapter = StaticSignalAdapter::new()
        .with_genre("Action", 28, vec![102, 999])
        .with_similar(100, vec![101]);

    let recs = ranker().build_recommendations(1, &reviews, &pool, Some(&adapter));

    assert_eq!(ids(&recs), vec![2, 3]);
    assert_eq!(recs[0].score, 1.0);

    let b = &recs[0].reasons[0];
    assert!(b.in_similar && !b.in_recommended);
    assert!((b.api_bonus - 0.15).abs() < 1e-6);

    // Only reachable through the genre prior
    let c = &recs[1].reasons[0];
    assert!(c.in_genre_prior);
    assert_eq!(c.structural, 0.0);
    assert!((c.api_bonus - 0.1).abs() < 1e-6);
}

#[test]
fn test_scores_are_normalised_and_ordered() {
    let pool = vec![
        film(1, "Crime", "A detective hunts a crew of thieves in Los Angeles", 1),
        film(2, "Crime", "A crew of thieves plans one last heist", 2),
        film(3, "Crime", "A detective works one last case", 3),
        film(4, "Drama", "A family gathers for a wedding", 4),
        film(5, "Drama", "A widow rebuilds her life on a farm", 5),
    ];
    let reviews = vec![
        Review::new(7, 1, 10.0, Some(today())),
        Review::new(7, 4, 3.0, NaiveDate::from_ymd_opt(2020, 1, 1)),
    ];

    let recs = ranker().build_recommendations(7, &reviews, &pool, None);

    assert!(!recs.is_empty());
    assert_eq!(recs[0].score, 1.0);
    for pair in recs.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].film_id < pair[1].film_id)
        );
    }
    for rec in &recs {
        assert!(rec.score > 0.0 && rec.score <= 1.0);
        assert!(![1, 4].contains(&rec.film_id));
    }
}

#[test]
fn test_runs_are_deterministic() {
    let pool = scenario_pool();
    let reviews = vec![Review::new(1, 1, 9.0, Some(today())), Review::new(1, 3, 6.0, None)];

    let first = ranker().build_recommendations(1, &reviews, &pool, None);
    let second = ranker().build_recommendations(1, &reviews, &pool, None);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_orchestrator_stores_full_list() {
    let catalog = Arc::new(Catalog::from_records(
        scenario_pool(),
        vec![Review::new(1, 1, 9.0, Some(today()))],
    ));
    let store = Arc::new(InMemoryResultStore::new());
    let adapter = Arc::new(StaticSignalAdapter::new().with_genre("Action", 28, vec![102]));

    let orchestrator = RecommendationOrchestrator::with_ranker(catalog, ranker())
        .with_adapter(adapter)
        .with_store(store.clone());

    let top = orchestrator.get_recommendations(1, 1).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].title, "Film 2");

    let stored: serde_json::Value = serde_json::from_str(&store.get("recs:user:1").unwrap()).unwrap();
    let stored = stored.as_array().unwrap();
    assert_eq!(stored.len(), 2, "the store keeps the full list, not the truncated one");
    assert_eq!(stored[0]["film_id"], 2);
    assert_eq!(stored[1]["reasons"][0]["in_genre_prior"], true);
}
