use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Catalog, UserId};
use engine::{FilmRecommendation, RankerConfig, RecommendationOrchestrator};
use metadata_client::TmdbAdapter;
use sources::FeatureCache;
use sources::feature_cache::feature_value;
use sources::user_context::build_genre_profile;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// ReelRecs - Film Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Content-based film recommendations from a user's reviews", long_about = None)]
struct Cli {
    /// Path to the catalog snapshot (JSON)
    #[arg(short, long, default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// Path to a ranker configuration (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get film recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Show the per-signal breakdown of each recommendation
        #[arg(long)]
        explain: bool,

        /// Print the recommendations as JSON
        #[arg(long)]
        json: bool,

        /// Consult TMDB (reads TMDB_* environment variables)
        #[arg(long)]
        online: bool,
    },

    /// Show a user's reviews and genre profile
    Profile {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Search for films by title
    Search {
        /// Film title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Rank random users concurrently and report latencies
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RankerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load ranker config from {}", path.display()))?,
        None => RankerConfig::default(),
    };

    println!("Loading catalog from {}...", cli.catalog.display());
    let start = Instant::now();
    let catalog = Arc::new(
        Catalog::load_from_file(&cli.catalog).context("Failed to load catalog snapshot")?,
    );
    let (films, users, reviews) = catalog.counts();
    println!(
        "{} Loaded {} films, {} users, {} reviews in {:?}",
        "✓".green(),
        films,
        users,
        reviews,
        start.elapsed()
    );

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            explain,
            json,
            online,
        } => handle_recommend(catalog, config, user_id, limit, explain, json, online).await?,
        Commands::Profile { user_id } => handle_profile(&catalog, &config, user_id)?,
        Commands::Search { title } => handle_search(&catalog, &title),
        Commands::Benchmark { requests } => handle_benchmark(catalog, config, requests).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    catalog: Arc<Catalog>,
    config: RankerConfig,
    user_id: UserId,
    limit: usize,
    explain: bool,
    json: bool,
    online: bool,
) -> Result<()> {
    if catalog.get_user_reviews(user_id).is_empty() {
        eprintln!("{} User {} has no reviews", "!".yellow(), user_id);
    }

    let mut orchestrator = RecommendationOrchestrator::new(catalog, config)?;
    if online {
        // The blocking HTTP client has to be built off the async workers
        let adapter = tokio::task::spawn_blocking(TmdbAdapter::from_env)
            .await
            .context("TMDB setup task panicked")?
            .context("Failed to configure the TMDB adapter")?;
        orchestrator = orchestrator.with_adapter(Arc::new(adapter));
    }

    let recommendations = orchestrator.get_recommendations(user_id, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        print_recommendations(&recommendations, explain);
    }
    Ok(())
}

/// Handle the 'profile' command
fn handle_profile(catalog: &Catalog, config: &RankerConfig, user_id: UserId) -> Result<()> {
    let reviews = catalog.get_user_reviews(user_id);
    if reviews.is_empty() {
        return Err(anyhow!("User {} has no reviews", user_id));
    }

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    let avg_rating = reviews.iter().map(|r| r.rating).sum::<f32>() / reviews.len() as f32;
    println!("{}Number of reviews: {}", "• ".cyan(), reviews.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), avg_rating);

    let mut top_rated: Vec<_> = reviews.iter().collect();
    top_rated.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.film_id.cmp(&b.film_id))
    });
    println!("Top rated films:");
    for review in top_rated.iter().take(5) {
        if let Some(film) = catalog.get_film(review.film_id) {
            let watched = review
                .watched_at
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("  - {} (rating: {}, watched: {})", film.title, review.rating, watched);
        }
    }

    let mut cache = FeatureCache::new();
    for review in reviews {
        if let Some(film) = catalog.get_film(review.film_id) {
            cache.prepare(film);
        }
    }
    let profile = build_genre_profile(reviews, &cache, config.rating_bounds, Utc::now().date_naive());

    println!("Genre profile:");
    for (genre, affinity) in profile.top_genres(10) {
        let bar = "█".repeat((affinity * 20.0).round() as usize);
        println!("  {:<20} {:.2} {}", feature_value(genre), affinity, bar.green());
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(catalog: &Catalog, title: &str) {
    let needle = title.to_lowercase();

    // Exact matches first, then substring matches, each by id
    let mut matches: Vec<(u8, &data_loader::Film)> = catalog
        .films()
        .filter_map(|film| {
            let haystack = film.title.to_lowercase();
            if haystack == needle {
                Some((0, film))
            } else if haystack.contains(&needle) {
                Some((1, film))
            } else {
                None
            }
        })
        .collect();
    matches.sort_by_key(|(rank, film)| (*rank, film.id));

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  (no films found)");
    }
    for (_, film) in matches.iter().take(20) {
        println!(
            "{}: {} [{}]{}",
            film.id.to_string().green(),
            film.title,
            film.genres.join(", "),
            film.director
                .as_deref()
                .map(|d| format!(" dir. {}", d))
                .unwrap_or_default()
        );
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(catalog: Arc<Catalog>, config: RankerConfig, requests: usize) -> Result<()> {
    let users = catalog.user_ids();
    if users.is_empty() {
        bail!("Catalog has no reviews to benchmark with");
    }
    if requests == 0 {
        bail!("--requests must be greater than zero");
    }

    let orchestrator = RecommendationOrchestrator::new(catalog, config)?;
    let user_ids: Vec<UserId> = (0..requests)
        .map(|_| users[rand::random_range(0..users.len())])
        .collect();

    let wall_clock = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for user_id in user_ids {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            orchestrator.get_recommendations(user_id, 20).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await.context("Benchmark task panicked")??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {}", requests);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f32 / total_time.as_secs_f32()
    );
    Ok(())
}

/// Print recommendations, optionally with their score breakdown
fn print_recommendations(recommendations: &[FilmRecommendation], explain: bool) {
    println!("{}", "Film Recommendations:".bold().blue());
    if recommendations.is_empty() {
        println!("  (nothing to recommend)");
    }

    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} [{}] - Score: {:.3}",
            (rank + 1).to_string().green(),
            rec.title,
            rec.genres.join(", "),
            rec.score
        );
        if !explain {
            continue;
        }
        for reason in &rec.reasons {
            let mut providers = Vec::new();
            if reason.in_genre_prior {
                providers.push("genre prior");
            }
            if reason.in_similar {
                providers.push("similar");
            }
            if reason.in_recommended {
                providers.push("recommended");
            }
            println!(
                "   {} {}: structural {:.2}, text {:.2}, genre boost {:.2}, genre sim {:.2}, api {:.2}{} x rating {:.2} x recency {:.2} = {:.3}",
                "↳".cyan(),
                reason.source_title,
                reason.structural,
                reason.text,
                reason.genre_boost,
                reason.genre_similarity,
                reason.api_bonus,
                if providers.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", providers.join(", "))
                },
                reason.rating_factor,
                reason.recency_factor,
                reason.contribution
            );
        }
    }
}
