//! External metadata signals.
//!
//! The ranker can consult a metadata provider for three extra candidate
//! sets: films in the user's favourite genres, films "similar to" and films
//! "recommended for" each source film. The provider is optional and
//! fallible. Every call is isolated here: a failure is logged and turns into
//! an empty set, so a provider outage never aborts a run.
//!
//! Providers speak in their own film ids ([`ExternalId`]). Answers are
//! translated to local ids through the pool's `external_id` mapping; ids the
//! pool does not know are dropped.

use crate::feature_cache::feature_value;
use crate::types::UserGenreProfile;
use data_loader::{ExternalId, Film, FilmId};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Genre id at the metadata provider
pub type ProviderGenreId = u32;

/// Number of top profile genres used for the genre prior
pub const PRIOR_GENRES: usize = 3;

/// Default cap on genre-prior candidates
pub const DEFAULT_GENRE_PRIOR_LIMIT: usize = 300;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Metadata provider unavailable: {0}")]
    Unavailable(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not decode provider response: {0}")]
    Decode(String),
}

pub type SignalResult<T> = std::result::Result<T, SignalError>;

/// Operations the ranker consumes from a metadata provider
///
/// Implementations are shared read-only between concurrent runs.
pub trait ExternalSignalAdapter: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// Genre name → provider genre id
    fn genre_taxonomy(&self) -> SignalResult<HashMap<String, ProviderGenreId>>;

    /// Provider films in a genre
    fn candidates_by_genre(&self, genre: ProviderGenreId) -> SignalResult<Vec<ExternalId>>;

    /// Provider films similar to `film`
    fn similar(&self, film: ExternalId) -> SignalResult<Vec<ExternalId>>;

    /// Provider films recommended for viewers of `film`
    fn recommended(&self, film: ExternalId) -> SignalResult<Vec<ExternalId>>;
}

/// Provider id → local film id, for films of the pool
#[derive(Debug, Clone, Default)]
pub struct LocalIds {
    by_external: HashMap<ExternalId, FilmId>,
}

impl LocalIds {
    pub fn from_pool(pool: &[Film]) -> Self {
        let by_external = pool
            .iter()
            .filter_map(|film| film.external_id.map(|ext| (ext, film.id)))
            .collect();
        Self { by_external }
    }

    pub fn resolve(&self, external: ExternalId) -> Option<FilmId> {
        self.by_external.get(&external).copied()
    }

    fn resolve_all(&self, externals: &[ExternalId]) -> HashSet<FilmId> {
        externals.iter().filter_map(|&ext| self.resolve(ext)).collect()
    }
}

/// Local films the provider lists under the user's top genres
///
/// Genres are taken strongest first, matched against the taxonomy by
/// lower-cased name, and collection stops once `limit` films are found.
pub fn genre_prior_candidates(
    adapter: &dyn ExternalSignalAdapter,
    profile: &UserGenreProfile,
    local_ids: &LocalIds,
    limit: usize,
) -> BTreeSet<FilmId> {
    let mut prior = BTreeSet::new();
    if profile.is_empty() || limit == 0 {
        return prior;
    }

    let taxonomy: HashMap<String, ProviderGenreId> = match adapter.genre_taxonomy() {
        Ok(taxonomy) => taxonomy
            .into_iter()
            .map(|(name, id)| (name.trim().to_lowercase(), id))
            .collect(),
        Err(e) => {
            warn!(provider = adapter.name(), error = %e, "Genre taxonomy unavailable, skipping genre prior");
            return prior;
        }
    };

    'genres: for (genre_tag, _) in profile.top_genres(PRIOR_GENRES) {
        let name = feature_value(genre_tag).trim().to_lowercase();
        let Some(&genre_id) = taxonomy.get(&name) else {
            debug!(genre = %name, "Genre not in provider taxonomy");
            continue;
        };

        let films = match adapter.candidates_by_genre(genre_id) {
            Ok(films) => films,
            Err(e) => {
                warn!(provider = adapter.name(), genre = %name, error = %e, "Genre candidates unavailable");
                continue;
            }
        };

        for film_id in films.into_iter().filter_map(|ext| local_ids.resolve(ext)) {
            prior.insert(film_id);
            if prior.len() >= limit {
                break 'genres;
            }
        }
    }

    debug!(count = prior.len(), "Collected genre-prior candidates");
    prior
}

/// Provider candidate sets for one source film
#[derive(Debug, Clone, Default)]
pub struct ProviderSets {
    pub similar: HashSet<FilmId>,
    pub recommended: HashSet<FilmId>,
}

/// Per-run memo over the provider's per-film calls
///
/// Each external id is queried at most once per run, failed calls included.
pub struct ExternalSignals<'a> {
    adapter: Option<&'a dyn ExternalSignalAdapter>,
    local_ids: LocalIds,
    similar: HashMap<ExternalId, HashSet<FilmId>>,
    recommended: HashMap<ExternalId, HashSet<FilmId>>,
    failures: usize,
}

impl<'a> ExternalSignals<'a> {
    pub fn new(adapter: Option<&'a dyn ExternalSignalAdapter>, local_ids: LocalIds) -> Self {
        Self {
            adapter,
            local_ids,
            similar: HashMap::new(),
            recommended: HashMap::new(),
            failures: 0,
        }
    }

    pub fn adapter(&self) -> Option<&'a dyn ExternalSignalAdapter> {
        self.adapter
    }

    pub fn local_ids(&self) -> &LocalIds {
        &self.local_ids
    }

    /// Similar and recommended local films for a source film
    ///
    /// Empty without an adapter or when the film has no provider id.
    pub fn provider_sets(&mut self, film: &Film) -> ProviderSets {
        let (Some(adapter), Some(ext)) = (self.adapter, film.external_id) else {
            return ProviderSets::default();
        };

        if !self.similar.contains_key(&ext) {
            let found = match adapter.similar(ext) {
                Ok(ids) => self.local_ids.resolve_all(&ids),
                Err(e) => {
                    warn!(provider = adapter.name(), film_id = film.id, error = %e, "Similar films unavailable");
                    self.failures += 1;
                    HashSet::new()
                }
            };
            self.similar.insert(ext, found);
        }

        if !self.recommended.contains_key(&ext) {
            let found = match adapter.recommended(ext) {
                Ok(ids) => self.local_ids.resolve_all(&ids),
                Err(e) => {
                    warn!(provider = adapter.name(), film_id = film.id, error = %e, "Recommended films unavailable");
                    self.failures += 1;
                    HashSet::new()
                }
            };
            self.recommended.insert(ext, found);
        }

        ProviderSets {
            similar: self.similar.get(&ext).cloned().unwrap_or_default(),
            recommended: self.recommended.get(&ext).cloned().unwrap_or_default(),
        }
    }

    /// Number of per-film calls that failed so far
    pub fn failures(&self) -> usize {
        self.failures
    }
}

/// In-memory provider for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSignalAdapter {
    taxonomy: HashMap<String, ProviderGenreId>,
    by_genre: HashMap<ProviderGenreId, Vec<ExternalId>>,
    similar: HashMap<ExternalId, Vec<ExternalId>>,
    recommended: HashMap<ExternalId, Vec<ExternalId>>,
}

impl StaticSignalAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a genre and the provider films listed under it
    pub fn with_genre(mut self, name: impl Into<String>, id: ProviderGenreId, films: Vec<ExternalId>) -> Self {
        self.taxonomy.insert(name.into(), id);
        self.by_genre.insert(id, films);
        self
    }

    pub fn with_similar(mut self, film: ExternalId, similar: Vec<ExternalId>) -> Self {
        self.similar.insert(film, similar);
        self
    }

    pub fn with_recommended(mut self, film: ExternalId, recommended: Vec<ExternalId>) -> Self {
        self.recommended.insert(film, recommended);
        self
    }
}

impl ExternalSignalAdapter for StaticSignalAdapter {
    fn name(&self) -> &str {
        "static"
    }

    fn genre_taxonomy(&self) -> SignalResult<HashMap<String, ProviderGenreId>> {
        Ok(self.taxonomy.clone())
    }

    fn candidates_by_genre(&self, genre: ProviderGenreId) -> SignalResult<Vec<ExternalId>> {
        Ok(self.by_genre.get(&genre).cloned().unwrap_or_default())
    }

    fn similar(&self, film: ExternalId) -> SignalResult<Vec<ExternalId>> {
        Ok(self.similar.get(&film).cloned().unwrap_or_default())
    }

    fn recommended(&self, film: ExternalId) -> SignalResult<Vec<ExternalId>> {
        Ok(self.recommended.get(&film).cloned().unwrap_or_default())
    }
}
