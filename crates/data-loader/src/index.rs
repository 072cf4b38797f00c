//! Catalog building logic.
//!
//! Turns parsed records into a `Catalog`: primary film index, provider-id
//! index, and per-user review lists.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{info, warn};

impl Catalog {
    /// Load a catalog snapshot from a JSON file
    ///
    /// This is the main entry point for loading data.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading catalog snapshot from {:?}", path);

        let (films, reviews) = parser::parse_snapshot_file(path)?;
        let catalog = Self::from_records(films, reviews);

        let (films, users, reviews) = catalog.counts();
        info!(
            "Loaded {} films, {} users, {} reviews",
            films, users, reviews
        );
        Ok(catalog)
    }

    /// Build a catalog from already decoded records
    ///
    /// Duplicate film ids keep the last record. Reviews pointing at films
    /// missing from the catalog are kept: they still mark the film as
    /// watched, they just contribute no features.
    pub fn from_records(films: Vec<Film>, reviews: Vec<Review>) -> Self {
        let mut catalog = Catalog::new();

        for film in films {
            if catalog.films.contains_key(&film.id) {
                warn!(film_id = film.id, "Duplicate film id, keeping the later record");
            }
            catalog.insert_film(film);
        }

        let mut dangling = 0usize;
        for review in reviews {
            if !catalog.films.contains_key(&review.film_id) {
                dangling += 1;
            }
            catalog.insert_review(review);
        }
        if dangling > 0 {
            warn!(dangling, "Reviews reference films missing from the catalog");
        }

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_records_indexes_external_ids() {
        let mut film = Film::new(1, "Heat");
        film.external_id = Some(949);

        let catalog = Catalog::from_records(
            vec![film, Film::new(2, "Collateral")],
            vec![Review::new(10, 1, 9.0, None)],
        );

        assert_eq!(catalog.film_by_external_id(949), Some(1));
        assert_eq!(catalog.film_by_external_id(1), None);
        assert_eq!(catalog.get_user_reviews(10).len(), 1);
        assert_eq!(catalog.counts(), (2, 1, 1));
    }

    #[test]
    fn test_candidate_pool_is_sorted_by_id() {
        let catalog = Catalog::from_records(
            vec![Film::new(3, "C"), Film::new(1, "A"), Film::new(2, "B")],
            vec![],
        );
        let ids: Vec<FilmId> = catalog.candidate_pool().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("reel-recs-catalog-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"films": [{{"id": 1, "title": "Heat"}}], "reviews": [{{"user_id": 1, "film_id": 1, "rating": 8}}]}}"#
        )
        .unwrap();

        let catalog = Catalog::load_from_file(&path).unwrap();
        assert_eq!(catalog.counts(), (1, 1, 1));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load_from_file(Path::new("/definitely/not/here.json"));
        assert!(result.is_err());
    }
}
