//! # Data Loader Crate
//!
//! This crate holds the catalog snapshot the recommendation engine ranks over.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Film, Review, Catalog)
//! - **parser**: Decode JSON snapshot files, skipping malformed records
//! - **index**: Build the Catalog and its lookups
//! - **error**: Error types for catalog loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Catalog;
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_file(Path::new("data/catalog.json"))?;
//!
//! let film = catalog.get_film(1).unwrap();
//! let reviews = catalog.get_user_reviews(7);
//! println!("{} has {} reviews from user 7", film.title, reviews.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use types::{
    // Type aliases
    UserId,
    FilmId,
    ExternalId,
    // Core types
    Film,
    Review,
    RatingCriteria,
    Catalog,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::new();
        assert_eq!(catalog.counts(), (0, 0, 0));
    }

    #[test]
    fn test_insert_film() {
        let mut catalog = Catalog::new();

        let mut film = Film::new(1, "Inception");
        film.genres = vec!["Action".to_string(), "Science Fiction".to_string()];
        film.director = Some("Christopher Nolan".to_string());

        catalog.insert_film(film);

        let retrieved = catalog.get_film(1).unwrap();
        assert_eq!(retrieved.title, "Inception");
        assert_eq!(retrieved.genres.len(), 2);
    }

    #[test]
    fn test_insert_review() {
        let mut catalog = Catalog::new();

        catalog.insert_review(Review::new(1, 42, 9.0, NaiveDate::from_ymd_opt(2026, 1, 5)));

        let reviews = catalog.get_user_reviews(1);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, 9.0);
        assert_eq!(catalog.user_ids(), vec![1]);
    }

    #[test]
    fn test_empty_queries() {
        let catalog = Catalog::new();

        assert!(catalog.get_film(999).is_none());
        assert!(catalog.get_user_reviews(999).is_empty());
        assert!(catalog.film_by_external_id(999).is_none());
    }

    #[test]
    fn test_synopsis_joins_overview_and_tagline() {
        let mut film = Film::new(1, "Alien");
        film.overview = "A crew meets a creature.".to_string();
        film.tagline = "In space no one can hear you scream.".to_string();
        assert_eq!(
            film.synopsis(),
            "A crew meets a creature. In space no one can hear you scream."
        );
    }

    #[test]
    fn test_rating_criteria_overall() {
        let criteria = RatingCriteria {
            plot: 10.0,
            acting: 8.0,
            directing: 6.0,
            visuals: 4.0,
            soundtrack: 2.0,
        };
        assert_eq!(criteria.overall(), 6.0);
    }
}
