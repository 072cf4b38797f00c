//! TMDB response bodies.
//!
//! Only the fields the adapter reads are decoded; everything else in the
//! payload is ignored.

use data_loader::ExternalId;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// `GET /genre/movie/list`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieSummary {
    pub id: ExternalId,
    #[serde(default)]
    pub title: Option<String>,
}

/// One page of a movie listing (discover, similar, recommendations)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_pages: u32,
}

impl MoviePage {
    pub fn ids(&self) -> Vec<ExternalId> {
        self.results.iter().map(|m| m.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_genre_list() {
        let body = r#"{"genres": [{"id": 28, "name": "боевик"}, {"id": 35, "name": "комедия"}]}"#;
        let list: GenreList = serde_json::from_str(body).unwrap();

        assert_eq!(list.genres.len(), 2);
        assert_eq!(list.genres[0], Genre { id: 28, name: "боевик".to_string() });
    }

    #[test]
    fn test_decode_movie_page_ignores_extra_fields() {
        let body = r#"{
            "page": 1,
            "results": [
                {"id": 280, "title": "Терминатор 2", "popularity": 55.1, "genre_ids": [28, 878]},
                {"id": 218, "adult": false}
            ],
            "total_pages": 12,
            "total_results": 231
        }"#;
        let page: MoviePage = serde_json::from_str(body).unwrap();

        assert_eq!(page.ids(), vec![280, 218]);
        assert_eq!(page.results[1].title, None);
        assert_eq!(page.total_pages, 12);
    }

    #[test]
    fn test_decode_empty_object() {
        let page: MoviePage = serde_json::from_str("{}").unwrap();
        assert!(page.ids().is_empty());
    }
}
