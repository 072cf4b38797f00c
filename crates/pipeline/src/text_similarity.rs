//! TF-IDF text similarity over film synopses.
//!
//! ## Algorithm
//! 1. Each film's synopsis (`overview + " " + tagline`) is lower-cased and
//!    split into word tokens of at least two characters
//! 2. The vocabulary keeps the `max_features` most frequent terms of the
//!    corpus (ties go to the alphabetically smaller term)
//! 3. Each film becomes a sparse vector of `count * idf` weights with the
//!    smoothed `idf = ln((1 + n) / (1 + df)) + 1`, scaled to unit length
//! 4. Similarity is the cosine of two vectors, i.e. their dot product
//!
//! Vectors are stored sorted by term index so the dot product is a
//! merge-join: the same products are summed in the same order whichever
//! film comes first, which makes the similarity exactly symmetric.

use data_loader::{Film, FilmId};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Default vocabulary cap
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Split text into lower-cased word tokens of two or more characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// Sparse unit vector: (term index, weight), sorted by term index
type SparseVector = Vec<(u32, f32)>;

/// TF-IDF vectors of one candidate pool, built once per run
#[derive(Debug, Default)]
pub struct TextSimilarityIndex {
    vectors: HashMap<FilmId, SparseVector>,
    vocabulary_size: usize,
}

impl TextSimilarityIndex {
    /// Vectorise the synopses of `pool`
    pub fn build(pool: &[Film], max_features: usize) -> Self {
        let documents: Vec<(FilmId, Vec<String>)> = pool
            .par_iter()
            .map(|film| (film.id, tokenize(&film.synopsis())))
            .collect();

        let vocabulary = select_vocabulary(&documents, max_features);
        if vocabulary.is_empty() {
            debug!(documents = documents.len(), "Text corpus has no usable terms");
            return Self::default();
        }

        // Document frequency per kept term
        let mut df = vec![0u32; vocabulary.len()];
        for (_, tokens) in &documents {
            let mut seen: Vec<u32> = tokens.iter().filter_map(|t| vocabulary.get(t).copied()).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                df[term as usize] += 1;
            }
        }

        let n = documents.len() as f32;
        let idf: Vec<f32> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0)
            .collect();

        let vectors: HashMap<FilmId, SparseVector> = documents
            .par_iter()
            .map(|(id, tokens)| (*id, vectorize(tokens, &vocabulary, &idf)))
            .collect();

        debug!(
            documents = vectors.len(),
            vocabulary = vocabulary.len(),
            "Built text similarity index"
        );

        Self {
            vectors,
            vocabulary_size: vocabulary.len(),
        }
    }

    /// Cosine similarity of two films' synopses, in [0, 1]
    ///
    /// 0.0 for unknown films and for films without usable text.
    pub fn similarity(&self, a: FilmId, b: FilmId) -> f32 {
        let (Some(va), Some(vb)) = (self.vectors.get(&a), self.vectors.get(&b)) else {
            return 0.0;
        };
        sparse_dot(va, vb).clamp(0.0, 1.0)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Term → index for the `max_features` most frequent terms
fn select_vocabulary(documents: &[(FilmId, Vec<String>)], max_features: usize) -> HashMap<String, u32> {
    let mut frequency: HashMap<&str, u32> = HashMap::new();
    for (_, tokens) in documents {
        for token in tokens {
            *frequency.entry(token.as_str()).or_insert(0) += 1;
        }
    }

    let mut terms: Vec<(&str, u32)> = frequency.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    terms.truncate(max_features);

    // Index kept terms alphabetically
    let mut kept: Vec<&str> = terms.into_iter().map(|(t, _)| t).collect();
    kept.sort_unstable();
    kept.into_iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), i as u32))
        .collect()
}

fn vectorize(tokens: &[String], vocabulary: &HashMap<String, u32>, idf: &[f32]) -> SparseVector {
    let mut counts: HashMap<u32, u32> = HashMap::new();
    for token in tokens {
        if let Some(&term) = vocabulary.get(token) {
            *counts.entry(term).or_insert(0) += 1;
        }
    }

    let mut vector: SparseVector = counts
        .into_iter()
        .map(|(term, count)| (term, count as f32 * idf[term as usize]))
        .collect();
    vector.sort_unstable_by_key(|(term, _)| *term);

    let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut vector {
            *w /= norm;
        }
    } else {
        vector.clear();
    }
    vector
}

fn sparse_dot(a: &[(u32, f32)], b: &[(u32, f32)]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film(id: FilmId, overview: &str, tagline: &str) -> Film {
        let mut film = Film::new(id, format!("Film {}", id));
        film.overview = overview.to_string();
        film.tagline = tagline.to_string();
        film
    }

    fn corpus() -> Vec<Film> {
        vec![
            film(1, "A detective hunts a thief across Los Angeles.", "A Los Angeles crime saga"),
            film(2, "A thief plans one last heist in Los Angeles.", ""),
            film(3, "Two friends open a bakery and fall in love.", "Sweet"),
            film(4, "", ""),
        ]
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("The THIEF's 2nd heist: a plan!"),
            vec!["the", "thief", "2nd", "heist", "plan"]
        );
        assert!(tokenize("a b c").is_empty());
        assert_eq!(tokenize("Вор и детектив"), vec!["вор", "детектив"]);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let index = TextSimilarityIndex::build(&corpus(), DEFAULT_MAX_FEATURES);
        for a in 1..=4 {
            for b in 1..=4 {
                assert_eq!(index.similarity(a, b), index.similarity(b, a));
            }
        }
    }

    #[test]
    fn test_related_texts_score_higher() {
        let index = TextSimilarityIndex::build(&corpus(), DEFAULT_MAX_FEATURES);
        let related = index.similarity(1, 2);
        let unrelated = index.similarity(1, 3);

        assert!(related > unrelated);
        assert!(related > 0.0 && related <= 1.0);
        assert!((index.similarity(1, 1) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_and_unknown_ids() {
        let index = TextSimilarityIndex::build(&corpus(), DEFAULT_MAX_FEATURES);
        assert_eq!(index.similarity(1, 4), 0.0);
        assert_eq!(index.similarity(1, 99), 0.0);
    }

    #[test]
    fn test_degenerate_corpus() {
        let index = TextSimilarityIndex::build(&[film(1, "", ""), film(2, "a", "")], DEFAULT_MAX_FEATURES);
        assert!(index.is_empty());
        assert_eq!(index.similarity(1, 2), 0.0);
    }

    #[test]
    fn test_vocabulary_cap() {
        let index = TextSimilarityIndex::build(&corpus(), 3);
        assert_eq!(index.vocabulary_size(), 3);
        // "angeles" and "los" (3 each) survive, "in" wins the tie at 2 over "thief"
        assert!(index.similarity(1, 2) > 0.0);
        assert_eq!(index.similarity(1, 3), 0.0);
    }
}
