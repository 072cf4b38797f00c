//! Set similarity over feature tags.

use sources::WeightResolver;
use std::collections::BTreeSet;

/// Jaccard similarity where each tag counts with its resolved weight.
///
/// `Σ w(a ∩ b) / Σ w(a ∪ b)`; 0.0 when either side is empty or the union
/// weighs nothing.
pub fn weighted_jaccard(a: &[String], b: &[String], resolver: &WeightResolver) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();

    let intersection: f32 = a.intersection(&b).map(|tag| resolver.weight(tag)).sum();
    let union: f32 = a.union(&b).map(|tag| resolver.weight(tag)).sum();

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Plain Jaccard similarity of two genre sets; 0.0 if either is empty
pub fn genre_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f32;
    let union = a.union(b).count() as f32;
    intersection / union
}
