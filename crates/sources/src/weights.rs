//! Feature weight table and the per-run resolver over it.

use crate::feature_cache::feature_type;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Weight of a tag whose type is not in the table
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// Configured weight per feature type
///
/// Deserialises from a plain `{type: weight}` map whose entries override the
/// default table; types it does not mention keep their default weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f32>", into = "BTreeMap<String, f32>")]
pub struct FeatureWeights {
    by_type: BTreeMap<String, f32>,
}

impl FeatureWeights {
    /// Empty table: every type resolves to [`DEFAULT_WEIGHT`]
    pub fn empty() -> Self {
        Self {
            by_type: BTreeMap::new(),
        }
    }

    /// Set the weight of one feature type (builder style)
    pub fn with_weight(mut self, feature_type: impl Into<String>, weight: f32) -> Self {
        self.by_type.insert(feature_type.into(), weight);
        self
    }

    pub fn get(&self, feature_type: &str) -> f32 {
        self.by_type
            .get(feature_type)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.by_type.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self::empty()
            .with_weight("director", 3.0)
            .with_weight("actor", 2.0)
            .with_weight("genre", 1.5)
            .with_weight("keyword", 1.0)
    }
}

impl From<BTreeMap<String, f32>> for FeatureWeights {
    fn from(overrides: BTreeMap<String, f32>) -> Self {
        overrides
            .into_iter()
            .fold(Self::default(), |table, (ty, weight)| table.with_weight(ty, weight))
    }
}

impl From<FeatureWeights> for BTreeMap<String, f32> {
    fn from(weights: FeatureWeights) -> Self {
        weights.by_type
    }
}

/// Resolves tag weights for one engine run.
///
/// Weights are cached by full tag and by type. The tag cache is filled by
/// [`WeightResolver::prime`] while the index is built; lookups afterwards
/// take `&self` so the resolver can be shared by the scoring threads of the
/// same run.
#[derive(Debug, Clone)]
pub struct WeightResolver {
    table: FeatureWeights,
    by_tag: HashMap<String, f32>,
    by_type: HashMap<String, f32>,
}

impl WeightResolver {
    pub fn new(table: FeatureWeights) -> Self {
        Self {
            table,
            by_tag: HashMap::new(),
            by_type: HashMap::new(),
        }
    }

    /// Resolve and cache the weights of the given tags
    pub fn prime<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) {
        for tag in tags {
            if self.by_tag.contains_key(tag) {
                continue;
            }
            let ty = feature_type(tag);
            let weight = match self.by_type.get(ty) {
                Some(&w) => w,
                None => {
                    let w = self.table.get(ty);
                    self.by_type.insert(ty.to_string(), w);
                    w
                }
            };
            self.by_tag.insert(tag.clone(), weight);
        }
    }

    /// Weight of a tag; unknown types and the empty tag weigh 1.0
    pub fn weight(&self, tag: &str) -> f32 {
        if tag.is_empty() {
            return DEFAULT_WEIGHT;
        }
        if let Some(&w) = self.by_tag.get(tag) {
            return w;
        }
        let ty = feature_type(tag);
        match self.by_type.get(ty) {
            Some(&w) => w,
            None => self.table.get(ty),
        }
    }

    /// Number of tags cached so far
    pub fn cached_tags(&self) -> usize {
        self.by_tag.len()
    }
}
