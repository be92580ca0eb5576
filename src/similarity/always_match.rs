// src/similarity/always_match.rs

use std::collections::HashMap;

use super::SimilarityAlgorithm;

/// Scores every pair at `1.0` regardless of input.
///
/// Used for fields whose presence alone should count as full agreement,
/// and to force acceptance when debugging a matching configuration.
pub struct AlwaysMatch {
    weight: f64,
    params: HashMap<String, f64>,
}

impl AlwaysMatch {
    pub fn new(weight: f64, params: HashMap<String, f64>) -> Self {
        Self { weight, params }
    }
}

impl SimilarityAlgorithm for AlwaysMatch {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn params(&self) -> &HashMap<String, f64> {
        &self.params
    }

    fn distance(&self, _a: &str, _b: &str) -> f64 {
        1.0
    }
}
