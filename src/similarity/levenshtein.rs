// src/similarity/levenshtein.rs

use std::collections::HashMap;

use super::{cleanup, SimilarityAlgorithm};

/// Normalized Levenshtein similarity over cleaned-up input, bounded in
/// [0,1] (1.0 means equal after cleanup).
pub struct Levenshtein {
    weight: f64,
    params: HashMap<String, f64>,
}

impl Levenshtein {
    pub fn new(weight: f64, params: HashMap<String, f64>) -> Self {
        Self { weight, params }
    }
}

impl SimilarityAlgorithm for Levenshtein {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn params(&self) -> &HashMap<String, f64> {
        &self.params
    }

    fn distance(&self, a: &str, b: &str) -> f64 {
        let ca = cleanup(a);
        let cb = cleanup(b);
        if ca.is_empty() && cb.is_empty() {
            return 0.0;
        }
        self.normalize(strsim::normalized_levenshtein(&ca, &cb))
    }
}
