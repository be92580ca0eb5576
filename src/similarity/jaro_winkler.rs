// src/similarity/jaro_winkler.rs

use std::collections::HashMap;

use super::{cleanup, SimilarityAlgorithm};

/// Jaro-Winkler similarity over cleaned-up input.
///
/// Both values are normalized (case folding, punctuation and whitespace
/// stripping) before the metric runs, so "J. Smith" and "j smith" compare
/// as equal. Symmetric: `distance(a, b) == distance(b, a)`.
pub struct JaroWinkler {
    weight: f64,
    params: HashMap<String, f64>,
}

impl JaroWinkler {
    pub fn new(weight: f64, params: HashMap<String, f64>) -> Self {
        Self { weight, params }
    }
}

impl SimilarityAlgorithm for JaroWinkler {
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
            // Two values that normalize to nothing carry no signal.
            return 0.0;
        }
        self.normalize(strsim::jaro_winkler(&ca, &cb))
    }
}
