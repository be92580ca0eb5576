// src/similarity/exact_match.rs

use std::collections::HashMap;

use super::{cleanup, SimilarityAlgorithm};

/// Equality after cleanup: 1.0 when the normalized values are identical,
/// 0.0 otherwise. Useful for codes and normalized identifiers (DOIs,
/// ISBNs) where fuzziness only adds noise.
pub struct ExactMatch {
    weight: f64,
    params: HashMap<String, f64>,
}

impl ExactMatch {
    pub fn new(weight: f64, params: HashMap<String, f64>) -> Self {
        Self { weight, params }
    }
}

impl SimilarityAlgorithm for ExactMatch {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn params(&self) -> &HashMap<String, f64> {
        &self.params
    }

    fn distance(&self, a: &str, b: &str) -> f64 {
        let ca = cleanup(a);
        let cb = cleanup(b);
        if ca.is_empty() || cb.is_empty() {
            return 0.0;
        }
        if ca == cb {
            1.0
        } else {
            0.0
        }
    }
}
