// src/similarity/mod.rs
//
// Pluggable field-similarity algorithms plus the policy that folds
// per-field scores into one pairwise decision.

pub mod always_match;
pub mod exact_match;
pub mod jaro_winkler;
pub mod levenshtein;

use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::config::{AggregationRule, DedupConfig, FieldConfig};
use crate::models::Document;

pub use always_match::AlwaysMatch;
pub use exact_match::ExactMatch;
pub use jaro_winkler::JaroWinkler;
pub use levenshtein::Levenshtein;

/// Cap on values considered per side when a field is multi-valued.
const MAX_VALUES_PER_FIELD: usize = 5;

/// A pluggable similarity algorithm.
///
/// Implementations must be stateless and side-effect-free. `distance` is
/// total over all string pairs, empty strings included: degenerate input
/// scores `0.0`, it never errors.
pub trait SimilarityAlgorithm: Send + Sync {
    /// Non-negative contribution factor used by score aggregation.
    fn weight(&self) -> f64;

    fn params(&self) -> &HashMap<String, f64>;

    /// Similarity of two field values in `[0, 1]`.
    fn distance(&self, a: &str, b: &str) -> f64;

    /// Post-processing applied to a raw metric score. Identity by default.
    fn normalize(&self, raw: f64) -> f64 {
        raw
    }
}

/// Lowercases, strips punctuation and collapses whitespace, so that the
/// fuzzy metrics compare normalized text rather than formatting noise.
pub fn cleanup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_was_space = true;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Resolves an algorithm name from the registry.
///
/// Called at configuration-load time: an unknown name is a fatal
/// configuration error, never a per-record one.
pub fn resolve(
    name: &str,
    weight: f64,
    params: &HashMap<String, f64>,
) -> Result<Box<dyn SimilarityAlgorithm>> {
    match name {
        "always-match" => Ok(Box::new(AlwaysMatch::new(weight, params.clone()))),
        "jaro-winkler" => Ok(Box::new(JaroWinkler::new(weight, params.clone()))),
        "levenshtein" => Ok(Box::new(Levenshtein::new(weight, params.clone()))),
        "exact" => Ok(Box::new(ExactMatch::new(weight, params.clone()))),
        other => Err(anyhow!("unknown similarity algorithm '{}'", other)),
    }
}

/// Outcome of scoring one candidate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    /// Aggregate similarity in `[0, 1]`
    pub score: f64,

    /// Field comparisons that degraded to `0.0` (e.g. missing values)
    pub errors: u64,
}

struct FieldComparator {
    field: FieldConfig,
    algorithm: Box<dyn SimilarityAlgorithm>,
}

/// Compares document pairs field-by-field and aggregates the scores
/// according to the configured rule.
///
/// Built once per run from a validated configuration; shared read-only
/// across block-processing workers.
pub struct PairScorer {
    comparators: Vec<FieldComparator>,
    rule: AggregationRule,
    total_weight: f64,
}

impl PairScorer {
    /// Fails only on configuration problems (unknown algorithm), which
    /// `DedupConfig::validate` already rules out for validated configs.
    pub fn from_config(config: &DedupConfig) -> Result<Self> {
        let mut comparators = Vec::with_capacity(config.fields.len());
        let mut total_weight = 0.0;
        for field in &config.fields {
            let algorithm = resolve(&field.algorithm, field.weight, &field.params)?;
            total_weight += field.weight;
            comparators.push(FieldComparator {
                field: field.clone(),
                algorithm,
            });
        }
        Ok(Self {
            comparators,
            rule: config.aggregation,
            total_weight,
        })
    }

    /// Aggregate similarity for one unordered document pair.
    pub fn score(&self, a: &Document, b: &Document) -> PairScore {
        let mut weighted_sum = 0.0;
        let mut errors = 0u64;

        for comparator in &self.comparators {
            let (field_score, degraded) = self.field_score(comparator, a, b);
            if degraded {
                errors += 1;
            }

            if self.rule == AggregationRule::MustMatchThenAverage && comparator.field.must_match {
                let floor = comparator.field.threshold.unwrap_or(1.0);
                if field_score < floor {
                    // A failed must-match field rejects the pair outright.
                    return PairScore { score: 0.0, errors };
                }
            }

            weighted_sum += field_score * comparator.algorithm.weight();
        }

        let score = if self.total_weight > 0.0 {
            weighted_sum / self.total_weight
        } else {
            0.0
        };
        PairScore { score, errors }
    }

    /// Best score across the (bounded) value cross product of one field.
    /// Missing values degrade to `0.0` and are flagged for the
    /// comparison-error counter.
    fn field_score(&self, comparator: &FieldComparator, a: &Document, b: &Document) -> (f64, bool) {
        let values_a = a.values(&comparator.field.name);
        let values_b = b.values(&comparator.field.name);
        if values_a.is_empty() || values_b.is_empty() {
            return (0.0, true);
        }

        let mut best = 0.0f64;
        for value_a in values_a.iter().take(MAX_VALUES_PER_FIELD) {
            for value_b in values_b.iter().take(MAX_VALUES_PER_FIELD) {
                let score = comparator.algorithm.distance(value_a, value_b);
                // Defend the [0,1] contract even against a misbehaving
                // algorithm implementation.
                let score = if score.is_finite() {
                    score.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                if score > best {
                    best = score;
                }
            }
        }
        (best, false)
    }
}
