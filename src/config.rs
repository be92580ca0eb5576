// src/config.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blocking;
use crate::similarity;

/// Default informational label attached to emitted match relations.
pub const DEFAULT_RELATION_LABEL: &str = "equalTo";

/// Default number of blocks processed concurrently.
pub const DEFAULT_BLOCK_WORKERS: usize = 4;

/// Fatal configuration problems. Any of these fails the run before any
/// record is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown similarity algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("unknown blocking function '{0}'")]
    UnknownBlockingFunction(String),

    #[error("field '{field}' has negative weight {weight}")]
    NegativeWeight { field: String, weight: f64 },

    #[error("total field weight is zero; at least one field must carry weight")]
    ZeroTotalWeight,

    #[error("acceptance threshold {0} outside [0,1]")]
    InvalidThreshold(f64),

    #[error("must-match field '{0}' requires a per-field threshold under must-match aggregation")]
    MissingMustMatchThreshold(String),

    #[error("no comparison fields configured")]
    NoFields,

    #[error("identifier path is empty")]
    EmptyIdentifierPath,
}

/// How per-field scores are combined into one pair decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationRule {
    /// Weighted average of all configured field scores.
    #[default]
    WeightedAverage,

    /// Fields marked `must_match` below their own threshold force rejection;
    /// otherwise the weighted average of the remaining fields decides.
    MustMatchThenAverage,
}

/// What to do with a block larger than `max_block_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", tag = "mode", content = "limit")]
pub enum OversizedPolicy {
    /// Emit nothing from the block.
    #[default]
    Skip,

    /// Compare only a deterministic sample of this many documents.
    Sample(usize),
}

/// Workflow-level parameters: thresholds, bounds and parallelism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Aggregate score at or above which a pair becomes a match relation
    pub threshold: f64,

    /// Blocks larger than this are not exhaustively compared
    pub max_block_size: usize,

    #[serde(default)]
    pub oversized_policy: OversizedPolicy,

    /// Superstep bound for label-propagation clustering
    pub max_iterations: usize,

    /// Number of blocks processed concurrently
    #[serde(default = "default_block_workers")]
    pub block_workers: usize,

    /// Label stamped on every emitted relation
    #[serde(default = "default_relation_label")]
    pub relation_label: String,
}

fn default_block_workers() -> usize {
    DEFAULT_BLOCK_WORKERS
}

fn default_relation_label() -> String {
    DEFAULT_RELATION_LABEL.to_string()
}

/// One comparison field: where to find it in the raw record and how to
/// score it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Field name used in `Document.fields`
    pub name: String,

    /// JSON pointer into the raw record (e.g. "/metadata/title")
    pub path: String,

    /// Similarity algorithm name, resolved against the registry at load time
    pub algorithm: String,

    pub weight: f64,

    /// Algorithm-specific parameters
    #[serde(default)]
    pub params: HashMap<String, f64>,

    /// Under must-match aggregation, a low score on this field rejects the
    /// pair outright
    #[serde(default)]
    pub must_match: bool,

    /// Per-field rejection threshold for must-match fields
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// One blocking key function applied to one document field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingConfig {
    /// Key function name, resolved against the registry at load time
    pub function: String,

    /// Document field the function reads
    pub field: String,

    #[serde(default)]
    pub params: HashMap<String, usize>,
}

/// Full matching configuration for one deduplication run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    pub wf: WorkflowConfig,

    /// JSON pointer to the record identifier (e.g. "/id")
    pub identifier_path: String,

    pub fields: Vec<FieldConfig>,

    pub blocking: Vec<BlockingConfig>,

    #[serde(default)]
    pub aggregation: AggregationRule,
}

impl DedupConfig {
    /// Checks the configuration against the algorithm and blocking-function
    /// registries. Called once before processing; every error here is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identifier_path.is_empty() {
            return Err(ConfigError::EmptyIdentifierPath);
        }
        if self.fields.is_empty() {
            return Err(ConfigError::NoFields);
        }
        if !(0.0..=1.0).contains(&self.wf.threshold) {
            return Err(ConfigError::InvalidThreshold(self.wf.threshold));
        }

        let mut total_weight = 0.0;
        for field in &self.fields {
            if field.weight < 0.0 {
                return Err(ConfigError::NegativeWeight {
                    field: field.name.clone(),
                    weight: field.weight,
                });
            }
            total_weight += field.weight;

            // Resolving here is what makes an unknown name fatal at load
            // time rather than a per-record error later.
            similarity::resolve(&field.algorithm, field.weight, &field.params)
                .map_err(|_| ConfigError::UnknownAlgorithm(field.algorithm.clone()))?;

            if self.aggregation == AggregationRule::MustMatchThenAverage
                && field.must_match
                && field.threshold.is_none()
            {
                return Err(ConfigError::MissingMustMatchThreshold(field.name.clone()));
            }
        }
        if total_weight == 0.0 {
            return Err(ConfigError::ZeroTotalWeight);
        }

        for block in &self.blocking {
            if !blocking::is_known_function(&block.function) {
                return Err(ConfigError::UnknownBlockingFunction(block.function.clone()));
            }
        }

        Ok(())
    }

    /// Parses and validates a configuration from its JSON representation.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let config: DedupConfig =
            serde_json::from_str(json).context("Failed to parse dedup configuration JSON")?;
        config
            .validate()
            .context("Invalid dedup configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A minimal valid configuration used across unit tests: one fuzzy
    /// name field, prefix blocking, threshold 0.8.
    pub fn test_config() -> DedupConfig {
        DedupConfig {
            wf: WorkflowConfig {
                threshold: 0.8,
                max_block_size: 200,
                oversized_policy: OversizedPolicy::Skip,
                max_iterations: 20,
                block_workers: 2,
                relation_label: DEFAULT_RELATION_LABEL.to_string(),
            },
            identifier_path: "/id".to_string(),
            fields: vec![FieldConfig {
                name: "name".to_string(),
                path: "/name".to_string(),
                algorithm: "jaro-winkler".to_string(),
                weight: 1.0,
                params: HashMap::new(),
                must_match: false,
                threshold: None,
            }],
            blocking: vec![BlockingConfig {
                function: "prefix".to_string(),
                field: "name".to_string(),
                params: HashMap::from([("len".to_string(), 2)]),
            }],
            aggregation: AggregationRule::WeightedAverage,
        }
    }
}
