// src/lib.rs
pub mod block;
pub mod blocking;
pub mod clustering;
pub mod config;
pub mod deduper;
pub mod document;
pub mod models;
pub mod reporter;
pub mod results;
pub mod similarity;

// Re-export common types for easier access
pub use config::{AggregationRule, ConfigError, DedupConfig, OversizedPolicy};
pub use deduper::{DedupOutput, Deduper};
pub use models::{Cluster, Document, DocumentId, MatchRelation};
pub use reporter::MatchReporter;
pub use results::RunStats;
