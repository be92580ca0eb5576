// src/results.rs

use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Statistics for one deduplication run.
///
/// Observability only: nothing here feeds back into matching or
/// clustering decisions.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,

    pub total_records: usize,
    pub total_documents: usize,
    pub total_blocks: usize,
    pub total_relations: usize,
    pub total_clusters: usize,
    pub singleton_clusters: usize,
    pub largest_cluster_size: usize,

    /// Phase timings in seconds
    pub document_build_time: f64,
    pub blocking_time: f64,
    pub matching_time: f64,
    pub clustering_time: f64,
    pub total_processing_time: f64,

    /// Final snapshot of the reporter counters
    pub counters: HashMap<String, u64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            run_timestamp: Utc::now().naive_utc(),
            total_records: 0,
            total_documents: 0,
            total_blocks: 0,
            total_relations: 0,
            total_clusters: 0,
            singleton_clusters: 0,
            largest_cluster_size: 0,
            document_build_time: 0.0,
            blocking_time: 0.0,
            matching_time: 0.0,
            clustering_time: 0.0,
            total_processing_time: 0.0,
            counters: HashMap::new(),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
