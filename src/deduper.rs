// src/deduper.rs
//
// Run orchestration: records -> documents -> blocks -> relations ->
// clusters. Blocks are processed concurrently; each worker returns its
// relations together with a private reporter, and the reporters are
// merged by summation afterwards, so no counter state is shared while
// work is in flight.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use log::info;
use serde_json::Value;

use crate::block::BlockProcessor;
use crate::blocking;
use crate::clustering;
use crate::config::DedupConfig;
use crate::document;
use crate::models::{Cluster, Document, MatchRelation};
use crate::reporter::MatchReporter;
use crate::results::RunStats;
use crate::similarity::PairScorer;

/// Terminal artifacts of one run. `clusters` and `relations` come from
/// the same computation: the clusters are exactly the connected
/// components of the relation set.
#[derive(Debug)]
pub struct DedupOutput {
    pub clusters: Vec<Cluster>,
    pub relations: Vec<MatchRelation>,
    pub stats: RunStats,
}

pub struct Deduper {
    config: DedupConfig,
    processor: Arc<BlockProcessor>,
}

impl Deduper {
    /// Fails on an invalid configuration; nothing is processed in that
    /// case.
    pub fn new(config: DedupConfig) -> Result<Self> {
        config.validate().context("Invalid dedup configuration")?;
        let scorer = Arc::new(
            PairScorer::from_config(&config).context("Failed to build pair scorer")?,
        );
        let processor = Arc::new(BlockProcessor::new(&config, scorer));
        Ok(Self { config, processor })
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Full pipeline: returns the cluster partition, the accepted
    /// relations it was derived from, and run statistics.
    pub async fn dedup(&self, records: &[Value]) -> Result<DedupOutput> {
        let run_start = Instant::now();
        let mut stats = RunStats::new();
        stats.total_records = records.len();
        info!(
            "Starting dedup run {} over {} records",
            stats.run_id,
            records.len()
        );

        let phase_start = Instant::now();
        let (documents, mut reporter) = document::build_documents(records, &self.config);
        stats.total_documents = documents.len();
        stats.document_build_time = phase_start.elapsed().as_secs_f64();
        info!(
            "Built {} documents in {:.2?}",
            documents.len(),
            phase_start.elapsed()
        );

        let phase_start = Instant::now();
        let blocks = blocking::group_into_blocks(&documents, &self.config);
        stats.total_blocks = blocks.len();
        stats.blocking_time = phase_start.elapsed().as_secs_f64();
        info!(
            "Grouped documents into {} blocks in {:.2?}",
            blocks.len(),
            phase_start.elapsed()
        );

        let phase_start = Instant::now();
        let relations = self.process_blocks(blocks, &mut reporter).await?;
        stats.total_relations = relations.len();
        stats.matching_time = phase_start.elapsed().as_secs_f64();
        info!(
            "Accepted {} unique match relations in {:.2?}",
            relations.len(),
            phase_start.elapsed()
        );

        let phase_start = Instant::now();
        let ids: Vec<_> = documents.iter().map(|d| d.id.clone()).collect();
        let clusters =
            clustering::connected_components(&ids, &relations, self.config.wf.max_iterations);
        stats.total_clusters = clusters.len();
        stats.singleton_clusters = clusters.iter().filter(|c| c.is_singleton()).count();
        stats.largest_cluster_size = clusters.iter().map(Cluster::size).max().unwrap_or(0);
        stats.clustering_time = phase_start.elapsed().as_secs_f64();
        info!(
            "Clustered into {} clusters ({} singletons) in {:.2?}",
            clusters.len(),
            stats.singleton_clusters,
            phase_start.elapsed()
        );

        for (name, value) in reporter.counters() {
            info!("{} -> {}", name, value);
        }
        stats.counters = reporter.counters().clone();
        stats.total_processing_time = run_start.elapsed().as_secs_f64();

        Ok(DedupOutput {
            clusters,
            relations,
            stats,
        })
    }

    /// Accepted relations only, for consumers that run their own
    /// clustering downstream. Agrees with `dedup`: both draw the
    /// relation set from the same block computation.
    pub async fn compute_relations(
        &self,
        records: &[Value],
        reporter: &mut MatchReporter,
    ) -> Result<Vec<MatchRelation>> {
        let (documents, parse_reporter) = document::build_documents(records, &self.config);
        reporter.merge(parse_reporter);
        let blocks = blocking::group_into_blocks(&documents, &self.config);
        self.process_blocks(blocks, reporter).await
    }

    /// Runs every block through the processor with a bounded worker
    /// pool. The same pair can be compared in several blocks; the
    /// returned set is deduplicated and sorted for a deterministic
    /// output regardless of completion order.
    async fn process_blocks(
        &self,
        blocks: HashMap<String, Vec<Document>>,
        reporter: &mut MatchReporter,
    ) -> Result<Vec<MatchRelation>> {
        let workers = self.config.wf.block_workers.max(1);

        let results: Vec<(Vec<MatchRelation>, MatchReporter)> =
            stream::iter(blocks.into_iter())
                .map(|(key, documents)| {
                    let processor = Arc::clone(&self.processor);
                    tokio::task::spawn_blocking(move || {
                        let mut block_reporter = MatchReporter::new();
                        let relations =
                            processor.process(&key, &documents, &mut block_reporter);
                        (relations, block_reporter)
                    })
                })
                .buffer_unordered(workers)
                .map(|joined| joined.context("Block processing task panicked"))
                .collect::<Vec<_>>()
                .await
                .into_iter()
                .collect::<Result<_>>()?;

        let mut unique: HashSet<MatchRelation> = HashSet::new();
        for (relations, block_reporter) in results {
            reporter.merge(block_reporter);
            unique.extend(relations);
        }

        let mut relations: Vec<MatchRelation> = unique.into_iter().collect();
        relations.sort_by(|a, b| (&a.first, &a.second).cmp(&(&b.first, &b.second)));
        Ok(relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_config;
    use serde_json::json;

    fn records() -> Vec<Value> {
        vec![
            json!({"id": "A", "name": "John Smith", "year": 1990}),
            json!({"id": "B", "name": "Jon Smith", "year": 1990}),
            json!({"id": "C", "name": "Totally Different", "year": 1990}),
        ]
    }

    #[tokio::test]
    async fn scenario_smith_pair_matches_and_c_stays_alone() {
        let deduper = Deduper::new(test_config()).unwrap();
        let output = deduper.dedup(&records()).await.unwrap();

        assert_eq!(output.relations.len(), 1);
        assert_eq!(output.relations[0].first.as_str(), "A");
        assert_eq!(output.relations[0].second.as_str(), "B");

        assert_eq!(output.clusters.len(), 2);
        let sizes: Vec<usize> = output.clusters.iter().map(Cluster::size).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[tokio::test]
    async fn relations_and_clusters_agree() {
        let deduper = Deduper::new(test_config()).unwrap();
        let output = deduper.dedup(&records()).await.unwrap();
        let mut reporter = MatchReporter::new();
        let relations = deduper
            .compute_relations(&records(), &mut reporter)
            .await
            .unwrap();
        assert_eq!(output.relations, relations);
    }

    #[tokio::test]
    async fn invalid_config_fails_before_processing() {
        let mut config = test_config();
        config.fields[0].algorithm = "bogus".to_string();
        assert!(Deduper::new(config).is_err());
    }
}
