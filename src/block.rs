// src/block.rs
//
// Pairwise comparison inside one block. Blocks are independent units of
// work: the processor holds no mutable state shared across blocks, and
// counters travel in a per-block reporter merged by the caller.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{DedupConfig, OversizedPolicy};
use crate::models::{Document, MatchRelation};
use crate::reporter::{self, MatchReporter};
use crate::similarity::PairScorer;

pub struct BlockProcessor {
    scorer: Arc<PairScorer>,
    threshold: f64,
    max_block_size: usize,
    oversized_policy: OversizedPolicy,
    relation_label: String,
}

impl BlockProcessor {
    pub fn new(config: &DedupConfig, scorer: Arc<PairScorer>) -> Self {
        Self {
            scorer,
            threshold: config.wf.threshold,
            max_block_size: config.wf.max_block_size,
            oversized_policy: config.wf.oversized_policy,
            relation_label: config.wf.relation_label.clone(),
        }
    }

    /// Compares every unordered pair in the block once and returns the
    /// relations whose aggregate score reaches the acceptance threshold.
    ///
    /// Oversized blocks are not exhaustively compared: depending on the
    /// configured policy they are skipped or sampled, with a dedicated
    /// counter marking the degraded coverage. Bounded approximation, not
    /// an error.
    pub fn process(
        &self,
        key: &str,
        documents: &[Document],
        reporter: &mut MatchReporter,
    ) -> Vec<MatchRelation> {
        // Sorting by id makes the outcome (and the sample below)
        // independent of the order documents arrived in the block.
        let mut documents: Vec<&Document> = documents.iter().collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        documents.dedup_by(|a, b| a.id == b.id);

        if documents.len() > self.max_block_size {
            reporter.incr(reporter::OVERSIZED_BLOCKS, 1);
            match self.oversized_policy {
                OversizedPolicy::Skip => {
                    debug!(
                        "Skipping oversized block '{}' ({} documents, max {})",
                        key,
                        documents.len(),
                        self.max_block_size
                    );
                    return Vec::new();
                }
                OversizedPolicy::Sample(limit) => {
                    debug!(
                        "Sampling {} of {} documents in oversized block '{}'",
                        limit,
                        documents.len(),
                        key
                    );
                    // Seeded from the block key so reruns sample the
                    // same subset.
                    let mut rng = StdRng::seed_from_u64(seed_for(key));
                    documents.shuffle(&mut rng);
                    documents.truncate(limit);
                    documents.sort_by(|a, b| a.id.cmp(&b.id));
                }
            }
        }

        let mut relations = Vec::new();
        for i in 0..documents.len() {
            for j in (i + 1)..documents.len() {
                reporter.incr(reporter::PAIRS_COMPARED, 1);
                let result = self.scorer.score(documents[i], documents[j]);
                reporter.incr(reporter::COMPARISON_ERRORS, result.errors);
                if result.score >= self.threshold {
                    if let Some(relation) = MatchRelation::new(
                        documents[i].id.clone(),
                        documents[j].id.clone(),
                        self.relation_label.clone(),
                    ) {
                        relations.push(relation);
                    }
                }
            }
        }
        reporter.incr(reporter::RELATIONS_EMITTED, relations.len() as u64);
        relations
    }
}

fn seed_for(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
