// src/reporter.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// Counter names used by the engine. Observability only: dropping or
// miscounting these never changes the clustering result.
pub const PARSE_ERRORS: &str = "parse-errors";
pub const PAIRS_COMPARED: &str = "pairs-compared";
pub const RELATIONS_EMITTED: &str = "relations-emitted";
pub const COMPARISON_ERRORS: &str = "comparison-errors";
pub const OVERSIZED_BLOCKS: &str = "oversized-blocks";

/// Named counters with commutative, associative merge semantics.
///
/// Each unit of work (one block, one parse pass) accumulates into its own
/// reporter; results are combined by summation at aggregation points, so
/// the totals are independent of processing order and parallelism degree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchReporter {
    counters: HashMap<String, u64>,
}

impl MatchReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, counter: &str, amount: u64) {
        if amount > 0 {
            *self.counters.entry(counter.to_string()).or_insert(0) += amount;
        }
    }

    pub fn get(&self, counter: &str) -> u64 {
        self.counters.get(counter).copied().unwrap_or(0)
    }

    /// Sums another reporter into this one.
    pub fn merge(&mut self, other: MatchReporter) {
        for (name, value) in other.counters {
            *self.counters.entry(name).or_insert(0) += value;
        }
    }

    /// Final counter snapshot, exposed at run end.
    pub fn counters(&self) -> &HashMap<String, u64> {
        &self.counters
    }
}
