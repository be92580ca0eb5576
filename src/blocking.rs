// src/blocking.rs
//
// Blocking key generation: cheap, high-recall keys that group documents
// plausibly referring to the same entity, so that expensive pairwise
// comparison only runs inside each group. A document can land in several
// blocks; redundant edges are deduplicated downstream by the clusterer.

use std::collections::{BTreeSet, HashMap};

use crate::config::{BlockingConfig, DedupConfig};
use crate::models::Document;
use crate::similarity::cleanup;

const DEFAULT_PREFIX_LEN: usize = 4;
const DEFAULT_MAX_TOKENS: usize = 4;
const DEFAULT_ACRONYM_MIN_LEN: usize = 2;
const DEFAULT_ACRONYM_MAX_LEN: usize = 6;
const DEFAULT_NGRAM_LEN: usize = 3;

/// Known key function names. Resolution is part of config validation;
/// an unknown name fails the run before any record is processed.
const FUNCTIONS: [&str; 4] = ["prefix", "sorted-tokens", "acronym", "ngram-pairs"];

pub fn is_known_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

/// All blocking keys for one document under the configured function list.
///
/// Pure in document fields and configuration: identical input always
/// yields identical keys. May be empty, in which case the document skips
/// comparison entirely and surfaces as a singleton cluster.
pub fn keys_for(document: &Document, config: &DedupConfig) -> Vec<String> {
    let mut keys = BTreeSet::new();
    for block in &config.blocking {
        for value in document.values(&block.field) {
            let cleaned = cleanup(value);
            if cleaned.is_empty() {
                continue;
            }
            if let Some(key) = apply_function(block, &cleaned) {
                // Namespacing by function keeps keys from different
                // functions from colliding into one block.
                keys.insert(format!("{}:{}", block.function, key));
            }
        }
    }
    keys.into_iter().collect()
}

fn param(block: &BlockingConfig, name: &str, default: usize) -> usize {
    block.params.get(name).copied().unwrap_or(default)
}

fn apply_function(block: &BlockingConfig, cleaned: &str) -> Option<String> {
    match block.function.as_str() {
        "prefix" => prefix_key(cleaned, param(block, "len", DEFAULT_PREFIX_LEN)),
        "sorted-tokens" => sorted_tokens_key(cleaned, param(block, "max", DEFAULT_MAX_TOKENS)),
        "acronym" => acronym_key(
            cleaned,
            param(block, "min", DEFAULT_ACRONYM_MIN_LEN),
            param(block, "max", DEFAULT_ACRONYM_MAX_LEN),
        ),
        "ngram-pairs" => ngram_pairs_key(cleaned, param(block, "ngram", DEFAULT_NGRAM_LEN)),
        // Unreachable for validated configs.
        _ => None,
    }
}

/// Leading alphanumeric characters of the value, spaces removed.
fn prefix_key(cleaned: &str, len: usize) -> Option<String> {
    let compact: String = cleaned
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(len)
        .collect();
    if compact.is_empty() {
        None
    } else {
        Some(compact)
    }
}

/// Sorted, deduplicated token signature, capped at `max` tokens.
fn sorted_tokens_key(cleaned: &str, max: usize) -> Option<String> {
    let tokens: BTreeSet<&str> = cleaned.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    Some(
        tokens
            .into_iter()
            .take(max)
            .collect::<Vec<_>>()
            .join("_"),
    )
}

/// First letter of each token. Only emitted when the acronym length is
/// inside [min, max]; a one-token value or a very long one produces
/// keys that are either useless or too selective.
fn acronym_key(cleaned: &str, min: usize, max: usize) -> Option<String> {
    let acronym: String = cleaned
        .split_whitespace()
        .filter_map(|token| token.chars().next())
        .collect();
    if acronym.chars().count() < min || acronym.chars().count() > max {
        return None;
    }
    Some(acronym)
}

/// Leading n-gram of the first token concatenated with the leading
/// n-gram of the last token. Catches title pairs that agree at both ends
/// but diverge in the middle.
fn ngram_pairs_key(cleaned: &str, ngram: usize) -> Option<String> {
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let head: String = tokens[0].chars().take(ngram).collect();
    let tail: String = tokens[tokens.len() - 1].chars().take(ngram).collect();
    Some(format!("{}_{}", head, tail))
}

/// Groups documents into blocks by shared key. Documents producing no
/// key are returned separately so the caller can route them straight to
/// singleton clusters.
pub fn group_into_blocks(
    documents: &[Document],
    config: &DedupConfig,
) -> HashMap<String, Vec<Document>> {
    let mut blocks: HashMap<String, Vec<Document>> = HashMap::new();
    for document in documents {
        for key in keys_for(document, config) {
            blocks.entry(key).or_default().push(document.clone());
        }
    }
    blocks
}
