// src/document.rs
//
// Raw record -> Document boundary. Records arrive as JSON values; the
// configuration says where the identifier and each comparison field live
// (JSON pointers). Anything malformed is counted and skipped, never
// fatal.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde_json::Value;

use crate::config::DedupConfig;
use crate::models::{Document, DocumentId};
use crate::reporter::{self, MatchReporter};

/// Builds documents for one run.
///
/// Skips (and counts as parse errors) records that are not JSON objects
/// or carry a missing/empty identifier. Duplicate identifiers keep the
/// first occurrence; later ones are discarded before blocking.
pub fn build_documents(
    records: &[Value],
    config: &DedupConfig,
) -> (Vec<Document>, MatchReporter) {
    let mut reporter = MatchReporter::new();
    let mut seen: HashSet<DocumentId> = HashSet::new();
    let mut documents = Vec::with_capacity(records.len());

    for record in records {
        match build_document(record, config) {
            Some(document) => {
                if seen.insert(document.id.clone()) {
                    documents.push(document);
                } else {
                    debug!("Discarding duplicate identifier '{}'", document.id);
                }
            }
            None => {
                reporter.incr(reporter::PARSE_ERRORS, 1);
            }
        }
    }

    if reporter.get(reporter::PARSE_ERRORS) > 0 {
        warn!(
            "Skipped {} malformed records out of {}",
            reporter.get(reporter::PARSE_ERRORS),
            records.len()
        );
    }
    (documents, reporter)
}

fn build_document(record: &Value, config: &DedupConfig) -> Option<Document> {
    if !record.is_object() {
        return None;
    }

    let identifier = record
        .pointer(&config.identifier_path)
        .and_then(scalar_to_string)?;
    if identifier.is_empty() {
        return None;
    }

    let mut fields = HashMap::with_capacity(config.fields.len());
    for field in &config.fields {
        let values = extract_values(record, &field.path);
        if !values.is_empty() {
            fields.insert(field.name.clone(), values);
        }
    }

    Some(Document::new(DocumentId(identifier), fields))
}

/// A field value may be a single scalar or an array of scalars; numbers
/// and booleans are stringified, nulls and nested structures dropped.
fn extract_values(record: &Value, path: &str) -> Vec<String> {
    match record.pointer(path) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(value) => scalar_to_string(value).into_iter().collect(),
        None => Vec::new(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
