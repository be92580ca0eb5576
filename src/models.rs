// src/models.rs

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

//------------------------------------------------------------------------------
// IDENTIFIER TYPES
//------------------------------------------------------------------------------
// Using newtype pattern for type safety to prevent mixing different ID types

/// Strongly typed identifier for a source record / document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//------------------------------------------------------------------------------
// CORE DOMAIN MODELS
//------------------------------------------------------------------------------

/// Canonical in-memory representation of one record.
///
/// Built once per run from a raw source record and immutable afterwards.
/// Field values are kept as strings; a field may carry multiple values
/// (e.g. alternative titles), and comparators decide how to combine them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier for this document within the run
    pub id: DocumentId,

    /// Mapping from configured field name to its extracted values
    pub fields: HashMap<String, Vec<String>>,
}

impl Document {
    pub fn new(id: DocumentId, fields: HashMap<String, Vec<String>>) -> Self {
        Self { id, fields }
    }

    /// All values of a field, or an empty slice when the field is absent.
    pub fn values(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value of a field, if any.
    pub fn first_value(&self, field: &str) -> Option<&str> {
        self.values(field).first().map(String::as_str)
    }
}

/// An accepted pairwise equivalence assertion between two documents.
///
/// The pair is unordered; `new` canonicalizes so that `first < second`,
/// which also makes deduplication of redundant relations trivial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRelation {
    pub first: DocumentId,
    pub second: DocumentId,
    /// Informational label (e.g. "equalTo"); ignored by the clusterer
    pub label: String,
}

impl MatchRelation {
    /// Returns `None` for a self-pair: a document never matches itself
    /// as a relation.
    pub fn new(a: DocumentId, b: DocumentId, label: impl Into<String>) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self {
                first: a,
                second: b,
                label: label.into(),
            }),
            std::cmp::Ordering::Greater => Some(Self {
                first: b,
                second: a,
                label: label.into(),
            }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// A maximal set of documents transitively linked by match relations.
///
/// Clusters partition the identifier universe: every input document is a
/// member of exactly one cluster, including singletons for documents that
/// never matched anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster identifier; the identifier of the smallest member
    pub id: String,

    /// Member document identifiers, in stable order
    pub members: BTreeSet<DocumentId>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}
