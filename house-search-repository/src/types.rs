//! Request and response types for search index operations.

use serde::Deserialize;

/// Outcome of deleting a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Number of shard copies the delete was routed to.
    ///
    /// Zero means the delete reached no shard at all and must be treated as failed.
    pub shards_total: u64,
    /// Whether the document existed before the delete.
    pub found: bool,
}

impl DeleteOutcome {
    /// Whether the delete reached at least one shard copy.
    pub fn is_acknowledged(&self) -> bool {
        self.shards_total >= 1
    }
}

/// A token produced by the search engine's text analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyzedToken {
    pub token: String,
    #[serde(rename = "type", default)]
    pub token_type: String,
}

impl AnalyzedToken {
    pub fn new(token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_type: token_type.into(),
        }
    }
}
