//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, in-memory
//! test doubles).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{AnalyzedToken, DeleteOutcome};
use house_search_shared::HouseDocument;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected as `Arc<dyn SearchIndexProvider>` into both the write
/// side (index reconciliation) and the read side ([`crate::HouseSearchService`]).
///
/// # Document Identity
///
/// Documents written through `create_document` and `index_document` use the house id
/// as their document id. `update_document` and `delete_document` take an explicit id
/// because a document found by a search may carry an id written by an older indexer.
///
/// # Index Initialization
///
/// Implementations should call `ensure_index_exists` during application startup to ensure
/// the search index and any aliases are properly configured before performing document operations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the search index and any required aliases exist, creating them if necessary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If initialization fails
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Create a new document. Fails with [`SearchIndexError::Conflict`] if a document with
    /// the same id already exists.
    async fn create_document(&self, document: &HouseDocument) -> Result<(), SearchIndexError>;

    /// Write a document under its own id, replacing any existing one.
    async fn index_document(&self, document: &HouseDocument) -> Result<(), SearchIndexError>;

    /// Overwrite the existing document `doc_id` field by field with `document`. Fields unset
    /// in `document` are cleared.
    async fn update_document(
        &self,
        doc_id: &str,
        document: &HouseDocument,
    ) -> Result<(), SearchIndexError>;

    /// Delete the document `doc_id`.
    ///
    /// A missing document is not an error; the outcome reports `found = false`.
    async fn delete_document(&self, doc_id: &str) -> Result<DeleteOutcome, SearchIndexError>;

    /// Run the configured analyzer over `texts` and return every produced token.
    async fn analyze(&self, texts: &[String]) -> Result<Vec<AnalyzedToken>, SearchIndexError>;

    /// Execute a search request body and return the raw response body.
    ///
    /// A non-success status is reported as [`SearchIndexError::SearchError`].
    async fn search(&self, body: &Value) -> Result<Value, SearchIndexError>;
}
