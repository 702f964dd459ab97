//! # House Indexer
//!
//! Keeps the house search index in sync with the listing database. Index operations
//! arrive on the `house_build` Kafka topic; each one is assembled from PostgreSQL,
//! geocoded, written to OpenSearch and mirrored into the LBS store.
//!
//! ## Architecture
//!
//! 1. **Consumer**: Receives operation messages from Kafka, one at a time
//! 2. **Dispatcher**: Decodes operations and bounds retries
//! 3. **Processor**: Assembles documents from the record store and geocodes them
//! 4. **Loader**: Reconciles documents with the index and uploads LBS points
//! 5. **Producer**: Re-enqueues failed operations
//! 6. **Orchestrator**: Coordinates the flow and acknowledges offsets
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Kafka consumer for index operations
//! - [`dispatcher`]: Retry-bounded routing of operations
//! - [`processor`]: Document assembly
//! - [`loader`]: Index reconciliation and suggest derivation
//! - [`producer`]: Operation publishing
//! - [`orchestrator`]: Coordinates the ingest flow
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod consumer;
pub mod dispatcher;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod producer;

pub use config::Dependencies;
pub use errors::{AssemblyError, IngestError};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
