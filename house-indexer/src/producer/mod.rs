//! Producer module for the house indexer.
//!
//! Publishes index operations onto the `house_build` topic, both for fresh "record
//! changed" requests and for re-enqueued retries.

mod kafka_publisher;

pub use kafka_publisher::{create_producer_with_config, KafkaOperationPublisher, ProducerConfig};

use async_trait::async_trait;
use house_search_shared::IndexOperation;

use crate::errors::IngestError;

/// Sink for index operations.
#[async_trait]
pub trait OperationPublisher: Send + Sync {
    /// Publish an operation and wait until the broker has it.
    async fn publish(&self, operation: &IndexOperation) -> Result<(), IngestError>;

    /// Start a new index chain for a house.
    async fn request_index(&self, house_id: i64) -> Result<(), IngestError> {
        self.publish(&IndexOperation::index(house_id)).await
    }

    /// Start a new removal chain for a house.
    async fn request_remove(&self, house_id: i64) -> Result<(), IngestError> {
        self.publish(&IndexOperation::remove(house_id)).await
    }
}
