//! Kafka publisher for index operations.
//!
//! Wraps an rdkafka `BaseProducer` configured with zstd compression. Every publish is
//! flushed before returning so a retry is never reported as enqueued while it still sits
//! in the local buffer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rdkafka::producer::{BaseProducer, BaseRecord, Producer};
use tracing::{debug, instrument};

use crate::config::KafkaConnection;
use crate::consumer::HOUSE_BUILD_TOPIC;
use crate::errors::IngestError;
use crate::producer::OperationPublisher;
use house_search_shared::IndexOperation;

/// How long a publish waits for delivery.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for creating a Kafka producer.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub connection: KafkaConnection,
    /// Client ID for this producer
    pub client_id: String,
}

impl ProducerConfig {
    pub fn new(connection: KafkaConnection, client_id: impl Into<String>) -> Self {
        Self {
            connection,
            client_id: client_id.into(),
        }
    }
}

/// Create a Kafka producer with the given configuration.
pub fn create_producer_with_config(config: &ProducerConfig) -> Result<BaseProducer> {
    let producer = config
        .connection
        .client_config()
        .set("client.id", &config.client_id)
        .set("compression.type", "zstd")
        .set("message.timeout.ms", "5000")
        .create()?;
    Ok(producer)
}

/// Publishes operations to the `house_build` topic, keyed by house id.
pub struct KafkaOperationPublisher {
    producer: Arc<BaseProducer>,
    topic: String,
}

impl KafkaOperationPublisher {
    pub fn new(config: &ProducerConfig) -> Result<Self> {
        Ok(Self {
            producer: Arc::new(create_producer_with_config(config)?),
            topic: HOUSE_BUILD_TOPIC.to_string(),
        })
    }

    /// Get the topic this publisher sends to
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl std::fmt::Debug for KafkaOperationPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaOperationPublisher")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OperationPublisher for KafkaOperationPublisher {
    #[instrument(skip(self), fields(topic = %self.topic))]
    async fn publish(&self, operation: &IndexOperation) -> Result<(), IngestError> {
        let payload = operation
            .encode()
            .map_err(|e| IngestError::publish(e.to_string()))?;
        let key = operation.key();
        let producer = Arc::clone(&self.producer);
        let topic = self.topic.clone();

        // Flushing blocks, so keep it off the runtime threads
        tokio::task::spawn_blocking(move || {
            producer
                .send(BaseRecord::to(&topic).key(&key).payload(&payload))
                .map_err(|(e, _)| e)?;
            producer.flush(FLUSH_TIMEOUT)
        })
        .await
        .map_err(|e| IngestError::publish(e.to_string()))?
        .map_err(|e| IngestError::publish(e.to_string()))?;

        debug!(
            house_id = operation.house_id,
            retry = operation.retry,
            "Published index operation"
        );
        Ok(())
    }
}
