//! Kafka consumer implementation for the house indexer.
//!
//! Reads index operations from the `house_build` topic one at a time: the next message is
//! only pulled once the orchestrator has acknowledged the previous one. A failed message is
//! read again before anything after it.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::{
    consumer::{CommitMode, Consumer as _, StreamConsumer},
    message::Message as KafkaMessage,
    Offset, TopicPartitionList,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument, warn};

use crate::config::KafkaConnection;
use crate::consumer::messages::{AckAction, MessageOffset, StreamMessage};
use crate::errors::IngestError;
use crate::orchestrator::Consumer;

/// The topic carrying index operations.
pub const HOUSE_BUILD_TOPIC: &str = "house_build";

/// Pause before a failed message is read again.
const REDELIVERY_BACKOFF: Duration = Duration::from_secs(1);

const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka consumer for index operations.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer on the `house_build` topic.
    ///
    /// # Arguments
    ///
    /// * `connection` - Broker address and credentials
    /// * `group_id` - Consumer group ID
    pub fn new(connection: &KafkaConnection, group_id: &str) -> Result<Self, IngestError> {
        Self::with_topic(connection, group_id, HOUSE_BUILD_TOPIC)
    }

    pub fn with_topic(
        connection: &KafkaConnection,
        group_id: &str,
        topic: &str,
    ) -> Result<Self, IngestError> {
        let consumer: StreamConsumer = connection
            .client_config()
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()?;

        info!(
            broker = %connection.broker,
            group_id = %group_id,
            topic = %topic,
            "Created Kafka consumer"
        );

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }

    /// Commit the position after a handled message.
    fn commit(&self, offset: &MessageOffset, next: i64) -> Result<(), IngestError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(&offset.topic, offset.partition, Offset::Offset(next))?;
        self.consumer.commit(&tpl, CommitMode::Async)?;
        Ok(())
    }

    /// Point the partition back at a failed message.
    fn rewind(&self, offset: &MessageOffset, to: i64) -> Result<(), IngestError> {
        self.consumer
            .seek(&offset.topic, offset.partition, Offset::Offset(to), SEEK_TIMEOUT)?;
        Ok(())
    }
}

#[async_trait]
impl Consumer for KafkaConsumer {
    fn subscribe(&self) -> Result<(), IngestError> {
        self.consumer.subscribe(&[self.topic.as_str()])?;
        info!(topic = %self.topic, "Subscribed to Kafka topic");
        Ok(())
    }

    #[instrument(skip(self, sender, ack_receiver, shutdown))]
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        use futures::StreamExt;

        let mut message_stream = self.consumer.stream();
        let mut in_flight = false;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    // An unacknowledged operation is re-read from the committed offset on restart
                    let _ = sender.send(StreamMessage::End).await;
                    break;
                }
                ack = ack_receiver.recv() => {
                    match ack {
                        Some(StreamMessage::Acknowledgment { offset, success, error }) => {
                            in_flight = false;
                            match AckAction::for_ack(&offset, success) {
                                AckAction::Commit { next } => match self.commit(&offset, next) {
                                    Ok(()) => debug!(offset = offset.offset, "Committed offset"),
                                    Err(e) => error!(error = %e, "Failed to commit offset after acknowledgment"),
                                },
                                AckAction::Rewind { to } => {
                                    error!(
                                        partition = offset.partition,
                                        offset = offset.offset,
                                        error = error.as_deref().unwrap_or("Unknown error"),
                                        "Processing failed, message will be read again"
                                    );
                                    tokio::time::sleep(REDELIVERY_BACKOFF).await;
                                    // Stops consumption if the seek fails so no later offset is committed
                                    self.rewind(&offset, to)?;
                                }
                            }
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Acknowledgment channel closed");
                            break;
                        }
                        Some(_) => {}
                    }
                }
                message = message_stream.next(), if !in_flight => {
                    match message {
                        Some(Ok(msg)) => {
                            let offset = MessageOffset::new(msg.topic(), msg.partition(), msg.offset());
                            debug!(
                                partition = offset.partition,
                                offset = offset.offset,
                                "Received message from Kafka"
                            );

                            let Some(payload) = msg.payload() else {
                                warn!(offset = offset.offset, "Skipping message with empty payload");
                                self.commit(&offset, offset.offset + 1)?;
                                continue;
                            };

                            sender
                                .send(StreamMessage::Operation { payload: payload.to_vec(), offset })
                                .await
                                .map_err(|e| IngestError::ChannelError(e.to_string()))?;
                            in_flight = true;
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka error");
                            let _ = sender.send(StreamMessage::Error(e.to_string())).await;
                        }
                        None => {
                            info!("Kafka stream ended");
                            let _ = sender.send(StreamMessage::End).await;
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_name() {
        assert_eq!(HOUSE_BUILD_TOPIC, "house_build");
    }
}
