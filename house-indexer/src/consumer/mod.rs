//! Consumer module for the house indexer.
//!
//! Provides the Kafka consumer that receives index operations from the `house_build` topic.

mod kafka_consumer;
mod messages;

pub use kafka_consumer::{KafkaConsumer, HOUSE_BUILD_TOPIC};
pub use messages::{AckAction, MessageOffset, StreamMessage};
