//! Message types exchanged between the consumer and the orchestrator.

/// Position of a Kafka message, used to commit it once handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOffset {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl MessageOffset {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }
}

/// What the consumer does with its position once an operation is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckAction {
    /// Commit the offset after the handled message.
    Commit { next: i64 },
    /// Move the partition back to the failed message so it is delivered again.
    ///
    /// Nothing after it may be read first, or a later commit would skip it.
    Rewind { to: i64 },
}

impl AckAction {
    pub fn for_ack(offset: &MessageOffset, success: bool) -> Self {
        if success {
            AckAction::Commit {
                next: offset.offset + 1,
            }
        } else {
            AckAction::Rewind { to: offset.offset }
        }
    }
}

/// Messages that flow between the consumer and the orchestrator.
#[derive(Debug)]
pub enum StreamMessage {
    /// One raw operation payload and where it came from.
    Operation {
        payload: Vec<u8>,
        offset: MessageOffset,
    },
    /// Outcome of handling an operation. See [`AckAction`] for what the consumer does with it.
    Acknowledgment {
        offset: MessageOffset,
        success: bool,
        error: Option<String>,
    },
    /// Stream has ended.
    End,
    /// An error occurred.
    Error(String),
}
