//! Operation messages that drive index synchronization.
//!
//! Every change to a house listing is announced as an [`IndexOperation`] on the
//! `house_build` topic. The retry depth travels inside the message so that replicated
//! consumers never need shared state to bound re-enqueues.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Highest retry count that is still processed. Operations above it are dropped.
pub const MAX_RETRY: u32 = 3;

/// What should happen to a house in the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Assemble the house and write it to the index.
    Index,
    /// Delete the house from the index.
    Remove,
}

impl OperationKind {
    /// Numeric discriminant used on the wire.
    pub fn code(&self) -> u8 {
        match self {
            OperationKind::Index => 0,
            OperationKind::Remove => 1,
        }
    }

    /// Parse a wire discriminant.
    ///
    /// Accepts the numeric form (`0` / `1`) as well as the textual form
    /// (`"index"` / `"remove"`, case-insensitive). Returns `None` for anything else.
    pub fn from_wire(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(OperationKind::Index),
                Some(1) => Some(OperationKind::Remove),
                _ => None,
            },
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "index" | "0" => Some(OperationKind::Index),
                "remove" | "1" => Some(OperationKind::Remove),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Errors raised while encoding or decoding operation payloads.
#[derive(Debug, Error)]
pub enum OperationCodecError {
    #[error("Malformed operation payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid operation payload: {0}")]
    Invalid(String),
}

/// A single request to index or remove one house.
///
/// Immutable: retries are expressed by building a new operation with
/// [`IndexOperation::next_attempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOperation {
    pub house_id: i64,
    pub kind: OperationKind,
    pub retry: u32,
}

/// Result of decoding a payload that was valid JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMessage {
    /// A well-formed operation.
    Operation(IndexOperation),
    /// A structurally valid message carrying an unknown operation discriminant.
    Unsupported { house_id: i64, operation: Value },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOperation {
    house_id: i64,
    operation: Value,
    retry: u32,
}

impl IndexOperation {
    /// First attempt at indexing a house.
    pub fn index(house_id: i64) -> Self {
        Self {
            house_id,
            kind: OperationKind::Index,
            retry: 0,
        }
    }

    /// First attempt at removing a house.
    pub fn remove(house_id: i64) -> Self {
        Self {
            house_id,
            kind: OperationKind::Remove,
            retry: 0,
        }
    }

    /// The same operation with the retry counter bumped by one.
    pub fn next_attempt(&self) -> Self {
        Self {
            retry: self.retry.saturating_add(1),
            ..*self
        }
    }

    /// Whether this operation is past the retry ceiling.
    pub fn is_exhausted(&self) -> bool {
        self.retry > MAX_RETRY
    }

    /// Message key, keeping one house's chain on one partition.
    pub fn key(&self) -> String {
        self.house_id.to_string()
    }

    /// Serialize to the JSON wire payload.
    pub fn encode(&self) -> Result<Vec<u8>, OperationCodecError> {
        let wire = WireOperation {
            house_id: self.house_id,
            operation: Value::from(self.kind.code()),
            retry: self.retry,
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Decode a JSON wire payload.
    ///
    /// # Returns
    ///
    /// * `Ok(DecodedMessage::Operation)` - For a well-formed operation
    /// * `Ok(DecodedMessage::Unsupported)` - For an unknown operation discriminant
    /// * `Err(OperationCodecError)` - For malformed JSON or missing fields
    pub fn decode(payload: &[u8]) -> Result<DecodedMessage, OperationCodecError> {
        let wire: WireOperation = serde_json::from_slice(payload)?;

        if wire.house_id <= 0 {
            return Err(OperationCodecError::Invalid(format!(
                "houseId must be positive, got {}",
                wire.house_id
            )));
        }

        Ok(match OperationKind::from_wire(&wire.operation) {
            Some(kind) => DecodedMessage::Operation(IndexOperation {
                house_id: wire.house_id,
                kind,
                retry: wire.retry,
            }),
            None => DecodedMessage::Unsupported {
                house_id: wire.house_id,
                operation: wire.operation,
            },
        })
    }
}
