//! Error types for the house indexer.

use house_geocoder::GeoError;
use house_record_repository::{AddressLevel, RecordRepositoryError};
use thiserror::Error;

/// Errors that can occur while moving operations through the indexer.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// Error publishing a re-enqueued operation.
    #[error("Publish error: {0}")]
    PublishError(String),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl IngestError {
    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }

    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }

    /// Create a publish error.
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::PublishError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for IngestError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}

/// Reasons a house could not be turned into a search document.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("House {0} not found")]
    HouseNotFound(i64),

    #[error("Detail of house {0} not found")]
    DetailNotFound(i64),

    #[error("No {} reference data for '{en_name}' (house {house_id})", .level.as_str())]
    AddressNotFound {
        house_id: i64,
        level: AddressLevel,
        en_name: String,
    },

    #[error("Record store error: {0}")]
    Records(#[from] RecordRepositoryError),

    #[error("Geocoding failed: {0}")]
    Geocode(#[from] GeoError),
}

impl AssemblyError {
    /// Whether trying the same operation again later may succeed.
    ///
    /// A missing detail row is usually a write that has not landed yet; a missing house
    /// or missing reference data will not fix itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            AssemblyError::HouseNotFound(_) | AssemblyError::AddressNotFound { .. } => false,
            AssemblyError::DetailNotFound(_)
            | AssemblyError::Records(_)
            | AssemblyError::Geocode(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(!AssemblyError::HouseNotFound(1).is_retryable());
        assert!(!AssemblyError::AddressNotFound {
            house_id: 1,
            level: AddressLevel::Region,
            en_name: "cy".to_string(),
        }
        .is_retryable());
        assert!(AssemblyError::DetailNotFound(1).is_retryable());
        assert!(AssemblyError::Geocode(GeoError::Unavailable("down".to_string())).is_retryable());
    }

    #[test]
    fn test_address_error_message_names_level() {
        let err = AssemblyError::AddressNotFound {
            house_id: 42,
            level: AddressLevel::City,
            en_name: "bj".to_string(),
        };
        assert_eq!(err.to_string(), "No city reference data for 'bj' (house 42)");
    }
}
