//! Dependency initialization and wiring for the house indexer.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::KafkaConnection;
use crate::consumer::KafkaConsumer;
use crate::dispatcher::RetryDispatcher;
use crate::loader::IndexReconciler;
use crate::orchestrator::Orchestrator;
use crate::processor::DocumentAssembler;
use crate::producer::{KafkaOperationPublisher, ProducerConfig};
use crate::IndexingError;
use house_geocoder::{BaiduMapClient, BaiduMapConfig};
use house_record_repository::PostgresHouseRecordRepository;
use house_search_repository::opensearch::{IndexConfig, DEFAULT_ANALYZER, INDEX_NAME};
use house_search_repository::{OpenSearchProvider, SearchIndexProvider};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "house-indexer";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_GEO_HTTP_TIMEOUT_SECS: u64 = 10;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection on an interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode. Valid values are "fail-fast" and "retry" (case-insensitive);
    /// anything else falls back to retry.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = %value, "Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }

    fn from_env() -> Self {
        Self::parse(&env::var("OPENSEARCH_CONNECTION_MODE").unwrap_or_else(|_| "retry".to_string()))
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn required_env(name: &str) -> Result<String, IndexingError> {
    env::var(name).map_err(|_| IndexingError::config(format!("{} must be set", name)))
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_ALIAS`: Index alias name (default: "houses")
    /// - `HOUSES_INDEX_VERSION`: Index version number (default: 0)
    /// - `SEARCH_ANALYZER`: Analyzer for text fields and suggestions (default: ik_smart)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group ID (default: house-indexer)
    /// - `KAFKA_USERNAME` / `KAFKA_PASSWORD` / `KAFKA_SSL_CA_PEM`: optional SASL/SSL
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
    /// - `BAIDU_MAP_AK`: Map API key (required)
    /// - `BAIDU_GEOTABLE_ID`: LBS table id (required)
    /// - `BAIDU_GEOCODE_URL` / `BAIDU_LBS_BASE_URL`: endpoint overrides (optional)
    /// - `GEO_HTTP_TIMEOUT_SECS`: Map API request timeout (default: 10)
    pub async fn new() -> Result<Self, IndexingError> {
        let opensearch_url = env_or("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL);
        let kafka = KafkaConnection::from_env(DEFAULT_KAFKA_BROKER);
        let kafka_group_id = env_or("KAFKA_GROUP_ID", DEFAULT_KAFKA_GROUP_ID);
        let connection_mode = ConnectionMode::from_env();
        let retry_interval =
            env_parse_or("OPENSEARCH_RETRY_INTERVAL_SECS", DEFAULT_RETRY_INTERVAL_SECS);

        info!(
            opensearch_url = %opensearch_url,
            kafka_broker = %kafka.broker,
            kafka_sasl = kafka.is_authenticated(),
            kafka_group_id = %kafka_group_id,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            "Initializing dependencies"
        );

        let index_config = IndexConfig::new(
            env_or("INDEX_ALIAS", INDEX_NAME),
            env_parse_or("HOUSES_INDEX_VERSION", 0u32),
        )
        .with_analyzer(env_or("SEARCH_ANALYZER", DEFAULT_ANALYZER));

        let search_provider = Self::connect_to_opensearch(
            &opensearch_url,
            index_config,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");

        // Exits if the index and alias cannot be created
        search_provider
            .ensure_index_exists()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure index exists: {}", e)))?;
        let search_provider: Arc<dyn SearchIndexProvider> = Arc::new(search_provider);

        let records = PostgresHouseRecordRepository::connect(
            &required_env("DATABASE_URL")?,
            env_parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS),
        )
        .await
        .map_err(|e| IndexingError::config(format!("Failed to connect to database: {}", e)))?;

        let mut map_config =
            BaiduMapConfig::new(required_env("BAIDU_MAP_AK")?, required_env("BAIDU_GEOTABLE_ID")?)
                .with_timeout(Duration::from_secs(env_parse_or(
                    "GEO_HTTP_TIMEOUT_SECS",
                    DEFAULT_GEO_HTTP_TIMEOUT_SECS,
                )));
        if let Ok(url) = env::var("BAIDU_GEOCODE_URL") {
            map_config = map_config.with_geocode_url(url);
        }
        if let Ok(url) = env::var("BAIDU_LBS_BASE_URL") {
            map_config = map_config.with_lbs_base_url(url);
        }
        let geo = Arc::new(
            BaiduMapClient::new(map_config)
                .map_err(|e| IndexingError::config(format!("Failed to create map client: {}", e)))?,
        );

        let consumer = KafkaConsumer::new(&kafka, &kafka_group_id).map_err(|e| {
            IndexingError::config(format!("Failed to create Kafka consumer: {}", e))
        })?;
        let publisher = KafkaOperationPublisher::new(&ProducerConfig::new(kafka, "house-indexer"))
            .map_err(|e| IndexingError::config(format!("Failed to create Kafka producer: {}", e)))?;

        info!("Kafka consumer and producer created");

        let dispatcher = RetryDispatcher::new(
            DocumentAssembler::new(Arc::new(records), geo.clone()),
            IndexReconciler::new(search_provider, geo),
            Arc::new(publisher),
        );
        let orchestrator = Orchestrator::new(Arc::new(consumer), dispatcher);

        Ok(Self { orchestrator })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        loop {
            match OpenSearchProvider::new(url, index_config.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_mode_parsing() {
        assert_eq!(ConnectionMode::parse("fail-fast"), ConnectionMode::FailFast);
        assert_eq!(ConnectionMode::parse("FAIL_FAST"), ConnectionMode::FailFast);
        assert_eq!(ConnectionMode::parse("retry"), ConnectionMode::Retry);
        assert_eq!(ConnectionMode::parse("sometimes"), ConnectionMode::Retry);
    }
}
