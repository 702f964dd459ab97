//! Kafka connection settings shared by the consumer and the publisher.

use std::env;

use rdkafka::config::ClientConfig;

/// Broker address and optional SASL credentials.
#[derive(Debug, Clone)]
pub struct KafkaConnection {
    /// Kafka broker address (e.g., "localhost:9092")
    pub broker: String,
    /// SASL username (enables SASL/SSL if set)
    pub username: Option<String>,
    /// SASL password (required if username is set)
    pub password: Option<String>,
    /// Custom CA certificate in PEM format
    pub ssl_ca_pem: Option<String>,
}

impl KafkaConnection {
    /// Plaintext connection to a broker.
    pub fn new(broker: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            username: None,
            password: None,
            ssl_ca_pem: None,
        }
    }

    /// Read the connection from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KAFKA_BROKER` - Broker address (uses provided default if not set)
    /// - `KAFKA_USERNAME` - SASL username (optional)
    /// - `KAFKA_PASSWORD` - SASL password (optional)
    /// - `KAFKA_SSL_CA_PEM` - Custom CA cert in PEM format (optional)
    pub fn from_env(default_broker: &str) -> Self {
        Self {
            broker: env::var("KAFKA_BROKER").unwrap_or_else(|_| default_broker.to_string()),
            username: env::var("KAFKA_USERNAME").ok(),
            password: env::var("KAFKA_PASSWORD").ok(),
            ssl_ca_pem: env::var("KAFKA_SSL_CA_PEM").ok(),
        }
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    /// Whether SASL/SSL will be used.
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Base client configuration: bootstrap servers plus security settings.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.broker);

        // Managed clusters need SASL/SSL; local development runs plaintext
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanisms", "PLAIN")
                .set("sasl.username", username)
                .set("sasl.password", password);

            if let Some(ca_pem) = &self.ssl_ca_pem {
                config.set("ssl.ca.pem", ca_pem);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_connection() {
        let config = KafkaConnection::new("localhost:9092").client_config();

        assert_eq!(config.get("bootstrap.servers"), Some("localhost:9092"));
        assert_eq!(config.get("security.protocol"), None);
    }

    #[test]
    fn test_credentials_enable_sasl() {
        let connection = KafkaConnection::new("broker:9096")
            .with_credentials("indexer".to_string(), "secret".to_string());
        let config = connection.client_config();

        assert!(connection.is_authenticated());
        assert_eq!(config.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(config.get("sasl.username"), Some("indexer"));
        assert_eq!(config.get("ssl.ca.pem"), None);
    }
}
