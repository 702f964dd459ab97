//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesAnalyzeParts, IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    CreateParts, DeleteParts, IndexParts, OpenSearch, SearchParts, UpdateParts,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::types::{AnalyzedToken, DeleteOutcome};
use house_search_shared::HouseDocument;

/// OpenSearch provider implementation.
///
/// All document operations go through the configured alias. Writes use
/// `refresh=wait_for` so that the next lookup by house id sees them.
///
/// # Example
///
/// ```ignore
/// use house_search_repository::opensearch::IndexConfig;
///
/// let config = IndexConfig::new("houses", 0);
/// let provider = OpenSearchProvider::new("http://localhost:9200", config).await?;
/// provider.ensure_index_exists().await?;
/// provider.create_document(&document).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

#[derive(Deserialize)]
struct ShardsInfo {
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct DeleteResponseBody {
    #[serde(rename = "_shards")]
    shards: Option<ShardsInfo>,
    #[serde(default)]
    result: String,
}

#[derive(Deserialize)]
struct AnalyzeResponseBody {
    #[serde(default)]
    tokens: Vec<AnalyzedToken>,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing alias, version and analyzer
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            version = index_config.version,
            analyzer = %index_config.analyzer,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Read the body of a failed response for logging and error messages.
    async fn failure_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    /// Create the versioned index with its mappings and attach the alias, unless the
    /// alias already resolves to an index.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let alias = self.index_config.alias.as_str();

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(alias = %alias, "Search index already exists");
            return Ok(());
        }

        let index_name = self.index_config.versioned_index_name();
        let mut body = get_index_settings(&self.index_config.analyzer);
        body["aliases"] = json!({ alias: {} });

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&index_name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, index = %index_name, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Creating {} failed with status {}: {}",
                index_name, status, error_body
            )));
        }

        info!(index = %index_name, alias = %alias, "Created search index");
        Ok(())
    }

    async fn create_document(&self, document: &HouseDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();

        let response = self
            .client
            .create(CreateParts::IndexId(&self.index_config.alias, &doc_id))
            .refresh(Refresh::WaitFor)
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::create(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 409 {
            return Err(SearchIndexError::conflict(doc_id));
        }
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Create request failed");
            return Err(SearchIndexError::create(format!(
                "Create failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document created");
        Ok(())
    }

    async fn index_document(&self, document: &HouseDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.alias, &doc_id))
            .refresh(Refresh::WaitFor)
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    async fn update_document(
        &self,
        doc_id: &str,
        document: &HouseDocument,
    ) -> Result<(), SearchIndexError> {
        let doc = document
            .update_fields()
            .map_err(|e| SearchIndexError::serialization(e.to_string()))?;

        // An unchanged document comes back as `"result": "noop"` with a success status.
        let response = self
            .client
            .update(UpdateParts::IndexId(&self.index_config.alias, doc_id))
            .refresh(Refresh::WaitFor)
            .body(json!({ "doc": doc }))
            .send()
            .await
            .map_err(|e| SearchIndexError::update(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Update request failed");
            return Err(SearchIndexError::update(format!(
                "Update failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document updated");
        Ok(())
    }

    async fn delete_document(&self, doc_id: &str) -> Result<DeleteOutcome, SearchIndexError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.alias, doc_id))
            .refresh(Refresh::WaitFor)
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - the body still reports the shards the delete reached
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        let body: DeleteResponseBody = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let outcome = DeleteOutcome {
            shards_total: body.shards.map(|s| s.total).unwrap_or(0),
            found: body.result == "deleted",
        };

        debug!(
            doc_id = %doc_id,
            shards_total = outcome.shards_total,
            found = outcome.found,
            "Document deleted"
        );
        Ok(outcome)
    }

    async fn analyze(&self, texts: &[String]) -> Result<Vec<AnalyzedToken>, SearchIndexError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .indices()
            .analyze(IndicesAnalyzeParts::Index(&self.index_config.alias))
            .body(json!({
                "analyzer": self.index_config.analyzer,
                "text": texts
            }))
            .send()
            .await
            .map_err(|e| SearchIndexError::analyze(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Analyze request failed");
            return Err(SearchIndexError::analyze(format!(
                "Analyze failed with status {}: {}",
                status, error_body
            )));
        }

        let body: AnalyzeResponseBody = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(body.tokens)
    }

    async fn search(&self, body: &Value) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index_config.alias.as_str()]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::search(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            return Err(SearchIndexError::search(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))
    }
}
