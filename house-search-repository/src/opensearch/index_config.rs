//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the house search index.

use serde_json::{json, Value};

/// Analyzer used for full-text fields and suggest derivation when none is configured.
pub const DEFAULT_ANALYZER: &str = "ik_smart";

/// Configuration for the search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias name for the search index (used for all operations).
    pub alias: String,
    /// The version number for the index (e.g., 0 for "houses_v0").
    pub version: u32,
    /// Analyzer applied to text fields and used by the analyze API.
    pub analyzer: String,
}

impl IndexConfig {
    /// Create a new index configuration with the default analyzer.
    ///
    /// # Arguments
    ///
    /// * `alias` - The index alias name
    /// * `version` - The version number
    pub fn new(alias: impl Into<String>, version: u32) -> Self {
        Self {
            alias: alias.into(),
            version,
            analyzer: DEFAULT_ANALYZER.to_string(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = analyzer.into();
        self
    }

    /// The concrete index the alias points to.
    pub fn versioned_index_name(&self) -> String {
        get_versioned_index_name(Some(self.version))
    }
}

/// The base name of the search index (without version).
pub const INDEX_NAME: &str = "houses";

/// Get the versioned index name.
///
/// # Arguments
///
/// * `version` - The version number (defaults to 0 if None)
///
/// # Returns
///
/// The versioned index name (e.g., "houses_v0")
pub fn get_versioned_index_name(version: Option<u32>) -> String {
    let v = version.unwrap_or(0);
    format!("{}_v{}", INDEX_NAME, v)
}

/// Get the index settings and mappings for the house search index.
///
/// The configuration includes:
/// - **keyword** fields for the codes used by equality filters and aggregations
/// - **text** fields analyzed with `analyzer` for keyword relevance
/// - **geo_point** `location` for bounding-box queries
/// - **completion** `suggest` for autocomplete
///
/// # Sharding Configuration
///
/// - 1 primary shard
/// - 1 replica for redundancy
pub fn get_index_settings(analyzer: &str) -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "house_id": { "type": "long" },
                "title": { "type": "text", "analyzer": analyzer, "search_analyzer": analyzer },
                "price": { "type": "integer" },
                "area": { "type": "integer" },
                "create_time": { "type": "date" },
                "last_update_time": { "type": "date" },
                "city_en_name": { "type": "keyword" },
                "region_en_name": { "type": "keyword" },
                "direction": { "type": "integer" },
                "distance_to_subway": { "type": "integer" },
                "subway_line_name": { "type": "keyword" },
                "subway_station_name": { "type": "keyword" },
                "tags": { "type": "keyword" },
                "street": { "type": "keyword" },
                "district": { "type": "keyword" },
                "description": { "type": "text", "analyzer": analyzer, "search_analyzer": analyzer },
                "layout_desc": { "type": "text", "analyzer": analyzer, "search_analyzer": analyzer },
                "traffic": { "type": "text", "analyzer": analyzer, "search_analyzer": analyzer },
                "round_service": { "type": "text", "analyzer": analyzer, "search_analyzer": analyzer },
                "rent_way": { "type": "integer" },
                "location": { "type": "geo_point" },
                "suggest": { "type": "completion" }
            }
        }
    })
}
