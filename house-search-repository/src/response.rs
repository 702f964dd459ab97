//! Search response decoding.
//!
//! Turns the raw response body of a search request into hit ids, house ids,
//! aggregation buckets and suggestion texts.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::errors::SearchIndexError;
use house_search_shared::HouseBucket;

/// `hits.total` is a bare number on older engines and `{ "value": n }` on newer ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl Default for TotalHits {
    fn default() -> Self {
        TotalHits::Count(0)
    }
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Count(n) => *n,
            TotalHits::Object { value } => *value,
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

impl SearchHit {
    /// The house id stored in the hit's source, falling back to a numeric document id.
    pub fn house_id(&self) -> Option<i64> {
        self.source
            .as_ref()
            .and_then(|source| source.get("house_id"))
            .and_then(Value::as_i64)
            .or_else(|| self.id.parse().ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Hits {
    #[serde(default)]
    total: TotalHits,
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
struct TermsBucket {
    key: Value,
    #[serde(default)]
    doc_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TermsAggregation {
    #[serde(default)]
    buckets: Vec<TermsBucket>,
}

#[derive(Debug, Clone, Deserialize)]
struct SuggestOption {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SuggestEntry {
    #[serde(default)]
    options: Vec<SuggestOption>,
}

/// Decoded search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    hits: Hits,
    #[serde(default)]
    aggregations: HashMap<String, TermsAggregation>,
    #[serde(default)]
    suggest: HashMap<String, Vec<SuggestEntry>>,
}

fn bucket_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl SearchResponse {
    /// Decode a raw response body.
    pub fn from_value(value: Value) -> Result<Self, SearchIndexError> {
        serde_json::from_value(value).map_err(|e| SearchIndexError::parse(e.to_string()))
    }

    pub fn total(&self) -> u64 {
        self.hits.total.value()
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits.hits
    }

    /// Document ids of the returned hits, in order.
    pub fn document_ids(&self) -> Vec<String> {
        self.hits.hits.iter().map(|hit| hit.id.clone()).collect()
    }

    /// House ids of the returned hits, in order. Hits without a house id are skipped.
    pub fn house_ids(&self) -> Vec<i64> {
        self.hits.hits.iter().filter_map(SearchHit::house_id).collect()
    }

    /// Buckets of a terms aggregation. A missing aggregation yields no buckets.
    pub fn buckets(&self, aggregation: &str) -> Vec<HouseBucket> {
        self.aggregations
            .get(aggregation)
            .map(|agg| {
                agg.buckets
                    .iter()
                    .map(|bucket| HouseBucket::new(bucket_key(&bucket.key), bucket.doc_count))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Suggestion texts of a named suggester, de-duplicated and capped at `limit`.
    ///
    /// First-seen order is kept.
    pub fn suggestions(&self, name: &str, limit: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        self.suggest
            .get(name)
            .into_iter()
            .flatten()
            .flat_map(|entry| entry.options.iter())
            .filter(|option| seen.insert(option.text.clone()))
            .take(limit)
            .map(|option| option.text.clone())
            .collect()
    }
}
