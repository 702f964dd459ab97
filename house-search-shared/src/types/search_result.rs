//! Search result types for the read side.

use serde::{Deserialize, Serialize};

/// One page of results together with the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultPage<T> {
    /// Total number of matching documents.
    /// May be greater than the number of returned results due to pagination.
    pub total: u64,
    pub results: Vec<T>,
}

impl<T> SearchResultPage<T> {
    pub fn new(total: u64, results: Vec<T>) -> Self {
        Self { total, results }
    }

    /// The result returned when the backend could not answer.
    pub fn empty() -> Self {
        Self {
            total: 0,
            results: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T> Default for SearchResultPage<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A terms-aggregation bucket: a region or district code and its house count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HouseBucket {
    pub key: String,
    pub count: u64,
}

impl HouseBucket {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}
