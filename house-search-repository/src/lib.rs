//! # House Search Repository
//!
//! This crate provides traits and implementations for interacting with the house
//! search index. It includes definitions for errors, the provider interface, a
//! concrete implementation for OpenSearch, query DSL construction and the read-side
//! [`HouseSearchService`].

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod query;
pub mod response;
pub mod service;
pub mod types;

pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::{IndexConfig, OpenSearchProvider};
pub use response::SearchResponse;
pub use service::HouseSearchService;
pub use types::{AnalyzedToken, DeleteOutcome};
