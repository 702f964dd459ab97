//! OpenSearch implementation of the search index provider.

mod index_config;
mod provider;

pub use index_config::{
    get_index_settings, get_versioned_index_name, IndexConfig, DEFAULT_ANALYZER, INDEX_NAME,
};
pub use provider::OpenSearchProvider;
