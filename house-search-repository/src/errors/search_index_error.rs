use thiserror::Error;

/// Errors from the search backend and from decoding its responses.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Failed to establish connection to the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create a document.
    #[error("Create error: {0}")]
    CreateError(String),

    /// A conditional create found the document already present.
    #[error("Document already exists: {0}")]
    Conflict(String),

    /// Failed to index (overwrite) a document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Failed to update a document.
    #[error("Update error: {0}")]
    UpdateError(String),

    /// Failed to delete a document.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Failed to run text analysis.
    #[error("Analyze error: {0}")]
    AnalyzeError(String),

    /// Search request failed or returned a non-success status.
    #[error("Search error: {0}")]
    SearchError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search index backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchIndexError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    pub fn create(msg: impl Into<String>) -> Self {
        Self::CreateError(msg.into())
    }

    /// The document a conditional create targeted is already present.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    pub fn update(msg: impl Into<String>) -> Self {
        Self::UpdateError(msg.into())
    }

    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    pub fn analyze(msg: impl Into<String>) -> Self {
        Self::AnalyzeError(msg.into())
    }

    pub fn search(msg: impl Into<String>) -> Self {
        Self::SearchError(msg.into())
    }

    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Whether a conditional create lost to an existing document.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_distinguishable() {
        assert!(SearchIndexError::conflict("42").is_conflict());
        assert!(!SearchIndexError::create("42").is_conflict());
        assert_eq!(
            SearchIndexError::conflict("42").to_string(),
            "Document already exists: 42"
        );
    }
}
