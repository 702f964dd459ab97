//! Loader module for the house indexer.
//!
//! Writes assembled documents into the search index and keeps the LBS store in step.
//!
//! There is no lock around a house: the lookup-then-write sequence in
//! [`IndexReconciler::index_sync`] can race with a concurrent sync of the same house and
//! leave a duplicate behind. The next sync sees more than one hit and collapses them.
//! Replicas that still return a just-deleted copy can make that collapse race as well.

pub mod suggest;

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::IngestError;
use house_geocoder::{GeoService, LbsRecord};
use house_search_repository::{query, SearchIndexProvider, SearchResponse};
use house_search_shared::HouseDocument;

/// How the search document was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentWrite {
    /// No document existed; one was created.
    Created,
    /// One document existed and was updated in place.
    Updated { doc_id: String },
    /// Several documents existed; each was deleted and the document rewritten.
    Replaced { duplicates: usize },
}

/// Synchronizes houses into the search index and the LBS store.
pub struct IndexReconciler {
    provider: Arc<dyn SearchIndexProvider>,
    geo: Arc<dyn GeoService>,
}

impl IndexReconciler {
    pub fn new(provider: Arc<dyn SearchIndexProvider>, geo: Arc<dyn GeoService>) -> Self {
        Self { provider, geo }
    }

    /// Write a house document and upload its LBS point.
    ///
    /// Succeeds only when both the document write and the LBS upload succeed. A failure to
    /// derive suggestions aborts before anything is written.
    #[instrument(skip(self, document, lbs), fields(house_id = document.house_id))]
    pub async fn index_sync(
        &self,
        mut document: HouseDocument,
        lbs: &LbsRecord,
    ) -> Result<DocumentWrite, IngestError> {
        document.suggest = suggest::derive_suggestions(self.provider.as_ref(), &document)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to derive suggestions");
                IngestError::loader(format!("Suggest derivation failed: {}", e))
            })?;

        let write = self.write_document(&document).await;
        if let Err(e) = &write {
            error!(error = %e, "Failed to write search document");
        }

        let upload = self.geo.upload(lbs).await;
        if let Err(e) = &upload {
            error!(error = %e, "Failed to upload LBS point");
        }

        let write = write?;
        upload.map_err(|e| IngestError::loader(format!("LBS upload failed: {}", e)))?;

        info!(write = ?write, "Indexed house");
        Ok(write)
    }

    /// Create, update or de-duplicate depending on how many documents the house has.
    async fn write_document(&self, document: &HouseDocument) -> Result<DocumentWrite, IngestError> {
        let raw = self
            .provider
            .search(&query::house_lookup(document.house_id))
            .await
            .map_err(|e| IngestError::loader(format!("Lookup failed: {}", e)))?;
        let existing = SearchResponse::from_value(raw)
            .map_err(|e| IngestError::loader(format!("Lookup failed: {}", e)))?
            .document_ids();

        match existing.as_slice() {
            [] => {
                self.provider.create_document(document).await.map_err(|e| {
                    if e.is_conflict() {
                        warn!("Document appeared between lookup and create");
                    }
                    IngestError::loader(e.to_string())
                })?;
                Ok(DocumentWrite::Created)
            }
            [doc_id] => {
                self.provider
                    .update_document(doc_id, document)
                    .await
                    .map_err(|e| IngestError::loader(e.to_string()))?;
                Ok(DocumentWrite::Updated {
                    doc_id: doc_id.clone(),
                })
            }
            duplicates => {
                warn!(
                    duplicate_count = duplicates.len(),
                    "House has duplicate documents, replacing them"
                );
                for doc_id in duplicates {
                    self.replace_duplicate(doc_id, document).await?;
                }
                Ok(DocumentWrite::Replaced {
                    duplicates: duplicates.len(),
                })
            }
        }
    }

    async fn replace_duplicate(
        &self,
        doc_id: &str,
        document: &HouseDocument,
    ) -> Result<(), IngestError> {
        let outcome = self
            .provider
            .delete_document(doc_id)
            .await
            .map_err(|e| IngestError::loader(format!("Delete of duplicate {} failed: {}", doc_id, e)))?;
        if !outcome.is_acknowledged() {
            return Err(IngestError::loader(format!(
                "Delete of duplicate {} reached no shard",
                doc_id
            )));
        }

        debug!(doc_id = %doc_id, "Deleted duplicate document");
        self.provider
            .index_document(document)
            .await
            .map_err(|e| IngestError::loader(e.to_string()))
    }

    /// Delete a house document and its LBS point concurrently.
    #[instrument(skip(self))]
    pub async fn remove_sync(&self, house_id: i64) -> Result<(), IngestError> {
        let doc_id = house_id.to_string();
        let (deleted, removed) = tokio::join!(
            self.provider.delete_document(&doc_id),
            self.geo.remove(house_id)
        );

        let deleted = match deleted {
            Ok(outcome) if outcome.is_acknowledged() => Ok(()),
            Ok(_) => Err(IngestError::loader("Delete reached no shard")),
            Err(e) => Err(IngestError::loader(format!("Delete failed: {}", e))),
        };
        if let Err(e) = &deleted {
            error!(error = %e, "Failed to delete search document");
        }
        if let Err(e) = &removed {
            error!(error = %e, "Failed to remove LBS point");
        }

        deleted?;
        removed.map_err(|e| IngestError::loader(format!("LBS removal failed: {}", e)))?;

        info!("Removed house");
        Ok(())
    }
}
