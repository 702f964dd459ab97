//! Retry dispatcher.
//!
//! Decodes one operation payload, routes it to index or remove handling and re-enqueues
//! it with a bumped retry counter when it did not durably succeed.
//!
//! # Outcomes
//!
//! | Input                                  | Result                      |
//! |----------------------------------------|-----------------------------|
//! | malformed payload                      | logged, `Discarded`         |
//! | unknown operation                      | warned, `Discarded`         |
//! | `retry > MAX_RETRY`                    | fatal log, `Exhausted`      |
//! | missing house / reference data         | logged, `Discarded`         |
//! | transient failure, retry below ceiling | `Requeued(next)`            |
//! | transient failure at the ceiling       | fatal log, `Exhausted`      |
//!
//! Only a failure to publish the re-enqueued operation is returned as an error.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::errors::IngestError;
use crate::loader::IndexReconciler;
use crate::processor::DocumentAssembler;
use crate::producer::OperationPublisher;
use house_search_shared::{DecodedMessage, IndexOperation, OperationKind, MAX_RETRY};

/// What happened to one operation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Indexed,
    Removed,
    /// Failed and published again with the contained retry count.
    Requeued(IndexOperation),
    /// Dropped without retry.
    Discarded,
    /// Past the retry ceiling; the house stays out of sync.
    Exhausted,
}

pub struct RetryDispatcher {
    assembler: DocumentAssembler,
    reconciler: IndexReconciler,
    publisher: Arc<dyn OperationPublisher>,
}

impl RetryDispatcher {
    pub fn new(
        assembler: DocumentAssembler,
        reconciler: IndexReconciler,
        publisher: Arc<dyn OperationPublisher>,
    ) -> Self {
        Self {
            assembler,
            reconciler,
            publisher,
        }
    }

    /// Handle one raw message payload.
    pub async fn dispatch(&self, payload: &[u8]) -> Result<DispatchOutcome, IngestError> {
        match IndexOperation::decode(payload) {
            Ok(DecodedMessage::Operation(operation)) => self.handle(operation).await,
            Ok(DecodedMessage::Unsupported {
                house_id,
                operation,
            }) => {
                warn!(house_id = house_id, operation = %operation, "Unsupported operation, discarding");
                Ok(DispatchOutcome::Discarded)
            }
            Err(e) => {
                error!(error = %e, "Undecodable operation message, discarding");
                Ok(DispatchOutcome::Discarded)
            }
        }
    }

    #[instrument(skip(self), fields(house_id = operation.house_id, kind = ?operation.kind, retry = operation.retry))]
    async fn handle(&self, operation: IndexOperation) -> Result<DispatchOutcome, IngestError> {
        if operation.is_exhausted() {
            error!(
                max_retry = MAX_RETRY,
                "Retry ceiling exceeded, house left out of sync"
            );
            return Ok(DispatchOutcome::Exhausted);
        }

        match operation.kind {
            OperationKind::Index => self.index(operation).await,
            OperationKind::Remove => match self.reconciler.remove_sync(operation.house_id).await {
                Ok(()) => Ok(DispatchOutcome::Removed),
                Err(_) => self.requeue(operation).await,
            },
        }
    }

    async fn index(&self, operation: IndexOperation) -> Result<DispatchOutcome, IngestError> {
        let house = match self.assembler.assemble(operation.house_id).await {
            Ok(house) => house,
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "Assembly failed, will retry");
                return self.requeue(operation).await;
            }
            Err(e) => {
                error!(error = %e, "Cannot assemble house, discarding");
                return Ok(DispatchOutcome::Discarded);
            }
        };

        match self.reconciler.index_sync(house.document, &house.lbs).await {
            Ok(_) => Ok(DispatchOutcome::Indexed),
            Err(_) => self.requeue(operation).await,
        }
    }

    async fn requeue(&self, operation: IndexOperation) -> Result<DispatchOutcome, IngestError> {
        let next = operation.next_attempt();
        if next.is_exhausted() {
            error!(
                max_retry = MAX_RETRY,
                "Retries used up, house left out of sync"
            );
            return Ok(DispatchOutcome::Exhausted);
        }

        self.publisher.publish(&next).await?;
        info!(next_retry = next.retry, "Re-enqueued operation");
        Ok(DispatchOutcome::Requeued(next))
    }
}
