//! Orchestrator module for the house indexer.
//!
//! Coordinates the consumer and the retry dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{MessageOffset, StreamMessage};
use crate::dispatcher::{DispatchOutcome, RetryDispatcher};
use crate::errors::IngestError;

/// Source of operation messages.
///
/// `run` sends [`StreamMessage::Operation`]s on `sender`, receives an
/// [`StreamMessage::Acknowledgment`] for each on `ack_receiver` and stops on `shutdown`.
#[async_trait]
pub trait Consumer: Send + Sync {
    fn subscribe(&self) -> Result<(), IngestError>;

    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        ack_receiver: mpsc::Receiver<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError>;
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the message channel buffer.
    pub channel_buffer_size: usize,
    /// How often progress is logged.
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 16,
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Running totals since startup.
#[derive(Debug, Default)]
pub struct IngestCounters {
    pub received: AtomicU64,
    pub indexed: AtomicU64,
    pub removed: AtomicU64,
    pub requeued: AtomicU64,
    pub discarded: AtomicU64,
    pub exhausted: AtomicU64,
}

impl IngestCounters {
    fn record(&self, outcome: &DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Indexed => &self.indexed,
            DispatchOutcome::Removed => &self.removed,
            DispatchOutcome::Requeued(_) => &self.requeued,
            DispatchOutcome::Discarded => &self.discarded,
            DispatchOutcome::Exhausted => &self.exhausted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// Orchestrator that coordinates the ingest components.
pub struct Orchestrator {
    consumer: Arc<dyn Consumer>,
    dispatcher: RetryDispatcher,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    counters: Arc<IngestCounters>,
}

impl Orchestrator {
    pub fn new(consumer: Arc<dyn Consumer>, dispatcher: RetryDispatcher) -> Self {
        Self::with_config(consumer, dispatcher, OrchestratorConfig::default())
    }

    pub fn with_config(
        consumer: Arc<dyn Consumer>,
        dispatcher: RetryDispatcher,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            consumer,
            dispatcher,
            config,
            shutdown_tx,
            counters: Arc::new(IngestCounters::default()),
        }
    }

    /// Shared handle on the running totals.
    pub fn counters(&self) -> Arc<IngestCounters> {
        Arc::clone(&self.counters)
    }

    /// A sender that stops the orchestrator when signalled.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the orchestrator until the consumer ends or a shutdown signal arrives.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), IngestError> {
        info!("Starting house indexer orchestrator");

        self.consumer.subscribe()?;

        let (event_transmitter, mut event_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);
        let (ack_transmitter, ack_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);

        let consumer = Arc::clone(&self.consumer);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let consumer_handle = tokio::spawn(async move {
            if let Err(e) = consumer
                .run(event_transmitter, ack_receiver, shutdown_rx)
                .await
            {
                error!(error = %e, "Consumer error");
            }
        });

        info!("Ready to process index operations");

        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                msg = event_receiver.recv() => {
                    match msg {
                        Some(StreamMessage::Operation { payload, offset }) => {
                            let ack = self.process(&payload, offset).await;
                            if ack_transmitter.send(ack).await.is_err() {
                                warn!("Consumer stopped listening for acknowledgments");
                            }
                        }
                        Some(StreamMessage::Error(e)) => {
                            error!(error = %e, "Received error from consumer");
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Consumer stream ended");
                            break;
                        }
                        Some(StreamMessage::Acknowledgment { .. }) => {
                            warn!("Received acknowledgment on event channel (should be on ack channel)");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
                _ = progress_timer.tick() => {
                    self.log_progress();
                }
            }
        }

        drop(ack_transmitter);
        let _ = consumer_handle.await;

        self.log_progress();
        info!("Orchestrator shutdown complete");
        Ok(())
    }

    /// Dispatch one payload and build the acknowledgment for it.
    async fn process(&self, payload: &[u8], offset: MessageOffset) -> StreamMessage {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        match self.dispatcher.dispatch(payload).await {
            Ok(outcome) => {
                debug!(outcome = ?outcome, offset = offset.offset, "Operation handled");
                self.counters.record(&outcome);
                StreamMessage::Acknowledgment {
                    offset,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to handle operation. Sending NACK to broker");
                StreamMessage::Acknowledgment {
                    offset,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn log_progress(&self) {
        let counters = &self.counters;
        info!(
            received = IngestCounters::get(&counters.received),
            indexed = IngestCounters::get(&counters.indexed),
            removed = IngestCounters::get(&counters.removed),
            requeued = IngestCounters::get(&counters.requeued),
            discarded = IngestCounters::get(&counters.discarded),
            exhausted = IngestCounters::get(&counters.exhausted),
            "Processing progress"
        );
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
