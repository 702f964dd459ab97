//! Integration tests for the house indexer orchestrator.
//!
//! These tests use the real Orchestrator and dispatcher with an in-memory consumer,
//! search index, record store, geo service and publisher.

mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use common::{house, payload, seed_house, Pipeline};
use house_indexer::consumer::{AckAction, MessageOffset, StreamMessage};
use house_indexer::errors::IngestError;
use house_indexer::orchestrator::{Consumer, Orchestrator, OrchestratorConfig};
use house_search_shared::IndexOperation;

/// Consumer that replays fixed payloads and records the acknowledgments it gets back.
struct MockConsumer {
    payloads: Vec<Vec<u8>>,
    end_after_replay: bool,
    error_on_subscribe: bool,
    acks: Arc<Mutex<Vec<(i64, bool)>>>,
}

impl MockConsumer {
    fn new(payloads: Vec<Vec<u8>>) -> Self {
        Self {
            payloads,
            end_after_replay: true,
            error_on_subscribe: false,
            acks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn until_shutdown(payloads: Vec<Vec<u8>>) -> Self {
        Self {
            end_after_replay: false,
            ..Self::new(payloads)
        }
    }

    fn with_subscribe_error() -> Self {
        Self {
            error_on_subscribe: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait::async_trait]
impl Consumer for MockConsumer {
    fn subscribe(&self) -> Result<(), IngestError> {
        if self.error_on_subscribe {
            Err(IngestError::kafka("Mock subscribe error"))
        } else {
            Ok(())
        }
    }

    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        for (offset, payload) in self.payloads.iter().enumerate() {
            let message = StreamMessage::Operation {
                payload: payload.clone(),
                offset: MessageOffset::new("house_build", 0, offset as i64),
            };
            if sender.send(message).await.is_err() {
                return Ok(());
            }
        }

        if self.end_after_replay {
            let _ = sender.send(StreamMessage::End).await;
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                ack = ack_receiver.recv() => match ack {
                    Some(StreamMessage::Acknowledgment { offset, success, .. }) => {
                        self.acks.lock().unwrap().push((offset.offset, success));
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        }

        Ok(())
    }
}

/// Consumer over a single-partition log that moves its position the way the Kafka consumer
/// does: one message in flight, commit on success, rewind on failure.
struct PartitionConsumer {
    log: Vec<Vec<u8>>,
    deliveries: Arc<Mutex<Vec<(i64, bool)>>>,
    committed: Arc<Mutex<Vec<i64>>>,
}

impl PartitionConsumer {
    fn new(log: Vec<Vec<u8>>) -> Self {
        Self {
            log,
            deliveries: Arc::new(Mutex::new(Vec::new())),
            committed: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait::async_trait]
impl Consumer for PartitionConsumer {
    fn subscribe(&self) -> Result<(), IngestError> {
        Ok(())
    }

    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        _shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        let mut position = 0usize;
        while position < self.log.len() {
            let offset = MessageOffset::new("house_build", 0, position as i64);
            let message = StreamMessage::Operation {
                payload: self.log[position].clone(),
                offset: offset.clone(),
            };
            if sender.send(message).await.is_err() {
                return Ok(());
            }

            let Some(StreamMessage::Acknowledgment { success, .. }) = ack_receiver.recv().await
            else {
                return Ok(());
            };
            self.deliveries.lock().unwrap().push((offset.offset, success));

            match AckAction::for_ack(&offset, success) {
                AckAction::Commit { next } => {
                    self.committed.lock().unwrap().push(next);
                    position = next as usize;
                }
                AckAction::Rewind { to } => position = to as usize,
            }
        }

        let _ = sender.send(StreamMessage::End).await;
        Ok(())
    }
}

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        channel_buffer_size: 8,
        progress_interval: Duration::from_secs(60),
    }
}

#[tokio::test]
async fn test_orchestrator_indexes_and_removes() {
    let pipeline = Pipeline::new();
    seed_house(&pipeline.records, house(42, 2500, 60));
    let search = pipeline.search.clone();
    let geo = pipeline.geo.clone();

    let consumer = Arc::new(MockConsumer::new(vec![
        payload(&IndexOperation::index(42)),
        payload(&IndexOperation::remove(42)),
    ]));
    let acks = consumer.acks.clone();

    let mut orchestrator =
        Orchestrator::with_config(consumer, pipeline.dispatcher, fast_config());
    let counters = orchestrator.counters();

    let result = timeout(Duration::from_secs(5), orchestrator.run()).await;
    assert!(result.is_ok(), "Orchestrator should finish when the consumer ends");
    assert!(result.unwrap().is_ok());

    assert_eq!(*acks.lock().unwrap(), vec![(0, true), (1, true)]);
    assert_eq!(counters.received.load(Ordering::Relaxed), 2);
    assert_eq!(counters.indexed.load(Ordering::Relaxed), 1);
    assert_eq!(counters.removed.load(Ordering::Relaxed), 1);

    assert!(search.documents_for(42).is_empty());
    assert!(geo.point(42).is_none());
    assert_eq!(geo.upload_count(), 1);
}

#[tokio::test]
async fn test_orchestrator_acknowledges_discarded_messages() {
    let pipeline = Pipeline::new();
    let consumer = Arc::new(MockConsumer::new(vec![
        b"not json".to_vec(),
        br#"{"houseId": 9, "operation": 7, "retry": 0}"#.to_vec(),
        payload(&IndexOperation::index(404)),
    ]));
    let acks = consumer.acks.clone();

    let mut orchestrator =
        Orchestrator::with_config(consumer, pipeline.dispatcher, fast_config());
    let counters = orchestrator.counters();

    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .expect("orchestrator failed");

    assert_eq!(*acks.lock().unwrap(), vec![(0, true), (1, true), (2, true)]);
    assert_eq!(counters.discarded.load(Ordering::Relaxed), 3);
    assert!(pipeline.publisher.published().is_empty());
}

#[tokio::test]
async fn test_orchestrator_requeues_transient_failures() {
    let pipeline = Pipeline::new();
    seed_house(&pipeline.records, house(42, 2500, 60));
    pipeline.geo.set_fail_resolve(true);
    let publisher = pipeline.publisher.clone();

    let consumer = Arc::new(MockConsumer::new(vec![payload(&IndexOperation::index(42))]));
    let acks = consumer.acks.clone();

    let mut orchestrator =
        Orchestrator::with_config(consumer, pipeline.dispatcher, fast_config());
    let counters = orchestrator.counters();

    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .expect("orchestrator failed");

    assert_eq!(*acks.lock().unwrap(), vec![(0, true)]);
    assert_eq!(counters.requeued.load(Ordering::Relaxed), 1);
    assert_eq!(
        publisher.published(),
        vec![IndexOperation::index(42).next_attempt()]
    );
}

#[tokio::test]
async fn test_orchestrator_nacks_when_requeue_cannot_be_published() {
    let pipeline = Pipeline::new();
    seed_house(&pipeline.records, house(42, 2500, 60));
    pipeline.geo.set_fail_upload(true);
    pipeline.publisher.set_fail(true);

    let consumer = Arc::new(MockConsumer::new(vec![payload(&IndexOperation::index(42))]));
    let acks = consumer.acks.clone();

    let mut orchestrator =
        Orchestrator::with_config(consumer, pipeline.dispatcher, fast_config());
    let counters = orchestrator.counters();

    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .expect("orchestrator failed");

    assert_eq!(*acks.lock().unwrap(), vec![(0, false)]);
    assert_eq!(counters.received.load(Ordering::Relaxed), 1);
    assert_eq!(counters.requeued.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_orchestrator_subscribe_error() {
    let pipeline = Pipeline::new();
    let consumer = Arc::new(MockConsumer::with_subscribe_error());

    let mut orchestrator =
        Orchestrator::with_config(consumer, pipeline.dispatcher, fast_config());

    let result = timeout(Duration::from_secs(5), orchestrator.run()).await;

    assert!(result.is_ok(), "Orchestrator should not time out");
    assert!(matches!(result.unwrap(), Err(IngestError::KafkaError(_))));
}

#[tokio::test]
async fn test_orchestrator_shutdown_signal() {
    let pipeline = Pipeline::new();
    seed_house(&pipeline.records, house(42, 2500, 60));
    let consumer = Arc::new(MockConsumer::until_shutdown(vec![payload(
        &IndexOperation::index(42),
    )]));
    let acks = consumer.acks.clone();

    let mut orchestrator =
        Orchestrator::with_config(consumer, pipeline.dispatcher, fast_config());
    let shutdown = orchestrator.shutdown_handle();

    let handle = tokio::spawn(async move { orchestrator.run().await });

    // Wait for the single operation to be acknowledged before stopping
    timeout(Duration::from_secs(5), async {
        while acks.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("operation was never acknowledged");

    shutdown.send(()).unwrap();

    let result = timeout(Duration::from_secs(5), handle)
        .await
        .expect("Orchestrator should stop after shutdown")
        .expect("orchestrator task panicked");
    assert!(result.is_ok());
    assert_eq!(pipeline.search.documents_for(42).len(), 1);
}

#[tokio::test]
async fn test_failed_message_is_read_again_before_later_ones() {
    let pipeline = Pipeline::new();
    seed_house(&pipeline.records, house(42, 2500, 60));
    seed_house(&pipeline.records, house(43, 1800, 40));
    pipeline.geo.set_fail_upload(true);
    pipeline.publisher.fail_next(1);
    let publisher = pipeline.publisher.clone();

    let consumer = Arc::new(PartitionConsumer::new(vec![
        payload(&IndexOperation::index(42)),
        payload(&IndexOperation::index(43)),
    ]));
    let deliveries = consumer.deliveries.clone();
    let committed = consumer.committed.clone();

    let mut orchestrator =
        Orchestrator::with_config(consumer, pipeline.dispatcher, fast_config());

    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .expect("orchestrator failed");

    assert_eq!(
        *deliveries.lock().unwrap(),
        vec![(0, false), (0, true), (1, true)]
    );
    assert_eq!(*committed.lock().unwrap(), vec![1, 2]);
    assert_eq!(
        publisher.published(),
        vec![
            IndexOperation::index(42).next_attempt(),
            IndexOperation::index(43).next_attempt()
        ]
    );
}
