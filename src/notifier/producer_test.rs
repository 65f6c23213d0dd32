use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::BatchProducer;
use crate::decode;
use crate::test_utils::test_key;
use crate::test_utils::MemoryLog;
use crate::test_utils::RecordingHandler;
use crate::utils::BufferPool;
use crate::SavedChunk;
use crate::ROUTING_DROPPED;

fn chunk(org: u32, t0: i64) -> SavedChunk {
    SavedChunk {
        key: test_key(org),
        t0,
    }
}

fn spawn_producer(
    log: &Arc<MemoryLog>,
    handler: &Arc<RecordingHandler>,
    flush_max_events: usize,
) -> (
    mpsc::Sender<SavedChunk>,
    watch::Sender<()>,
    JoinHandle<()>,
) {
    let (in_tx, in_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let producer = BatchProducer {
        instance: "node-under-test".to_string(),
        topic: "persist-test".to_string(),
        client: log.clone(),
        handler: handler.clone(),
        pool: Arc::new(BufferPool::default()),
        in_rx,
        shutdown: shutdown_rx,
        flush_max_events,
        flush_interval: Duration::from_secs(1),
        publish_backoff: Duration::from_secs(1),
    };
    let handle = tokio::spawn(producer.run());
    (in_tx, shutdown_tx, handle)
}

#[tokio::test(start_paused = true)]
async fn interval_flush_publishes_all_buffered_events_with_per_event_routing() {
    let log = Arc::new(MemoryLog::new(&[0, 1]));
    let handler = Arc::new(RecordingHandler::new());
    handler.route_org(1, 0);
    handler.route_org(2, 1);
    let (in_tx, _shutdown_tx, _handle) = spawn_producer(&log, &handler, 5000);

    in_tx.send(chunk(1, 100)).await.unwrap();
    in_tx.send(chunk(2, 200)).await.unwrap();
    in_tx.send(chunk(1, 300)).await.unwrap();

    sleep(Duration::from_millis(1500)).await;

    // One publish attempt for the whole batch.
    assert_eq!(log.publish_attempts(), 1);

    let p0 = log.records(0);
    let p1 = log.records(1);
    assert_eq!(p0.len(), 2);
    assert_eq!(p1.len(), 1);

    // Every envelope is single-event and tagged with the origin instance.
    let msg = decode(&p1[0]).unwrap();
    assert_eq!(msg.instance, "node-under-test");
    assert_eq!(msg.saved_chunks.len(), 1);
    assert_eq!(msg.saved_chunks[0].t0, 200);
}

#[tokio::test(start_paused = true)]
async fn high_water_mark_flushes_before_the_interval() {
    let log = Arc::new(MemoryLog::new(&[0]));
    let handler = Arc::new(RecordingHandler::new());
    handler.route_org(1, 0);
    let (in_tx, _shutdown_tx, _handle) = spawn_producer(&log, &handler, 3);

    for t0 in 0..3 {
        in_tx.send(chunk(1, t0)).await.unwrap();
    }

    // Well before the 1s flush tick.
    sleep(Duration::from_millis(50)).await;
    assert_eq!(log.publish_attempts(), 1);
    assert_eq!(log.records(0).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn empty_buffer_interval_flush_is_a_noop() {
    let log = Arc::new(MemoryLog::new(&[0]));
    let handler = Arc::new(RecordingHandler::new());
    let (_in_tx, _shutdown_tx, _handle) = spawn_producer(&log, &handler, 5000);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(log.publish_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn unroutable_events_are_dropped_without_blocking_the_flush() {
    let log = Arc::new(MemoryLog::new(&[0]));
    let handler = Arc::new(RecordingHandler::new());
    handler.route_org(1, 0);
    // org 2 has no route
    let (in_tx, _shutdown_tx, _handle) = spawn_producer(&log, &handler, 5000);

    let dropped_before = ROUTING_DROPPED.get();
    in_tx.send(chunk(1, 100)).await.unwrap();
    in_tx.send(chunk(2, 200)).await.unwrap();
    in_tx
        .send(SavedChunk {
            key: "not-a-key".to_string(),
            t0: 300,
        })
        .await
        .unwrap();

    sleep(Duration::from_millis(1500)).await;

    let published = log.records(0);
    assert_eq!(published.len(), 1);
    let msg = decode(&published[0]).unwrap();
    assert_eq!(msg.saved_chunks[0].t0, 100);
    assert!(ROUTING_DROPPED.get() >= dropped_before + 2);
}

#[tokio::test(start_paused = true)]
async fn publish_retries_the_whole_batch_until_success() {
    let log = Arc::new(MemoryLog::new(&[0]));
    let handler = Arc::new(RecordingHandler::new());
    handler.route_org(1, 0);
    log.fail_next_publishes(2);
    let (in_tx, _shutdown_tx, _handle) = spawn_producer(&log, &handler, 5000);

    in_tx.send(chunk(1, 100)).await.unwrap();
    in_tx.send(chunk(1, 200)).await.unwrap();

    // First attempt at the 1s flush tick, then one per backoff interval.
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(log.publish_attempts(), 1);
    assert!(log.records(0).is_empty());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(log.publish_attempts(), 2);
    assert!(log.records(0).is_empty());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(log.publish_attempts(), 3);
    assert_eq!(log.records(0).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_drains_pending_events_before_exit() {
    let log = Arc::new(MemoryLog::new(&[0]));
    let handler = Arc::new(RecordingHandler::new());
    handler.route_org(1, 0);
    let (in_tx, shutdown_tx, handle) = spawn_producer(&log, &handler, 5000);

    in_tx.send(chunk(1, 100)).await.unwrap();
    in_tx.send(chunk(1, 200)).await.unwrap();
    // Let the producer pull both sends off the queue first.
    sleep(Duration::from_millis(10)).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    sleep(Duration::from_millis(10)).await;
    assert_eq!(log.records(0).len(), 2);
}
