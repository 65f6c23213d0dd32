use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::time::interval_at;
use tokio::time::sleep;
use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::encode_into;
use crate::utils::BufferPool;
use crate::ArchiveKey;
use crate::LogClient;
use crate::OutboundMessage;
use crate::PersistHandler;
use crate::PersistMessage;
use crate::SavedChunk;
use crate::MESSAGES_PUBLISHED;
use crate::MESSAGE_SIZE_IN_BYTES_METRIC;
use crate::PUBLISH_RETRIES;
use crate::ROUTING_DROPPED;

/// Accumulates locally generated saved-chunk events and flushes them as a
/// batch once the buffer hits the high-water mark or the flush interval
/// fires, whichever is first. Flushing resolves each event's destination
/// partition, serializes one single-event envelope per chunk, and hands
/// the batch to an asynchronous publish task that retries indefinitely.
pub(crate) struct BatchProducer {
    pub(crate) instance: String,
    pub(crate) topic: String,
    pub(crate) client: Arc<dyn LogClient>,
    pub(crate) handler: Arc<dyn PersistHandler>,
    pub(crate) pool: Arc<BufferPool>,
    pub(crate) in_rx: mpsc::Receiver<SavedChunk>,
    pub(crate) shutdown: watch::Receiver<()>,
    pub(crate) flush_max_events: usize,
    pub(crate) flush_interval: Duration,
    pub(crate) publish_backoff: Duration,
}

impl BatchProducer {
    pub(crate) async fn run(mut self) {
        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        let mut buf: Vec<SavedChunk> = Vec::new();

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => {
                    // Drain whatever was enqueued before the signal, then
                    // close the publish path.
                    while let Ok(chunk) = self.in_rx.try_recv() {
                        buf.push(chunk);
                    }
                    self.flush(&mut buf);
                    debug!("batch producer ended.");
                    return;
                }
                chunk = self.in_rx.recv() => {
                    match chunk {
                        Some(chunk) => {
                            buf.push(chunk);
                            if buf.len() >= self.flush_max_events {
                                self.flush(&mut buf);
                            }
                        }
                        None => {
                            self.flush(&mut buf);
                            debug!("send queue closed, batch producer ended.");
                            return;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.flush(&mut buf);
                }
            }
        }
    }

    /// Makes sure the batch gets sent, asynchronously. The buffer is
    /// cleared before this returns; only the publish round trip is async.
    fn flush(
        &self,
        buf: &mut Vec<SavedChunk>,
    ) {
        if buf.is_empty() {
            return;
        }

        // Each chunk is routed to the partition owning its metric, so
        // chunks are enveloped one by one instead of as a shared batch.
        let mut payload: Vec<OutboundMessage> = Vec::with_capacity(buf.len());
        for chunk in buf.drain(..) {
            let akey = match ArchiveKey::parse(&chunk.key) {
                Ok(akey) => akey,
                Err(e) => {
                    error!("failed to parse key {:?}: {}", chunk.key, e);
                    ROUTING_DROPPED.inc();
                    continue;
                }
            };

            let partition = match self.handler.partition_of(&akey.mkey) {
                Some(partition) => partition,
                None => {
                    error!("failed to lookup partition for metric {}", akey.mkey);
                    ROUTING_DROPPED.inc();
                    continue;
                }
            };

            let mut bytes = self.pool.get();
            let msg = PersistMessage {
                instance: self.instance.clone(),
                saved_chunks: vec![chunk],
            };
            if let Err(e) = encode_into(&mut bytes, &msg) {
                error!("failed to serialize persist message: {}", e);
                self.pool.put(bytes);
                continue;
            }
            MESSAGE_SIZE_IN_BYTES_METRIC.observe(bytes.len() as f64);

            payload.push(OutboundMessage {
                topic: self.topic.clone(),
                partition,
                payload: bytes,
            });
        }

        if payload.is_empty() {
            return;
        }

        let client = self.client.clone();
        let pool = self.pool.clone();
        let backoff = self.publish_backoff;
        tokio::spawn(async move {
            debug!("sending {} batch persist messages", payload.len());
            loop {
                match client.publish(&payload).await {
                    Ok(()) => break,
                    Err(e) => {
                        // Retry the entire remaining batch, forever, at a
                        // fixed interval. Duplicates on partial broker
                        // success are accepted; handler apply is idempotent.
                        warn!("publisher: {}", e);
                        PUBLISH_RETRIES.inc();
                        sleep(backoff).await;
                    }
                }
            }
            MESSAGES_PUBLISHED.inc_by(payload.len() as u64);
            // put our buffers back in the pool
            for msg in payload {
                pool.put(msg.payload);
            }
        });
    }
}
