use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::time::interval_at;
use tokio::time::Instant;
use tracing::error;
use tracing::info;
use tracing::trace;

use crate::LogClient;
use crate::OffsetQuery;
use crate::PersistHandler;
use crate::Result;
use crate::Subscription;
use crate::PARTITION_LAG;
use crate::PARTITION_LOG_SIZE;
use crate::PARTITION_OFFSET;

/// One long-lived loop per partition: applies every record to the handler
/// in strict arrival order, reports offset/lag telemetry on a fixed tick,
/// and signals the backlog gate once it has replayed up to the offset that
/// was the partition head at boot.
pub(crate) struct PartitionConsumer {
    pub(crate) topic: String,
    pub(crate) partition: i32,
    /// Highest fetchable offset observed at process start. The head query
    /// returns the next-available offset, so the caller subtracts one.
    pub(crate) boot_offset: i64,
    /// Highest offset consumed (or skipped) so far; -1 while nothing has
    /// been consumed from a start-of-log subscription.
    pub(crate) current_offset: i64,
    pub(crate) subscription: Subscription,
    pub(crate) client: Arc<dyn LogClient>,
    pub(crate) handler: Arc<dyn PersistHandler>,
    pub(crate) caught_up: mpsc::Sender<i32>,
    pub(crate) shutdown: watch::Receiver<()>,
    pub(crate) tick_interval: Duration,
}

impl PartitionConsumer {
    pub(crate) async fn run(mut self) -> Result<()> {
        info!(
            "consuming from {}:{} from offset {}",
            self.topic, self.partition, self.current_offset
        );

        let mut subscription = self.subscription;
        // First tick fires one full interval in, not immediately: catch-up
        // is checked lazily, never synchronously with each message.
        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        let mut starting_up = true;
        let mut log_size: Option<i64> = None;

        let partition_label = self.partition.to_string();

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => {
                    subscription.close();
                    info!("consumer for {}:{} ended.", self.topic, self.partition);
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if starting_up && self.current_offset >= self.boot_offset {
                        // Closed receiver just means the gate already
                        // resolved (opened or timed out).
                        let _ = self.caught_up.try_send(self.partition);
                        starting_up = false;
                    }

                    match self.client.get_offset(&self.topic, self.partition, OffsetQuery::Newest).await {
                        Ok(offset) => {
                            log_size = Some(offset);
                            PARTITION_LOG_SIZE.with_label_values(&[&partition_label]).set(offset);
                        }
                        Err(e) => {
                            // Keep the previous value; telemetry only.
                            error!(
                                "failed to get log-size of partition {}:{}: {}",
                                self.topic, self.partition, e
                            );
                        }
                    }

                    if self.current_offset < 0 {
                        // we have not yet consumed any messages.
                        continue;
                    }
                    PARTITION_OFFSET.with_label_values(&[&partition_label]).set(self.current_offset);
                    if let Some(size) = log_size {
                        PARTITION_LAG
                            .with_label_values(&[&partition_label])
                            .set(size - self.current_offset);
                    }
                }
                record = subscription.recv() => {
                    match record {
                        Some(record) => {
                            trace!(
                                "received record: {}:{} offset {}",
                                self.topic, self.partition, record.offset
                            );
                            self.handler.handle(&record.payload);
                            self.current_offset = record.offset;
                        }
                        None => {
                            info!(
                                "subscription for {}:{} closed, consumer ending.",
                                self.topic, self.partition
                            );
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
