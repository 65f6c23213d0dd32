use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::constants::OFFSET_NEWEST;
use crate::constants::OFFSET_OLDEST;
use crate::LogClient;
use crate::LogError;
use crate::OffsetQuery;
use crate::OutboundMessage;
use crate::Record;
use crate::Result;
use crate::Subscription;

struct PartitionState {
    records: Vec<Vec<u8>>,
    subscribers: Vec<mpsc::Sender<Record>>,
    /// Pretend the log head is here even if fewer records exist, to model
    /// a backlog that is never fully delivered.
    head_override: Option<i64>,
}

/// In-process partitioned log for tests. Preserves per-partition order,
/// supports live subscriptions and offset queries, and can inject publish
/// failures.
pub struct MemoryLog {
    partitions: Mutex<HashMap<i32, PartitionState>>,
    closed: AtomicBool,
    fail_publishes: AtomicUsize,
    publish_attempts: AtomicUsize,
}

impl MemoryLog {
    pub fn new(partitions: &[i32]) -> Self {
        let mut map = HashMap::new();
        for &partition in partitions {
            map.insert(
                partition,
                PartitionState {
                    records: Vec::new(),
                    subscribers: Vec::new(),
                    head_override: None,
                },
            );
        }
        Self {
            partitions: Mutex::new(map),
            closed: AtomicBool::new(false),
            fail_publishes: AtomicUsize::new(0),
            publish_attempts: AtomicUsize::new(0),
        }
    }

    /// Append a record directly, as if some peer published it.
    pub fn append(
        &self,
        partition: i32,
        payload: Vec<u8>,
    ) {
        let mut partitions = self.partitions.lock();
        let state = partitions.get_mut(&partition).expect("unknown partition");
        let offset = state.records.len() as i64;
        state.records.push(payload.clone());
        state.subscribers.retain(|tx| {
            tx.try_send(Record {
                partition,
                offset,
                payload: payload.clone(),
            })
            .is_ok()
        });
    }

    /// Report the partition head as `offset` regardless of stored records.
    pub fn set_head_override(
        &self,
        partition: i32,
        offset: i64,
    ) {
        let mut partitions = self.partitions.lock();
        partitions
            .get_mut(&partition)
            .expect("unknown partition")
            .head_override = Some(offset);
    }

    /// Make the next `n` publish attempts fail.
    pub fn fail_next_publishes(
        &self,
        n: usize,
    ) {
        self.fail_publishes.store(n, Ordering::SeqCst);
    }

    pub fn publish_attempts(&self) -> usize {
        self.publish_attempts.load(Ordering::SeqCst)
    }

    pub fn records(
        &self,
        partition: i32,
    ) -> Vec<Vec<u8>> {
        self.partitions.lock()[&partition].records.clone()
    }
}

#[async_trait]
impl LogClient for MemoryLog {
    async fn get_offset(
        &self,
        _topic: &str,
        partition: i32,
        query: OffsetQuery,
    ) -> Result<i64> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LogError::ClientClosed.into());
        }
        let partitions = self.partitions.lock();
        let state = partitions.get(&partition).expect("unknown partition");
        Ok(match query {
            OffsetQuery::Oldest => 0,
            OffsetQuery::Newest => state
                .head_override
                .unwrap_or(state.records.len() as i64),
            // Tests drive lookback via mocks; the memory log retains
            // everything, so any time maps to the start.
            OffsetQuery::Time(_) => 0,
        })
    }

    async fn subscribe(
        &self,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<Subscription> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LogError::SubscribeFailed {
                topic: topic.to_string(),
                partition,
                reason: "client closed".to_string(),
            }
            .into());
        }

        let mut partitions = self.partitions.lock();
        let state = partitions
            .get_mut(&partition)
            .ok_or_else(|| LogError::SubscribeFailed {
                topic: topic.to_string(),
                partition,
                reason: "unknown partition".to_string(),
            })?;

        let start = match offset {
            OFFSET_OLDEST => 0,
            OFFSET_NEWEST => state.records.len(),
            concrete => concrete.max(0) as usize,
        };

        let (tx, rx) = mpsc::channel(state.records.len().saturating_sub(start) + 1024);
        for (i, payload) in state.records.iter().enumerate().skip(start) {
            tx.try_send(Record {
                partition,
                offset: i as i64,
                payload: payload.clone(),
            })
            .expect("subscription backlog fits channel");
        }
        state.subscribers.push(tx);

        Ok(Subscription::new(rx))
    }

    async fn publish(
        &self,
        messages: &[OutboundMessage],
    ) -> Result<()> {
        self.publish_attempts.fetch_add(1, Ordering::SeqCst);

        if self.closed.load(Ordering::SeqCst) {
            return Err(LogError::ClientClosed.into());
        }

        let failing = self
            .fail_publishes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LogError::PublishFailed {
                messages: messages.len(),
                reason: "injected failure".to_string(),
            }
            .into());
        }

        for msg in messages {
            self.append(msg.partition, msg.payload.clone());
        }
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let mut partitions = self.partitions.lock();
        for state in partitions.values_mut() {
            state.subscribers.clear();
        }
    }
}
