//! The partitioned append-only log capability the notifier is built on.
//!
//! The notifier never talks to a broker directly; it is handed something
//! implementing [`LogClient`] at construction time. Implementations must be
//! safe for concurrent use by every partition consumer plus the producer.
//! Messages within one partition have a total order; the transport must
//! honor the explicit partition number on outbound messages (routing is
//! decided by metric ownership, not key hashing).

#[cfg(test)]
use mockall::automock;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

/// A message consumed from one partition of the log.
#[derive(Debug, Clone)]
pub struct Record {
    pub partition: i32,
    /// Partition-local position of this record
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// A message to be appended to an explicit partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub partition: i32,
    pub payload: Vec<u8>,
}

/// Offset lookup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetQuery {
    /// Oldest retained offset of the partition
    Oldest,
    /// Next offset that will be assigned (the log size)
    Newest,
    /// Offset of the first message at or after the wall-clock time,
    /// in milliseconds since the epoch
    Time(i64),
}

/// An open single-partition subscription. Dropping or closing it releases
/// the underlying partition stream.
pub struct Subscription {
    messages: mpsc::Receiver<Record>,
}

impl Subscription {
    pub fn new(messages: mpsc::Receiver<Record>) -> Self {
        Self { messages }
    }

    /// Next record in partition order. `None` once the subscription closed
    /// and all buffered records were drained.
    pub async fn recv(&mut self) -> Option<Record> {
        self.messages.recv().await
    }

    pub fn close(&mut self) {
        self.messages.close();
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait LogClient: Send + Sync + 'static {
    /// Resolve an offset for one partition.
    async fn get_offset(
        &self,
        topic: &str,
        partition: i32,
        query: OffsetQuery,
    ) -> Result<i64>;

    /// Open an ordered subscription on one partition, starting at `offset`
    /// (a concrete offset, or one of the sentinels in [`crate::constants`]).
    async fn subscribe(
        &self,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<Subscription>;

    /// Append a batch of messages, each to its explicit partition. Returns
    /// `Ok` only when every message was accepted; any failure leaves the
    /// caller responsible for resubmitting the whole batch.
    async fn publish(
        &self,
        messages: &[OutboundMessage],
    ) -> Result<()>;

    /// Release the transport. Subsequent operations fail with
    /// [`crate::LogError::ClientClosed`].
    fn close(&self);
}
