// -
// Offset sentinels (sarama-compatible)

/// Start consuming from the newest available offset.
pub const OFFSET_NEWEST: i64 = -1;
/// Start consuming from the oldest retained offset.
pub const OFFSET_OLDEST: i64 = -2;

// -
// Batch producer

/// Flush immediately once this many events are buffered.
pub(crate) const FLUSH_MAX_EVENTS: usize = 5000;

/// Flush the buffer on this interval regardless of size, bounding publish
/// latency during low-volume periods.
pub(crate) const FLUSH_INTERVAL_MS: u64 = 1000;

/// Fixed wait between publish retry attempts. No growth: delivery guarantee
/// is favored over responsiveness under sustained broker outage.
pub(crate) const PUBLISH_BACKOFF_MS: u64 = 1000;

/// Capacity of the send queue feeding the producer loop.
pub(crate) const SEND_QUEUE_CAPACITY: usize = 1024;

// -
// Partition consumer

/// Telemetry / catch-up check interval per partition consumer.
pub(crate) const CONSUMER_TICK_MS: u64 = 5000;
