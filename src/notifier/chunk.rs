use serde::Deserialize;
use serde::Serialize;

/// "This chunk of this metric starting at this time is now durable."
///
/// Produced by the storage layer after a chunk write, consumed by the
/// notifier. The key carries org id, metric identity and archive; `t0` is
/// the chunk's start timestamp in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedChunk {
    pub key: String,
    pub t0: i64,
}

/// The wire envelope: origin instance plus an ordered run of saved chunks.
///
/// Outbound envelopes always carry exactly one chunk, because each chunk is
/// routed to the partition owning its metric and a multi-chunk envelope
/// could straddle partitions. The sequence form is kept on the wire so a
/// single decode path serves both current and historical producers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistMessage {
    pub instance: String,
    pub saved_chunks: Vec<SavedChunk>,
}
