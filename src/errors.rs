//! Error hierarchy for the persisted-chunk notification subsystem.
//!
//! Errors are layered by operational concern: log-transport failures,
//! configuration validation failures, wire-format failures, and data-level
//! routing-key failures. Transport errors carry enough context to decide
//! whether the caller aborts startup (connect/subscribe) or keeps retrying
//! (publish, offset queries).

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Partitioned-log transport failures
    #[error(transparent)]
    Log(#[from] LogError),

    /// Configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Wire envelope encode/decode failures
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Routing-key parse failures (data-level, recoverable by skipping)
    #[error(transparent)]
    Key(#[from] KeyError),
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Subscribing a partition at startup failed. Fatal: the node cannot
    /// safely run without a consumer on every partition.
    #[error("Failed to subscribe to {topic}:{partition}: {reason}")]
    SubscribeFailed {
        topic: String,
        partition: i32,
        reason: String,
    },

    /// A batch publish attempt failed. Retryable.
    #[error("Publish of {messages} messages failed: {reason}")]
    PublishFailed { messages: usize, reason: String },

    /// An offset lookup failed. Retryable (resolver falls back to oldest,
    /// telemetry keeps the previous value).
    #[error("Offset query for {topic}:{partition} failed: {reason}")]
    OffsetQueryFailed {
        topic: String,
        partition: i32,
        reason: String,
    },

    /// The client has been closed; all further operations fail.
    #[error("Log client is closed")]
    ClientClosed,
}

/// Wire-format failures for the versioned persist-message envelope.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Bincode serialization failed: {0}")]
    Bincode(#[from] bincode::Error),

    /// Payload shorter than the leading version byte
    #[error("Persist message is empty")]
    EmptyPayload,

    /// Leading version byte is not one we understand
    #[error("Unknown persist message version: {0}")]
    UnknownVersion(u8),
}

/// Routing-key parse failures. These never abort a flush; the offending
/// event is dropped and a counter incremented.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Key {0:?} is missing the org/id separator")]
    MissingSeparator(String),

    #[error("Key {0:?} has an invalid org id")]
    InvalidOrg(String),

    #[error("invalid metric id length: expected 32 hex chars, received {0}")]
    InvalidIdLength(usize),

    #[error("Key {0:?} has a non-hex metric id")]
    InvalidIdEncoding(String),

    #[error("Key {0:?} has a malformed archive suffix")]
    InvalidArchive(String),
}

// ============== Conversion Implementations ============== //

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(SerializationError::Bincode(e))
    }
}
