#[cfg(test)]
use mockall::automock;

use crate::MetricKey;

/// What the rest of the node exposes to the notifier.
///
/// `handle` is invoked synchronously, in strict per-partition arrival
/// order, for every consumed record - including records this node itself
/// produced. Applying a notification must be idempotent: the at-least-once
/// publish path can and will deliver duplicates. Malformed payloads are the
/// handler's concern; the consumer only guarantees ordered delivery.
///
/// `partition_of` is the external metric-ownership lookup, queried once per
/// outbound event at flush time.
#[cfg_attr(test, automock)]
pub trait PersistHandler: Send + Sync + 'static {
    fn handle(
        &self,
        payload: &[u8],
    );

    fn partition_of(
        &self,
        key: &MetricKey,
    ) -> Option<i32>;
}
