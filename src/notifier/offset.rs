use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tracing::warn;

use crate::constants::OFFSET_NEWEST;
use crate::constants::OFFSET_OLDEST;
use crate::LogClient;
use crate::OffsetPolicy;
use crate::OffsetQuery;

/// Compute the offset a partition consumer should start reading from.
///
/// Runs once per partition before any consumer loop starts, so the backlog
/// gate sees every partition's boot-time head recorded at the same instant.
/// A failed lookback query falls back to the oldest sentinel with a warning;
/// startup never fails here.
pub(crate) async fn resolve_start_offset(
    client: &dyn LogClient,
    topic: &str,
    partition: i32,
    policy: OffsetPolicy,
) -> i64 {
    match policy {
        OffsetPolicy::Oldest => OFFSET_OLDEST,
        OffsetPolicy::Newest => OFFSET_NEWEST,
        OffsetPolicy::Lookback(duration) => {
            let at_ms = now_ms() - duration.as_millis() as i64;
            match client
                .get_offset(topic, partition, OffsetQuery::Time(at_ms))
                .await
            {
                Ok(offset) => offset,
                Err(e) => {
                    warn!(
                        "failed to get offset {:?} back for {}:{}: {} -> will use oldest instead",
                        duration, topic, partition, e
                    );
                    OFFSET_OLDEST
                }
            }
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
