use std::time::Duration;

use super::resolve_start_offset;
use crate::LogError;
use crate::MockLogClient;
use crate::OffsetPolicy;
use crate::OffsetQuery;
use crate::OFFSET_NEWEST;
use crate::OFFSET_OLDEST;

#[tokio::test]
async fn oldest_policy_maps_to_sentinel_without_query() {
    let client = MockLogClient::new();

    let offset = resolve_start_offset(&client, "persist", 0, OffsetPolicy::Oldest).await;
    assert_eq!(offset, OFFSET_OLDEST);
}

#[tokio::test]
async fn newest_policy_maps_to_sentinel_without_query() {
    let client = MockLogClient::new();

    let offset = resolve_start_offset(&client, "persist", 3, OffsetPolicy::Newest).await;
    assert_eq!(offset, OFFSET_NEWEST);
}

#[tokio::test]
async fn lookback_policy_queries_offset_at_time() {
    let mut client = MockLogClient::new();
    client
        .expect_get_offset()
        .withf(|topic, partition, query| {
            topic == "persist" && *partition == 1 && matches!(query, OffsetQuery::Time(_))
        })
        .times(1)
        .returning(|_, _, _| Ok(42));

    let policy = OffsetPolicy::Lookback(Duration::from_secs(3600));
    let offset = resolve_start_offset(&client, "persist", 1, policy).await;
    assert_eq!(offset, 42);
}

#[tokio::test]
async fn lookback_failure_falls_back_to_oldest() {
    let mut client = MockLogClient::new();
    client
        .expect_get_offset()
        .times(1)
        .returning(|topic, partition, _| {
            Err(LogError::OffsetQueryFailed {
                topic: topic.to_string(),
                partition,
                reason: "broker gone".to_string(),
            }
            .into())
        });

    let policy = OffsetPolicy::Lookback(Duration::from_secs(3600));
    let offset = resolve_start_offset(&client, "persist", 0, policy).await;
    assert_eq!(offset, OFFSET_OLDEST);
}
