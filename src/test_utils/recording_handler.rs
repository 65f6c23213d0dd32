use std::collections::HashMap;

use parking_lot::Mutex;

use crate::MetricKey;
use crate::PersistHandler;

/// Handler fixture: records every applied payload in order and routes
/// metrics to partitions by org id.
#[derive(Default)]
pub struct RecordingHandler {
    handled: Mutex<Vec<Vec<u8>>>,
    routes: Mutex<HashMap<u32, i32>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route all metrics of `org` to `partition`. Orgs without a route are
    /// reported as unresolvable.
    pub fn route_org(
        &self,
        org: u32,
        partition: i32,
    ) {
        self.routes.lock().insert(org, partition);
    }

    pub fn handled(&self) -> Vec<Vec<u8>> {
        self.handled.lock().clone()
    }

    pub fn handled_count(&self) -> usize {
        self.handled.lock().len()
    }
}

impl PersistHandler for RecordingHandler {
    fn handle(
        &self,
        payload: &[u8],
    ) {
        self.handled.lock().push(payload.to_vec());
    }

    fn partition_of(
        &self,
        key: &MetricKey,
    ) -> Option<i32> {
        self.routes.lock().get(&key.org).copied()
    }
}
