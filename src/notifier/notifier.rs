//! The orchestrator owning the notification subsystem's lifecycle.
//!
//! Construction wires offset resolution, the backlog gate and one consumer
//! per partition, then blocks (bounded by the gate timeout) until the node
//! has replayed the notification backlog - so the caller knows that, upon
//! return, it will not redundantly re-persist chunks peers already saved.

use std::sync::Arc;
use std::time::Duration;

use autometrics::autometrics;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::constants::CONSUMER_TICK_MS;
use crate::constants::OFFSET_NEWEST;
use crate::constants::OFFSET_OLDEST;
use crate::constants::SEND_QUEUE_CAPACITY;
use crate::metrics;
use crate::utils::BufferPool;
use crate::BacklogGate;
use crate::BacklogOutcome;
use crate::BatchProducer;
use crate::LogClient;
use crate::OffsetQuery;
use crate::PartitionConsumer;
use crate::PersistHandler;
use crate::Result;
use crate::SavedChunk;
use crate::Settings;
use crate::API_SLO;
use crate::PARTITION_LAG;
use crate::PARTITION_LOG_SIZE;
use crate::PARTITION_OFFSET;

use super::resolve_start_offset;

/// Generate a node instance identifier for envelopes when the deployment
/// does not assign one.
pub fn generate_instance_id() -> String {
    format!("relay-{}", nanoid::nanoid!(8))
}

pub struct Notifier {
    in_tx: mpsc::Sender<SavedChunk>,
    shutdown_tx: watch::Sender<()>,
    stopped_tx: watch::Sender<bool>,
    stopped_rx: watch::Receiver<bool>,
    client: Arc<dyn LogClient>,
    handles: Mutex<Option<Vec<JoinHandle<()>>>>,
    /// Runtime the subsystem's tasks live on; lets `stop` spawn the
    /// join-waiter from any thread.
    runtime: tokio::runtime::Handle,
}

impl Notifier {
    /// Connect the subsystem on top of an established log client.
    ///
    /// Subscribing any partition failing is fatal and aborts startup. On
    /// success the whole backlog has been replayed, or the gate timeout
    /// elapsed and the node proceeds degraded (logged as a warning).
    pub async fn new(
        instance: impl Into<String>,
        handler: Arc<dyn PersistHandler>,
        client: Arc<dyn LogClient>,
        settings: &Settings,
    ) -> Result<Self> {
        settings.validate()?;

        let instance = instance.into();
        let topic = settings.log.topic.clone();
        let policy = settings.notifier.offset_policy();
        let tick_interval = Duration::from_millis(CONSUMER_TICK_MS);

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let (stopped_tx, stopped_rx) = watch::channel(false);
        let (caught_up_tx, gate) = BacklogGate::new(settings.log.partitions.len());

        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        let pre = tokio::time::Instant::now();

        // First capture every partition's boot-time head, before any
        // consumer starts. A consumer replaying one partition can trigger
        // writes landing in another; heads queried after that would inflate
        // the backlog the gate waits on.
        let mut boot_offsets: Vec<(i32, i64, i64)> =
            Vec::with_capacity(settings.log.partitions.len());
        for &partition in &settings.log.partitions {
            // Next-available offset at boot; the highest fetchable message
            // is one below it.
            let boot_head = client
                .get_offset(&topic, partition, OffsetQuery::Newest)
                .await?;
            let start_offset =
                resolve_start_offset(client.as_ref(), &topic, partition, policy).await;
            boot_offsets.push((partition, boot_head, start_offset));
        }

        for (partition, boot_head, start_offset) in boot_offsets {
            // Highest offset already "consumed" from this node's point of
            // view: everything below the start offset is skipped, nothing
            // at or above it has been applied yet.
            let initial_offset = match start_offset {
                OFFSET_NEWEST => boot_head - 1,
                OFFSET_OLDEST => -1,
                concrete => concrete - 1,
            };

            let partition_label = partition.to_string();
            PARTITION_LOG_SIZE
                .with_label_values(&[&partition_label])
                .set(boot_head);
            if initial_offset >= 0 {
                PARTITION_OFFSET
                    .with_label_values(&[&partition_label])
                    .set(initial_offset);
                PARTITION_LAG
                    .with_label_values(&[&partition_label])
                    .set(boot_head - initial_offset);
            }

            let subscription = client.subscribe(&topic, partition, start_offset).await?;

            let consumer = PartitionConsumer {
                topic: topic.clone(),
                partition,
                boot_offset: boot_head - 1,
                current_offset: initial_offset,
                subscription,
                client: client.clone(),
                handler: handler.clone(),
                caught_up: caught_up_tx.clone(),
                shutdown: shutdown_rx.clone(),
                tick_interval,
            };
            handles.push(tokio::spawn(async move {
                if let Err(e) = consumer.run().await {
                    error!("partition consumer stopped with error: {:?}", e);
                }
            }));
        }
        drop(caught_up_tx);

        // Wait for our backlog to be processed before returning. Messages
        // already in the log describe chunks peers have persisted; replaying
        // them first keeps this node from overwriting chunks that were
        // already written.
        info!("waiting for persist notification backlog to be processed.");
        match gate.wait(settings.notifier.backlog_process_timeout()).await {
            BacklogOutcome::Processed(_) => {
                info!("persist notification backlog processed in {:?}.", pre.elapsed());
            }
            BacklogOutcome::TimedOut(elapsed) => {
                warn!(
                    "processing persist notification backlog has taken too long, giving up lock after {:?}.",
                    elapsed
                );
            }
        }

        let (in_tx, in_rx) = mpsc::channel(SEND_QUEUE_CAPACITY);
        let producer = BatchProducer {
            instance,
            topic,
            client: client.clone(),
            handler,
            pool: Arc::new(BufferPool::default()),
            in_rx,
            shutdown: shutdown_rx.clone(),
            flush_max_events: settings.notifier.flush_max_events,
            flush_interval: settings.notifier.flush_interval(),
            publish_backoff: settings.notifier.publish_backoff(),
        };
        handles.push(tokio::spawn(producer.run()));

        if settings.monitoring.prometheus_enabled {
            let port = settings.monitoring.prometheus_port;
            handles.push(tokio::spawn(metrics::start_server(port, shutdown_rx)));
        }

        Ok(Self {
            in_tx,
            shutdown_tx,
            stopped_tx,
            stopped_rx,
            client,
            handles: Mutex::new(Some(handles)),
            runtime: tokio::runtime::Handle::current(),
        })
    }

    /// Hand a saved-chunk event to the batch producer. Only enqueues; the
    /// network round trip happens on the producer's flush path.
    #[autometrics(objective = API_SLO)]
    pub async fn send(
        &self,
        chunk: SavedChunk,
    ) {
        if self.in_tx.send(chunk).await.is_err() {
            warn!("notifier already stopped, dropping saved chunk notification");
        }
    }

    /// Initiate a graceful, permanent stop. Returns immediately; observe
    /// [`Notifier::stopped`] (or await [`Notifier::wait_stopped`]) for the
    /// completion signal, which fires only once every consumer loop has
    /// exited. Callable from any thread, including ones outside the
    /// runtime.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
        // In-flight publish retries now run against a closed client and
        // keep failing until process exit; accepted.
        self.client.close();

        if let Some(handles) = self.handles.lock().take() {
            let stopped_tx = self.stopped_tx.clone();
            self.runtime.spawn(async move {
                for handle in handles {
                    if let Err(e) = handle.await {
                        error!("notifier task join failed: {:?}", e);
                    }
                }
                let _ = stopped_tx.send(true);
            });
        }
    }

    /// Completion signal: flips to `true` after all loops have exited.
    pub fn stopped(&self) -> watch::Receiver<bool> {
        self.stopped_rx.clone()
    }

    /// Block until the stop initiated by [`Notifier::stop`] has completed.
    pub async fn wait_stopped(&self) {
        let mut rx = self.stopped_rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
