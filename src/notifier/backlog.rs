use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio::time::Instant;
use tracing::debug;

/// How the startup barrier resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogOutcome {
    /// Every partition replayed up to its boot offset within the budget.
    Processed(Duration),
    /// The timeout elapsed first; the node proceeds degraded (some
    /// redundant chunk writes are possible, but never a deadlocked node).
    TimedOut(Duration),
}

/// One-shot startup barrier: opens once every partition consumer has
/// reported catch-up, or once the timeout elapses, whichever is first.
///
/// Each consumer holds a clone of the countdown sender and fires it at the
/// first periodic tick where its offset has reached the boot offset; the
/// check is lazy on purpose, to avoid a wake-up per message.
pub(crate) struct BacklogGate {
    caught_up_rx: mpsc::Receiver<i32>,
    pending: usize,
}

impl BacklogGate {
    /// Returns the gate plus the countdown sender to clone into the
    /// partition consumers.
    pub(crate) fn new(partitions: usize) -> (mpsc::Sender<i32>, Self) {
        let (caught_up_tx, caught_up_rx) = mpsc::channel(partitions.max(1));
        (
            caught_up_tx,
            Self {
                caught_up_rx,
                pending: partitions,
            },
        )
    }

    /// Block until the countdown reaches zero or `budget` elapses.
    pub(crate) async fn wait(
        mut self,
        budget: Duration,
    ) -> BacklogOutcome {
        let start = Instant::now();
        let deadline = start + budget;

        while self.pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, self.caught_up_rx.recv()).await {
                Ok(Some(partition)) => {
                    self.pending -= 1;
                    debug!(
                        "partition {} caught up, {} partitions still behind",
                        partition, self.pending
                    );
                }
                // All senders dropped: consumers exited before catching up.
                // Treat like a timeout so startup still completes.
                Ok(None) => return BacklogOutcome::TimedOut(start.elapsed()),
                Err(_) => return BacklogOutcome::TimedOut(start.elapsed()),
            }
        }

        BacklogOutcome::Processed(start.elapsed())
    }
}
