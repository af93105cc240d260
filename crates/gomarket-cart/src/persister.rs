//! # Cart Writer
//!
//! Background task that writes cart snapshots to the storage backend, one at
//! a time, in the order the mutations happened.
//!
//! ## Write Queue
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Writer Flow                                │
//! │                                                                         │
//! │  CartStore (under state lock)                                          │
//! │       │                                                                 │
//! │       │  Save { revision: 1 }  Save { revision: 2 }  Flush  Save { 3 }  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  unbounded mpsc (FIFO)                                          │   │
//! │  └────────────────────────────┬────────────────────────────────────┘   │
//! │                               ▼                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Persister                                                      │   │
//! │  │                                                                 │   │
//! │  │  1. Coalesce: Save 1, Save 2 collapse into Save 2              │   │
//! │  │     (stops at the Flush, never reorders around it)             │   │
//! │  │                                                                 │   │
//! │  │  2. Encode + backend.set(key, payload)                         │   │
//! │  │                                                                 │   │
//! │  │  3. Retry: retryable error → backoff sleep → pick up newer     │   │
//! │  │     queued saves → write again (max_retries)                   │   │
//! │  │                                                                 │   │
//! │  │  4. Flush acks once everything before it was handled           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  The writer never touches the in-memory cart. A snapshot that cannot   │
//! │  be written is logged and dropped; memory stays as the user left it.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use gomarket_core::{encode_cart, CartLine};
use gomarket_db::KeyValueStore;

use crate::config::PersistenceSettings;

// =============================================================================
// Commands
// =============================================================================

/// Work items for the writer task.
#[derive(Debug)]
pub(crate) enum WriteCommand {
    /// Persist this post-mutation snapshot.
    Save {
        revision: u64,
        snapshot: Arc<[CartLine]>,
    },

    /// Ack once every earlier save was written or given up on.
    Flush(oneshot::Sender<()>),

    /// Stop after handling every earlier command, then ack.
    Shutdown(oneshot::Sender<()>),
}

// =============================================================================
// Statistics
// =============================================================================

/// Counters describing what the writer has done so far.
#[derive(Debug, Default)]
pub struct PersistenceStats {
    persisted_revision: AtomicU64,
    writes: AtomicU64,
    failed_attempts: AtomicU64,
    dropped: AtomicU64,
}

impl PersistenceStats {
    /// Revision of the newest snapshot known to be in storage (0 = none yet).
    pub fn persisted_revision(&self) -> u64 {
        self.persisted_revision.load(Ordering::Acquire)
    }

    /// Successful backend writes.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Backend writes that returned an error, retried or not.
    pub fn failed_attempts(&self) -> u64 {
        self.failed_attempts.load(Ordering::Relaxed)
    }

    /// Snapshots abandoned after retries ran out.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn record_write(&self, revision: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.persisted_revision.fetch_max(revision, Ordering::AcqRel);
    }

    fn record_failure(&self) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
}

// =============================================================================
// Persister
// =============================================================================

/// Drains the write queue into the storage backend.
pub(crate) struct Persister {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    policy: PersistenceSettings,
    rx: mpsc::UnboundedReceiver<WriteCommand>,

    /// Control command pulled off the queue while coalescing saves.
    deferred: Option<WriteCommand>,

    stats: Arc<PersistenceStats>,
}

impl Persister {
    pub(crate) fn new(
        backend: Arc<dyn KeyValueStore>,
        key: String,
        policy: PersistenceSettings,
        rx: mpsc::UnboundedReceiver<WriteCommand>,
        stats: Arc<PersistenceStats>,
    ) -> Self {
        Persister {
            backend,
            key,
            policy,
            rx,
            deferred: None,
            stats,
        }
    }

    /// Runs until shutdown is requested or every store handle is dropped.
    pub(crate) async fn run(mut self) {
        debug!(key = %self.key, "Cart writer starting");

        let mut shutdown_ack = None;

        while let Some(command) = self.next_command().await {
            match command {
                WriteCommand::Save { revision, snapshot } => {
                    let (revision, snapshot) = self.coalesce(revision, snapshot);
                    self.write(revision, snapshot).await;
                }
                WriteCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
                WriteCommand::Shutdown(ack) => {
                    shutdown_ack = Some(ack);
                    break;
                }
            }
        }

        self.rx.close();
        info!(
            key = %self.key,
            persisted_revision = self.stats.persisted_revision(),
            dropped = self.stats.dropped(),
            "Cart writer stopped"
        );

        if let Some(ack) = shutdown_ack {
            let _ = ack.send(());
        }
    }

    async fn next_command(&mut self) -> Option<WriteCommand> {
        match self.deferred.take() {
            Some(command) => Some(command),
            None => self.rx.recv().await,
        }
    }

    /// Replaces `snapshot` with the newest save queued directly behind it.
    ///
    /// Stops at the first flush or shutdown and parks it in `deferred`.
    fn coalesce(
        &mut self,
        mut revision: u64,
        mut snapshot: Arc<[CartLine]>,
    ) -> (u64, Arc<[CartLine]>) {
        if self.deferred.is_some() {
            return (revision, snapshot);
        }

        let mut skipped = 0usize;
        while let Ok(command) = self.rx.try_recv() {
            match command {
                WriteCommand::Save {
                    revision: newer,
                    snapshot: newer_snapshot,
                } => {
                    revision = newer;
                    snapshot = newer_snapshot;
                    skipped += 1;
                }
                other => {
                    self.deferred = Some(other);
                    break;
                }
            }
        }

        if skipped > 0 {
            debug!(skipped, revision, "Coalesced queued cart saves");
        }

        (revision, snapshot)
    }

    /// Writes one snapshot, retrying retryable failures with backoff.
    async fn write(&mut self, mut revision: u64, mut snapshot: Arc<[CartLine]>) {
        let mut backoff = self.create_backoff();
        let mut retries = 0u32;

        loop {
            let payload = match encode_cart(&snapshot) {
                Ok(payload) => payload,
                Err(e) => {
                    error!(error = %e, revision, "Failed to encode cart snapshot");
                    self.stats.record_drop();
                    return;
                }
            };

            match self.backend.set(&self.key, &payload).await {
                Ok(()) => {
                    self.stats.record_write(revision);
                    debug!(
                        revision,
                        lines = snapshot.len(),
                        bytes = payload.len(),
                        "Cart persisted"
                    );
                    return;
                }
                Err(e) => {
                    self.stats.record_failure();

                    if !e.is_retryable() || retries >= self.policy.max_retries {
                        error!(
                            error = %e,
                            revision,
                            retries,
                            "Dropping cart snapshot after failed write"
                        );
                        self.stats.record_drop();
                        return;
                    }

                    retries += 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.policy.max_backoff());
                    warn!(
                        error = %e,
                        revision,
                        attempt = retries,
                        max_retries = self.policy.max_retries,
                        ?delay,
                        "Cart write failed, retrying"
                    );

                    tokio::time::sleep(delay).await;

                    (revision, snapshot) = self.coalesce(revision, snapshot);
                }
            }
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.policy.initial_backoff(),
            max_interval: self.policy.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();
        backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomarket_db::MemoryStore;

    fn line(id: &str) -> CartLine {
        CartLine::new(id, "Hat", "https://img/hat.png", 9.99)
    }

    fn save(revision: u64, ids: &[&str]) -> WriteCommand {
        WriteCommand::Save {
            revision,
            snapshot: ids.iter().map(|id| line(id)).collect::<Vec<_>>().into(),
        }
    }

    fn persister(
        backend: Arc<dyn KeyValueStore>,
    ) -> (
        Persister,
        mpsc::UnboundedSender<WriteCommand>,
        Arc<PersistenceStats>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(PersistenceStats::default());
        let persister = Persister::new(
            backend,
            "cart".to_string(),
            PersistenceSettings::default(),
            rx,
            stats.clone(),
        );
        (persister, tx, stats)
    }

    #[tokio::test]
    async fn test_consecutive_saves_coalesce_to_newest() {
        let backend = Arc::new(MemoryStore::new());
        let (persister, tx, stats) = persister(backend.clone());

        tx.send(save(1, &["a"])).unwrap();
        tx.send(save(2, &["a", "b"])).unwrap();
        tx.send(save(3, &["a", "b", "c"])).unwrap();
        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(WriteCommand::Shutdown(ack_tx)).unwrap();

        persister.run().await;
        ack_rx.await.unwrap();

        assert_eq!(stats.writes(), 1);
        assert_eq!(stats.persisted_revision(), 3);
        let stored = backend.get("cart").await.unwrap().unwrap();
        assert!(stored.contains("\"c\""));
    }

    #[tokio::test]
    async fn test_flush_is_not_reordered() {
        let backend = Arc::new(MemoryStore::new());
        let (persister, tx, stats) = persister(backend.clone());
        let handle = tokio::spawn(persister.run());

        tx.send(save(1, &["a"])).unwrap();
        let (flush_tx, flush_rx) = oneshot::channel();
        tx.send(WriteCommand::Flush(flush_tx)).unwrap();
        tx.send(save(2, &["a", "b"])).unwrap();

        flush_rx.await.unwrap();
        assert!(stats.persisted_revision() >= 1);

        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(WriteCommand::Shutdown(ack_tx)).unwrap();
        ack_rx.await.unwrap();
        handle.await.unwrap();

        assert_eq!(stats.persisted_revision(), 2);
    }

    #[tokio::test]
    async fn test_writer_exits_when_senders_dropped() {
        let backend = Arc::new(MemoryStore::new());
        let (persister, tx, stats) = persister(backend.clone());

        tx.send(save(1, &["a"])).unwrap();
        drop(tx);

        persister.run().await;

        assert_eq!(stats.persisted_revision(), 1);
        assert!(backend.get("cart").await.unwrap().is_some());
    }

    #[test]
    fn test_backoff_starts_at_initial_interval() {
        let (tx, rx) = mpsc::unbounded_channel::<WriteCommand>();
        drop(tx);
        let persister = Persister::new(
            Arc::new(MemoryStore::new()),
            "cart".to_string(),
            PersistenceSettings::default(),
            rx,
            Arc::new(PersistenceStats::default()),
        );

        let backoff = persister.create_backoff();

        assert_eq!(backoff.current_interval, persister.policy.initial_backoff());
        assert_eq!(backoff.max_interval, persister.policy.max_backoff());
    }
}
