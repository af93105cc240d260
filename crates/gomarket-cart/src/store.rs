//! # Cart Store
//!
//! The single source of truth for the cart while the app runs.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CartStore Lifecycle                             │
//! │                                                                         │
//! │  CartStore::new(backend, config)                                       │
//! │       │                                                                 │
//! │       ├── state: empty cart, revision 0                                │
//! │       │                                                                 │
//! │       └── spawn ONE task:                                              │
//! │             1. backend.get(key)          (exactly once)                │
//! │             2. decode, replay early edits (atomic replace)             │
//! │             3. mark restored                                           │
//! │             4. run the writer            (rest of the store's life)    │
//! │                                                                         │
//! │  add_to_cart / increment / decrement                                   │
//! │       │                                                                 │
//! │       │  under the state lock:                                         │
//! │       │    mutate → revision += 1 → publish snapshot → enqueue Save    │
//! │       │    (before the restore: record the edit, enqueue nothing)      │
//! │       ▼                                                                 │
//! │  returns immediately (never waits on storage)                          │
//! │                                                                         │
//! │  flush().await   every earlier save handled                            │
//! │  close().await   flush + stop the writer                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Restore Race
//! Mutations that land before the restore finished are applied to the empty
//! cart right away and also recorded. The restore then rebuilds the cart from
//! the persisted lines and replays the recorded mutations on top, so nothing
//! from either side is lost. Only that merged cart is saved. `flush` and
//! `close` wait for the restore, so no write can reach storage before it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use gomarket_core::validation::validate_line;
use gomarket_core::{decode_cart, Cart, CartChange, CartLine, MIN_LINE_QUANTITY};
use gomarket_db::KeyValueStore;

use crate::config::CartConfig;
use crate::error::{CartError, CartResult};
use crate::persister::{PersistenceStats, Persister, WriteCommand};

// =============================================================================
// Shared State
// =============================================================================

struct CartState {
    cart: Cart,

    /// Effective mutations applied since construction.
    revision: u64,

    /// Mutations applied while the restore is still running. `None` after.
    early: Option<Vec<Mutation>>,
}

#[derive(Debug, Clone)]
enum Mutation {
    Add(CartLine),
    Increment(String),
    Decrement(String),
}

impl Mutation {
    fn name(&self) -> &'static str {
        match self {
            Mutation::Add(_) => "add_to_cart",
            Mutation::Increment(_) => "increment",
            Mutation::Decrement(_) => "decrement",
        }
    }

    fn id(&self) -> &str {
        match self {
            Mutation::Add(line) => &line.id,
            Mutation::Increment(id) | Mutation::Decrement(id) => id,
        }
    }

    /// Returns whether the cart changed.
    fn apply(&self, cart: &mut Cart) -> bool {
        match self {
            Mutation::Add(line) => cart.add(line.clone()) != CartChange::Rejected,
            Mutation::Increment(id) => cart.increment(id),
            Mutation::Decrement(id) => cart.decrement(id),
        }
    }
}

/// State reachable from both the store handles and the background task.
///
/// Holds no write-queue sender: the task must end once every `CartStore`
/// handle is gone.
struct StoreShared {
    state: Mutex<CartState>,
    snapshots: watch::Sender<Arc<[CartLine]>>,
    restored: watch::Sender<bool>,
}

impl StoreShared {
    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct StoreInner {
    shared: Arc<StoreShared>,
    writer: mpsc::UnboundedSender<WriteCommand>,
    closed: AtomicBool,
    stats: Arc<PersistenceStats>,
    key: String,
}

// =============================================================================
// Cart Store
// =============================================================================

/// Handle to the cart. Cheap to clone; all clones share one cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.inner.key)
            .field("revision", &self.revision())
            .field("restored", &self.is_restored())
            .finish()
    }
}

impl CartStore {
    /// Creates the store and starts its restore/writer task.
    ///
    /// The cart is empty until the restore completes; see [`Self::restored`].
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new(backend: Arc<dyn KeyValueStore>, config: &CartConfig) -> Self {
        let key = config.storage_key().to_string();
        let (writer, rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(Arc::<[CartLine]>::from(Vec::new()));
        let (restored, _) = watch::channel(false);
        let stats = Arc::new(PersistenceStats::default());

        let shared = Arc::new(StoreShared {
            state: Mutex::new(CartState {
                cart: Cart::new(),
                revision: 0,
                early: Some(Vec::new()),
            }),
            snapshots,
            restored,
        });

        let persister = Persister::new(
            backend.clone(),
            key.clone(),
            config.persistence.clone(),
            rx,
            stats.clone(),
        );

        let task_shared = shared.clone();
        let task_key = key.clone();
        let task_writer = writer.clone();
        tokio::spawn(async move {
            // The writer clone is dropped here so the queue closes with the last handle
            restore(&task_shared, backend.as_ref(), &task_key, task_writer).await;
            persister.run().await;
        });

        info!(key = %key, "Cart store created");

        CartStore {
            inner: Arc::new(StoreInner {
                shared,
                writer,
                closed: AtomicBool::new(false),
                stats,
                key,
            }),
        }
    }

    /// Creates the store and waits for the restore to finish.
    pub async fn open(backend: Arc<dyn KeyValueStore>, config: &CartConfig) -> Self {
        let store = Self::new(backend, config);
        store.restored().await;
        store
    }

    /// Resolves once the restore attempt has finished, whatever its outcome.
    pub async fn restored(&self) {
        let mut rx = self.inner.shared.restored.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Checks whether the restore attempt has finished.
    pub fn is_restored(&self) -> bool {
        *self.inner.shared.restored.borrow()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of `line`.
    ///
    /// An id already in the cart goes up by one in place; otherwise the line
    /// is appended with quantity 1. A line that could not be restored later
    /// (blank or oversized id, non-finite price) is refused with
    /// [`CartChange::Rejected`] and the cart is left alone.
    pub fn add_to_cart(&self, line: CartLine) -> CartChange {
        if let Err(e) = validate_line(&line) {
            warn!(id = %line.id, error = %e, "Refusing cart line that cannot be persisted");
            return CartChange::Rejected;
        }

        match self.mutate(Mutation::Add(line)) {
            Some(quantity) if quantity > MIN_LINE_QUANTITY => CartChange::Merged { quantity },
            Some(_) => CartChange::Added,
            None => CartChange::Rejected,
        }
    }

    /// Raises the quantity of `id` by one. Returns whether anything changed.
    pub fn increment(&self, id: &str) -> bool {
        self.mutate(Mutation::Increment(id.to_string())).is_some()
    }

    /// Lowers the quantity of `id` by one, never below 1.
    ///
    /// Returns whether anything changed.
    pub fn decrement(&self, id: &str) -> bool {
        self.mutate(Mutation::Decrement(id.to_string())).is_some()
    }

    /// Applies `mutation` and returns the new quantity of its line, or `None`
    /// when the cart did not change.
    fn mutate(&self, mutation: Mutation) -> Option<u32> {
        let mut state = self.inner.shared.lock();

        if !mutation.apply(&mut state.cart) {
            debug!(op = mutation.name(), id = %mutation.id(), "Cart unchanged");
            return None;
        }

        state.revision += 1;
        let revision = state.revision;
        let quantity = state.cart.get(mutation.id()).map_or(0, |l| l.quantity);
        let snapshot: Arc<[CartLine]> = Arc::from(state.cart.lines());

        self.inner.shared.snapshots.send_replace(snapshot.clone());

        debug!(
            op = mutation.name(),
            id = %mutation.id(),
            revision,
            quantity,
            "Cart updated"
        );

        if let Some(early) = state.early.as_mut() {
            debug!(op = mutation.name(), revision, "Restore pending, save deferred");
            early.push(mutation);
            return Some(quantity);
        }

        if self.inner.closed.load(Ordering::Acquire)
            || self
                .inner
                .writer
                .send(WriteCommand::Save { revision, snapshot })
                .is_err()
        {
            warn!(
                op = mutation.name(),
                revision,
                "Cart persistence has stopped; change kept in memory only"
            );
        }

        Some(quantity)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current lines, in insertion order.
    pub fn products(&self) -> Vec<CartLine> {
        self.inner.shared.lock().cart.lines().to_vec()
    }

    /// Looks up a line by id.
    pub fn get(&self, id: &str) -> Option<CartLine> {
        self.inner.shared.lock().cart.get(id).cloned()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.inner.shared.lock().cart.total_quantity()
    }

    /// Number of effective mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.inner.shared.lock().revision
    }

    /// Observes every state transition, including the restore.
    pub fn subscribe(&self) -> watch::Receiver<Arc<[CartLine]>> {
        self.inner.shared.snapshots.subscribe()
    }

    /// Writer counters.
    pub fn persistence_stats(&self) -> &PersistenceStats {
        &self.inner.stats
    }

    /// The key the cart is stored under.
    pub fn storage_key(&self) -> &str {
        &self.inner.key
    }

    // =========================================================================
    // Persistence Control
    // =========================================================================

    /// Waits for the restore, then until every save enqueued before this
    /// call was handled.
    pub async fn flush(&self) -> CartResult<()> {
        self.restored().await;
        let (tx, rx) = oneshot::channel();

        self.inner
            .writer
            .send(WriteCommand::Flush(tx))
            .map_err(|_| CartError::PersistenceStopped)?;

        rx.await.map_err(|_| CartError::PersistenceStopped)
    }

    /// Flushes pending saves and stops the writer.
    ///
    /// Calling it again is a no-op. Later mutations only change memory.
    pub async fn close(&self) -> CartResult<()> {
        self.restored().await;
        let (tx, rx) = oneshot::channel();

        {
            // Taken so no save can slip in behind the shutdown command.
            let _state = self.inner.shared.lock();
            if self.inner.closed.swap(true, Ordering::AcqRel) {
                return Ok(());
            }
            self.inner
                .writer
                .send(WriteCommand::Shutdown(tx))
                .map_err(|_| CartError::PersistenceStopped)?;
        }

        rx.await.map_err(|_| CartError::PersistenceStopped)?;

        info!(
            key = %self.inner.key,
            persisted_revision = self.inner.stats.persisted_revision(),
            "Cart store closed"
        );
        Ok(())
    }
}

// =============================================================================
// Restore
// =============================================================================

async fn restore(
    shared: &StoreShared,
    backend: &dyn KeyValueStore,
    key: &str,
    writer: mpsc::UnboundedSender<WriteCommand>,
) {
    let lines = match backend.get(key).await {
        Ok(Some(payload)) => match decode_cart(&payload) {
            Ok(decoded) => {
                if decoded.skipped > 0 {
                    warn!(key = %key, skipped = decoded.skipped, "Dropped unreadable lines from persisted cart");
                }
                Some(decoded.lines)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Persisted cart is unreadable, starting empty");
                None
            }
        },
        Ok(None) => {
            debug!(key = %key, "No persisted cart");
            None
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read persisted cart, starting empty");
            None
        }
    };

    {
        let mut state = shared.lock();
        let early = state.early.take().unwrap_or_default();

        if let Some(lines) = lines {
            let mut cart = Cart::from_lines(lines);
            for mutation in &early {
                mutation.apply(&mut cart);
            }

            state.cart = cart;
            shared
                .snapshots
                .send_replace(Arc::from(state.cart.lines()));
            info!(
                key = %key,
                lines = state.cart.len(),
                replayed = early.len(),
                "Cart restored"
            );
        }

        if !early.is_empty() {
            let snapshot: Arc<[CartLine]> = Arc::from(state.cart.lines());
            let save = WriteCommand::Save {
                revision: state.revision,
                snapshot,
            };
            if writer.send(save).is_err() {
                warn!(key = %key, "Cart persistence has stopped; restored cart kept in memory only");
            }
        }
    }

    shared.restored.send_replace(true);
}
