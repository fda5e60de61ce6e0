//! Bounded database connection pool with a background replenishing producer.
//!
//! The pool is an explicit value: construct it once at process start and hand
//! clones to request handlers. Checked-out connections travel as
//! [`ConnectionSlot`]s; the free queue is an unbounded channel fed by the
//! producer task and by [`release`](ConnectionPool::release).

mod connector;
mod producer;
mod slot;

pub use connector::{Connector, PooledConnection};
pub use slot::ConnectionSlot;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::error::QuizEngineError;

/// Broken slots discarded within a single `acquire` before giving up.
const MAX_INVALID_DISCARDS: usize = 8;

pub(crate) struct PoolInner<C: Connector> {
    config: PoolConfig,
    connector: C,
    /// Taken (and dropped) during shutdown so a racing `release` cannot park
    /// a slot after the final drain.
    free_tx: Mutex<Option<UnboundedSender<ConnectionSlot<C::Conn>>>>,
    free_rx: AsyncMutex<UnboundedReceiver<ConnectionSlot<C::Conn>>>,
    free_count: AtomicUsize,
    /// Every connection open anywhere: parked in the free queue or checked out.
    open_count: AtomicUsize,
    in_use: Mutex<HashSet<u64>>,
    next_slot_id: AtomicU64,
    shutdown: CancellationToken,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connector> PoolInner<C> {
    fn push_free(&self, slot: ConnectionSlot<C::Conn>) -> bool {
        let guard = lock_unpoisoned(&self.free_tx);
        let Some(tx) = guard.as_ref() else {
            return false;
        };
        if tx.send(slot).is_ok() {
            self.free_count.fetch_add(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    fn note_closed(&self) {
        self.open_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Bounded pool of reusable database connections.
///
/// `acquire`/`release` may be called concurrently from any number of tasks;
/// exactly one producer task replenishes the free queue for the pool's
/// lifetime. Cloning is cheap and every clone shares the same pool.
pub struct ConnectionPool<C: Connector> {
    inner: Arc<PoolInner<C>>,
}

impl<C: Connector> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> ConnectionPool<C> {
    /// Build a pool around `connector`. Performs no I/O; connections are
    /// opened by the producer after [`startup`](Self::startup).
    ///
    /// # Errors
    /// Returns [`QuizEngineError::ConfigError`] for an invalid `config`.
    pub fn new(config: PoolConfig, connector: C) -> Result<Self, QuizEngineError> {
        config.validate()?;
        let (free_tx, free_rx) = mpsc::unbounded_channel();
        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                connector,
                free_tx: Mutex::new(Some(free_tx)),
                free_rx: AsyncMutex::new(free_rx),
                free_count: AtomicUsize::new(0),
                open_count: AtomicUsize::new(0),
                in_use: Mutex::new(HashSet::new()),
                next_slot_id: AtomicU64::new(1),
                shutdown: CancellationToken::new(),
                producer: Mutex::new(None),
            }),
        })
    }

    /// Spawn the background producer. Calling it again is a no-op.
    pub fn startup(&self) {
        let mut guard = lock_unpoisoned(&self.inner.producer);
        if guard.is_some() {
            return;
        }
        tracing::info!(
            min = self.inner.config.min_connections,
            max = self.inner.config.max_connections,
            "starting connection pool"
        );
        *guard = Some(tokio::spawn(producer::run(Arc::clone(&self.inner))));
    }

    /// Stop the producer and close every pooled connection.
    ///
    /// Unconditional: slots parked in the free queue are closed here; slots
    /// checked out at this moment are closed the instant their holders release
    /// them. Tasks still waiting in [`acquire`](Self::acquire) are woken with
    /// [`QuizEngineError::PoolInterrupted`].
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        // Close the sender before draining: a release that raced past the
        // shutdown check can then only fail its push and close the slot
        // itself; anything it managed to send lands ahead of the drain below.
        drop(lock_unpoisoned(&self.inner.free_tx).take());

        let handle = lock_unpoisoned(&self.inner.producer).take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "connection producer did not stop cleanly");
            }
        }

        let mut rx = self.inner.free_rx.lock().await;
        while let Ok(slot) = rx.try_recv() {
            self.inner.free_count.fetch_sub(1, Ordering::SeqCst);
            self.inner.note_closed();
            drop(slot);
        }
        lock_unpoisoned(&self.inner.in_use).clear();
        tracing::info!("connection pool shut down");
    }

    /// Check out a connection, waiting up to the configured acquire timeout.
    ///
    /// Broken connections coming off the free queue are discarded and the wait
    /// continues against the same deadline, capped at a fixed number of
    /// discards so a run of dead connections cannot loop forever. No fairness
    /// between concurrent waiters is promised.
    ///
    /// # Errors
    /// [`QuizEngineError::PoolExhausted`] when the timeout elapses with no
    /// valid slot; [`QuizEngineError::PoolInterrupted`] when the pool shuts
    /// down while waiting.
    pub async fn acquire(&self) -> Result<ConnectionSlot<C::Conn>, QuizEngineError> {
        let budget = self.inner.config.acquire_timeout();
        let deadline = Instant::now() + budget;
        let mut discarded = 0usize;

        loop {
            if self.inner.shutdown.is_cancelled() {
                return Err(QuizEngineError::PoolInterrupted);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(QuizEngineError::PoolExhausted(budget));
            }

            let popped = tokio::select! {
                () = self.inner.shutdown.cancelled() => {
                    return Err(QuizEngineError::PoolInterrupted);
                }
                popped = tokio::time::timeout(remaining, async {
                    self.inner.free_rx.lock().await.recv().await
                }) => popped,
            };

            let slot = match popped {
                Ok(Some(slot)) => slot,
                // The sender is dropped during shutdown; a closed channel
                // means teardown.
                Ok(None) => return Err(QuizEngineError::PoolInterrupted),
                Err(_) => return Err(QuizEngineError::PoolExhausted(budget)),
            };
            self.inner.free_count.fetch_sub(1, Ordering::SeqCst);

            if slot.is_valid() {
                lock_unpoisoned(&self.inner.in_use).insert(slot.id());
                return Ok(slot);
            }

            tracing::debug!(slot = slot.id(), "discarding broken connection from free queue");
            self.inner.note_closed();
            drop(slot);
            discarded += 1;
            if discarded >= MAX_INVALID_DISCARDS {
                return Err(QuizEngineError::PoolExhausted(budget));
            }
        }
    }

    /// Return a checked-out slot to the pool.
    ///
    /// A slot that no longer probes valid is dropped instead of re-pooled; the
    /// producer notices the deficit and opens a replacement on its next tick.
    /// After shutdown every returned slot is closed.
    pub fn release(&self, slot: ConnectionSlot<C::Conn>) {
        lock_unpoisoned(&self.inner.in_use).remove(&slot.id());

        if self.inner.shutdown.is_cancelled() {
            self.inner.note_closed();
            return;
        }
        if !slot.is_valid() {
            tracing::debug!(slot = slot.id(), "dropping broken connection on release");
            self.inner.note_closed();
            return;
        }
        if !self.inner.push_free(slot) {
            self.inner.note_closed();
        }
    }

    /// Run `f` against a pooled connection and release it afterwards, even if
    /// the future panics. This is the guaranteed-cleanup block the data-access
    /// layer wraps its SQL in.
    ///
    /// # Errors
    /// Propagates acquisition failures; `f`'s own outcome travels through `R`.
    pub async fn with_connection<R, F>(&self, f: F) -> Result<R, QuizEngineError>
    where
        F: for<'a> FnOnce(&'a mut C::Conn) -> BoxFuture<'a, R>,
    {
        let mut slot = self.acquire().await?;
        let mut guard = CheckoutGuard {
            pool: self.clone(),
            id: slot.id(),
            armed: true,
        };
        let out = f(slot.conn_mut()).await;
        guard.armed = false;
        self.release(slot);
        Ok(out)
    }

    /// Connections parked in the free queue.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.inner.free_count.load(Ordering::SeqCst)
    }

    /// Connections currently checked out.
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        lock_unpoisoned(&self.inner.in_use).len()
    }

    /// Every open connection, free plus checked out.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.inner.open_count.load(Ordering::SeqCst)
    }
}

/// Repairs the pool's bookkeeping if a scoped checkout unwinds.
///
/// The slot itself lives on the caller's stack, so a panic already closes the
/// connection by dropping it; this guard only settles the in-use set and the
/// open count. On the normal path it is disarmed before release.
struct CheckoutGuard<C: Connector> {
    pool: ConnectionPool<C>,
    id: u64,
    armed: bool,
}

impl<C: Connector> Drop for CheckoutGuard<C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        lock_unpoisoned(&self.pool.inner.in_use).remove(&self.id);
        self.pool.inner.note_closed();
        tracing::debug!(slot = self.id, "connection closed while unwinding");
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
