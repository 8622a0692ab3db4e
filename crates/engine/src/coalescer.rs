//! Debounced request coalescing.
//!
//! Lookups for distinct ids that arrive within the debounce window are
//! collected into one batch, and concurrent lookups for the same id share a
//! single fetch. The window is trailing-edge: every newly queued id restarts
//! it, so a batch is dispatched only after the queue has been quiet for
//! [`CoalescerConfig::debounce`], or once [`CoalescerConfig::max_wait`] has
//! elapsed since the first id of the window, when a ceiling is configured.
//!
//! Once a batch is dispatched its ids stay in the queue until it settles, so
//! late callers for those ids join the in-flight fetch. Ids queued after the
//! snapshot wait for the next window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indexmap::IndexMap;
use pronouns_types::PronounCode;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::resolver::BatchResolver;

/// Quiet period used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerConfig {
    /// Quiet period after the last newly queued id before a batch is sent.
    pub debounce: Duration,
    /// Upper bound on how long the first id of a window may wait.
    pub max_wait: Option<Duration>,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_wait: None,
        }
    }
}

struct PendingLookup {
    waiters: Vec<oneshot::Sender<PronounCode>>,
    dispatched: bool,
}

#[derive(Default)]
struct QueueState {
    pending: IndexMap<String, PendingLookup>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    window_opened_at: Option<Instant>,
}

/// Collects lookups into debounced batches and fans results out to waiters.
pub struct RequestCoalescer {
    resolver: BatchResolver,
    config: CoalescerConfig,
    state: Mutex<QueueState>,
}

impl RequestCoalescer {
    pub fn new(resolver: BatchResolver, config: CoalescerConfig) -> Self {
        Self {
            resolver,
            config,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn config(&self) -> CoalescerConfig {
        self.config
    }

    /// Resolve from the cache when it holds a real code, otherwise queue.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn lookup(self: &Arc<Self>, id: &str) -> oneshot::Receiver<PronounCode> {
        if let Some(code) = self.resolver.cache().get(id).filter(|code| !code.is_unspecified()) {
            let (sender, receiver) = oneshot::channel();
            let _ = sender.send(code);
            return receiver;
        }
        self.request(id)
    }

    /// Queue a lookup for `id` regardless of what the cache holds.
    ///
    /// Joins the pending entry when one exists; otherwise creates it and
    /// restarts the debounce window. Must be called from within a Tokio runtime.
    pub fn request(self: &Arc<Self>, id: &str) -> oneshot::Receiver<PronounCode> {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.lock_state();

        if let Some(entry) = state.pending.get_mut(id) {
            entry.waiters.push(sender);
            let queued = !entry.dispatched;
            trace!(%id, waiters = entry.waiters.len(), in_flight = !queued, "joined pending lookup");
            if queued && state.timer.as_ref().is_none_or(JoinHandle::is_finished) {
                // The timer for this window died without firing, e.g. its runtime shut down.
                warn!(%id, "pending lookup lost its batch timer; rescheduling");
                state.window_opened_at = None;
                self.schedule(&mut state);
            }
            return receiver;
        }

        state.pending.insert(
            id.to_string(),
            PendingLookup {
                waiters: vec![sender],
                dispatched: false,
            },
        );
        self.schedule(&mut state);
        receiver
    }

    /// Number of ids queued or in flight.
    pub fn pending_len(&self) -> usize {
        self.lock_state().pending.len()
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule(self: &Arc<Self>, state: &mut QueueState) {
        let now = Instant::now();
        let opened_at = *state.window_opened_at.get_or_insert(now);
        let delay = match self.config.max_wait {
            Some(max_wait) => self
                .config
                .debounce
                .min((opened_at + max_wait).saturating_duration_since(now)),
            None => self.config.debounce,
        };

        state.generation += 1;
        let generation = state.generation;
        if let Some(previous) = state.timer.take() {
            previous.abort();
        }

        let coalescer = Arc::clone(self);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coalescer.fire(generation).await;
        }));
    }

    async fn fire(&self, generation: u64) {
        let snapshot: Vec<String> = {
            let mut state = self.lock_state();
            // A newer schedule superseded this timer after it woke up.
            if state.generation != generation {
                return;
            }
            state.timer = None;
            state.window_opened_at = None;
            state
                .pending
                .iter_mut()
                .filter(|(_, entry)| !entry.dispatched)
                .map(|(id, entry)| {
                    entry.dispatched = true;
                    id.clone()
                })
                .collect()
        };

        if snapshot.is_empty() {
            return;
        }

        debug!(batch_size = snapshot.len(), "dispatching pronoun batch");
        let batch = InFlightBatch {
            coalescer: self,
            ids: snapshot,
            settled: false,
        };
        let resolved = self.resolver.resolve(&batch.ids).await;
        batch.settle(&resolved);
    }

    fn settle_ids<F>(&self, ids: &[String], value_for: F)
    where
        F: Fn(&str) -> PronounCode,
    {
        let mut state = self.lock_state();
        for id in ids {
            let Some(entry) = state.pending.swap_remove(id) else {
                continue;
            };
            let code = value_for(id);
            for waiter in entry.waiters {
                let _ = waiter.send(code);
            }
        }
    }
}

/// Settles every waiter of a dispatched batch exactly once, even when the
/// batch task is aborted or dropped with its runtime before the lookup returns.
///
/// A panicking lookup is covered only when panics unwind. Release builds use
/// `panic = "abort"`, where a panic ends the process instead.
struct InFlightBatch<'a> {
    coalescer: &'a RequestCoalescer,
    ids: Vec<String>,
    settled: bool,
}

impl InFlightBatch<'_> {
    fn settle(mut self, resolved: &HashMap<String, PronounCode>) {
        self.coalescer.settle_ids(&self.ids, |id| {
            resolved.get(id).copied().unwrap_or(PronounCode::Unspecified)
        });
        self.settled = true;
    }
}

impl Drop for InFlightBatch<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(batch_size = self.ids.len(), "pronoun batch abandoned; settling waiters as unspecified");
            self.coalescer.settle_ids(&self.ids, |_| PronounCode::Unspecified);
        }
    }
}
