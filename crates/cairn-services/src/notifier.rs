//! Change notifier — coalesces roster mutations into batched callbacks.
//!
//! A single gossip round can admit many records back to back. Subscribers
//! want one callback with the whole batch, not one per record, so the
//! notifier runs a single-flight debounce: the first push after a flush
//! schedules one flush task, later pushes join the same pending batch.
//! The flush task yields to the scheduler once before delivering, which
//! naturally coalesces same-tick bursts (an initial full membership dump
//! arrives as one batch) and keeps delivery out of the mutation path.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, RwLock};

use cairn_core::peer::PeerRecord;

/// Callback invoked once per flush with the admitted records, in
/// admission order.
pub type Subscriber = Box<dyn Fn(&[PeerRecord]) + Send + Sync>;

/// Pending batch plus the single-flight gate.
#[derive(Default)]
struct FlushState {
    pending: Vec<PeerRecord>,
    scheduled: bool,
}

struct Inner {
    state: Mutex<FlushState>,
    subscribers: RwLock<Vec<Subscriber>>,
}

/// Debounced notification fan-out. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<Inner>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(FlushState::default()),
                subscribers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register a callback. Subscribers are invoked in registration order,
    /// each with the full batch, once per flush for the notifier's lifetime.
    pub fn subscribe(&self, callback: impl Fn(&[PeerRecord]) + Send + Sync + 'static) {
        self.inner
            .subscribers
            .write()
            .expect("subscriber list poisoned")
            .push(Box::new(callback));
    }

    /// Append an admitted record to the pending batch and make sure a
    /// flush is scheduled. Must be called from within a tokio runtime.
    pub fn push(&self, record: PeerRecord) {
        let mut state = self.inner.state.lock().expect("notifier state poisoned");
        state.pending.push(record);
        if state.scheduled {
            // A flush is already on its way; this record joins its batch.
            return;
        }
        state.scheduled = true;
        drop(state);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            inner.flush();
        });
    }

    /// Records currently waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.inner
            .state
            .lock()
            .expect("notifier state poisoned")
            .pending
            .len()
    }
}

impl Inner {
    fn flush(&self) {
        let batch = {
            let mut state = self.state.lock().expect("notifier state poisoned");
            state.scheduled = false;
            std::mem::take(&mut state.pending)
        };
        if batch.is_empty() {
            return;
        }

        let subscribers = self.subscribers.read().expect("subscriber list poisoned");
        for (index, subscriber) in subscribers.iter().enumerate() {
            // Log-and-continue: one panicking subscriber must not starve
            // the rest of the batch.
            if catch_unwind(AssertUnwindSafe(|| subscriber(&batch))).is_err() {
                tracing::warn!(subscriber = index, "membership subscriber panicked");
            }
        }
        tracing::trace!(records = batch.len(), "membership batch delivered");
    }
}
