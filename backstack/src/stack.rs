//! The overlay stack coordination core.
//!
//! [`OverlayStack`] is the single source of truth for which overlays are
//! open and in what order, kept bidirectionally consistent with a
//! [`NavigationHost`]: every push records one history entry, every pop
//! batch performs one backward traversal, and a traversal the stack did not
//! initiate (the user pressing back) closes exactly the topmost overlay.
//!
//! All mutating operations serialize through one FIFO lock that stays held
//! across the full navigation round-trip, so a second push or pop cannot
//! race ahead while an earlier one is still awaiting host confirmation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::error::StackError;
use crate::event::{OverlayKind, PopReason, StackEvent};
use crate::host::{NavEvent, NavigationHost};
use crate::id::EntryId;

/// Buffered stack events per receiver.
const EVENT_CAPACITY: usize = 16;

type PopCallback = Box<dyn FnOnce() + Send>;

/// Options for [`OverlayStack::push`].
pub struct PushOptions {
    id: Option<EntryId>,
    kind: OverlayKind,
    on_pop: PopCallback,
}

impl PushOptions {
    /// Create push options with the callback invoked when the entry closes.
    ///
    /// The callback fires at most once, and never for pops requested with
    /// the silent flag.
    pub fn new(on_pop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id: None,
            kind: OverlayKind::default(),
            on_pop: Box::new(on_pop),
        }
    }

    /// Use a caller-supplied id instead of a generated one.
    ///
    /// The id must be unique among currently-open entries; a colliding push
    /// is rejected with [`StackError::DuplicateId`].
    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Tag the entry with an overlay kind (default: [`OverlayKind::Modal`]).
    pub fn with_kind(mut self, kind: OverlayKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Options for [`OverlayStack::pop_with`].
#[derive(Debug, Clone, Default)]
pub struct PopOptions {
    id: Option<EntryId>,
    silent: bool,
}

impl PopOptions {
    /// Create default pop options: pop the tail, firing its callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only pop if the tail entry has this id.
    ///
    /// Guards close requests that may race with other stack changes; a
    /// mismatch makes the pop a no-op rather than closing the wrong
    /// overlay.
    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Suppress the entry's pop callback.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// Result of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pushed {
    /// Final id of the entry, caller-supplied or generated.
    pub id: EntryId,
    /// Zero-based position in the stack.
    pub index: usize,
}

struct Entry {
    id: EntryId,
    kind: OverlayKind,
}

#[derive(Default)]
struct State {
    entries: Vec<Entry>,
    /// Close callbacks, owned for exactly the entry's lifetime and removed
    /// unconditionally on pop, fired or not.
    callbacks: HashMap<EntryId, PopCallback>,
}

struct Inner {
    host: Arc<dyn NavigationHost>,
    /// Serializes mutating operations in FIFO order, held across the whole
    /// navigation round-trip.
    ops: Arc<Mutex<()>>,
    state: StdMutex<State>,
    events: broadcast::Sender<StackEvent>,
    /// Traversals requested by stack operations whose events the watcher
    /// has not consumed yet. The watcher skips one queued event per count,
    /// so a program pop's confirmation is never mistaken for an external
    /// back, no matter how late the watcher is scheduled.
    pending_traversals: AtomicUsize,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pop one tail entry in response to a traversal the stack did not
    /// initiate. Caller must hold the ops lock.
    fn pop_for_navigation(&self, observed_depth: usize) {
        let (entry, callback) = {
            let mut state = self.lock_state();
            if observed_depth >= state.entries.len() {
                return;
            }
            let Some(entry) = state.entries.pop() else {
                return;
            };
            let callback = state.callbacks.remove(&entry.id);
            (entry, callback)
        };

        log::debug!(
            "back navigation closed {:?} overlay {}",
            entry.kind,
            entry.id
        );
        if let Some(callback) = callback {
            callback();
        }
        let _ = self.events.send(StackEvent::Popped {
            id: entry.id,
            kind: entry.kind,
            reason: PopReason::Navigation,
        });
    }
}

/// Ordered, mutually-exclusive stack of open overlays, synchronized with a
/// navigation host.
///
/// Must be created inside a tokio runtime; construction spawns the task
/// that watches for user-initiated back traversals. Dropping the stack
/// removes that watcher.
///
/// Registries share one stack, typically behind an `Arc`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use backstack::{MemoryHistory, NavigationHost, OverlayStack, PushOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let history = MemoryHistory::new();
/// let stack = OverlayStack::new(Arc::new(history.clone()));
///
/// let pushed = stack.push(PushOptions::new(|| {})).await.unwrap();
/// assert_eq!(pushed.index, 0);
/// assert_eq!(history.current_depth(), Some(1));
///
/// stack.pop().await;
/// assert!(stack.is_empty());
/// assert_eq!(history.current_depth(), None);
/// # }
/// ```
pub struct OverlayStack {
    inner: Arc<Inner>,
    watcher: JoinHandle<()>,
    reconcile: Option<JoinHandle<()>>,
}

impl OverlayStack {
    /// Create a stack bound to `host`.
    ///
    /// If the host reports a non-zero depth left over from a previous
    /// session (reload with overlays open), the session is silently
    /// navigated back to depth zero first; pushes issued meanwhile queue
    /// behind that reconciliation.
    pub fn new(host: Arc<dyn NavigationHost>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = Arc::new(Inner {
            host,
            ops: Arc::new(Mutex::new(())),
            state: StdMutex::new(State::default()),
            events,
            pending_traversals: AtomicUsize::new(0),
        });

        // Subscribed before any traversal can be requested, so the watcher
        // observes every event and the pending count stays balanced.
        let watcher_rx = inner.host.subscribe();

        let mut reconcile = None;
        if let Some(stale) = inner.host.current_depth().filter(|depth| *depth > 0) {
            // The ops lock is freshly created, so this cannot contend; the
            // guard moves into the task and holds off pushes until the
            // session is back at depth zero.
            if let Ok(guard) = Arc::clone(&inner.ops).try_lock_owned() {
                let task_inner = Arc::clone(&inner);
                reconcile = Some(tokio::spawn(async move {
                    log::debug!("reconciling stale session depth {}", stale);
                    let rx = task_inner.host.subscribe();
                    task_inner.pending_traversals.fetch_add(1, Ordering::SeqCst);
                    task_inner.host.go_back(stale);
                    wait_for_depth(rx, 0).await;
                    drop(guard);
                }));
            }
        }

        let watcher = tokio::spawn(watch_external(Arc::clone(&inner), watcher_rx));

        Self {
            inner,
            watcher,
            reconcile,
        }
    }

    /// Push a new entry onto the stack.
    ///
    /// Generates an id if none was supplied, records the new depth on a
    /// fresh history entry, and resolves with the final id and its
    /// zero-based index. Rejects with [`StackError::DuplicateId`] if the
    /// supplied id is already open, leaving the stack unchanged.
    pub async fn push(&self, options: PushOptions) -> Result<Pushed, StackError> {
        let _guard = self.inner.ops.lock().await;

        let PushOptions { id, kind, on_pop } = options;
        let id = id.unwrap_or_else(EntryId::generate);

        let index = {
            let mut state = self.inner.lock_state();
            if state.entries.iter().any(|entry| entry.id == id) {
                return Err(StackError::DuplicateId(id));
            }
            state.entries.push(Entry {
                id: id.clone(),
                kind,
            });
            state.callbacks.insert(id.clone(), on_pop);
            state.entries.len() - 1
        };

        self.inner.host.push_depth(index + 1);
        log::debug!("pushed {:?} overlay {} at index {}", kind, id, index);
        let _ = self.inner.events.send(StackEvent::Pushed {
            id: id.clone(),
            index,
            kind,
        });

        Ok(Pushed { id, index })
    }

    /// Pop the tail entry, firing its callback.
    ///
    /// No-op on an empty stack; overlapping close requests are expected and
    /// must not surface as failures.
    pub async fn pop(&self) {
        self.pop_with(PopOptions::default()).await;
    }

    /// Pop the tail entry with explicit options.
    ///
    /// See [`PopOptions`] for the id guard and callback suppression.
    pub async fn pop_with(&self, options: PopOptions) {
        let _guard = self.inner.ops.lock().await;

        let (entry, callback, expected_depth) = {
            let mut state = self.inner.lock_state();
            let tail_matches = match state.entries.last() {
                None => false,
                Some(tail) => match &options.id {
                    None => true,
                    Some(want) => *want == tail.id,
                },
            };
            if !tail_matches {
                // Empty stack, or a close request that lost a race with
                // another stack change.
                return;
            }
            let Some(entry) = state.entries.pop() else {
                return;
            };
            let callback = state.callbacks.remove(&entry.id);
            (entry, callback, state.entries.len())
        };

        if !options.silent {
            if let Some(callback) = callback {
                callback();
            }
        }
        log::debug!("popped {:?} overlay {}", entry.kind, entry.id);
        let _ = self.inner.events.send(StackEvent::Popped {
            id: entry.id,
            kind: entry.kind,
            reason: PopReason::Requested,
        });

        self.settle_back(1, expected_depth).await;
    }

    /// Pop up to `count` entries from the tail, fewer if the stack is
    /// shorter.
    ///
    /// Callbacks fire for every removed entry, but the host performs one
    /// batched traversal with a single confirmation keyed to the final
    /// depth rather than one round trip per entry.
    pub async fn pop_many(&self, count: usize, silent: bool) {
        let _guard = self.inner.ops.lock().await;
        if count < 2 {
            log::warn!("pop_many called with count {}; use pop for a single entry", count);
        }
        self.pop_batch(count, silent).await;
    }

    /// Empty the stack unconditionally.
    ///
    /// Same batched mechanics as [`pop_many`](Self::pop_many); a no-op on
    /// an already-empty stack.
    pub async fn flush(&self, silent: bool) {
        let _guard = self.inner.ops.lock().await;
        self.pop_batch(usize::MAX, silent).await;
    }

    /// Position of the entry with `id`, or `None` if it is not open.
    ///
    /// Snapshot read for synchronous render-time lookups (z-order); does
    /// not serialize against in-flight operations.
    pub fn find_index(&self, id: &EntryId) -> Option<usize> {
        self.inner
            .lock_state()
            .entries
            .iter()
            .position(|entry| entry.id == *id)
    }

    /// Overlay kind of the entry with `id`, or `None` if it is not open.
    pub fn kind_of(&self, id: &EntryId) -> Option<OverlayKind> {
        self.inner
            .lock_state()
            .entries
            .iter()
            .find(|entry| entry.id == *id)
            .map(|entry| entry.kind)
    }

    /// Current number of open entries.
    pub fn len(&self) -> usize {
        self.inner.lock_state().entries.len()
    }

    /// Whether the stack has no open entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to stack change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StackEvent> {
        self.inner.events.subscribe()
    }

    /// Remove up to `count` tail entries and perform one batched traversal.
    /// Caller must hold the ops lock.
    async fn pop_batch(&self, count: usize, silent: bool) {
        let mut removed = Vec::new();
        let expected_depth = {
            let mut state = self.inner.lock_state();
            let keep = state.entries.len().saturating_sub(count);
            for entry in state.entries.split_off(keep) {
                let callback = state.callbacks.remove(&entry.id);
                removed.push((entry, callback));
            }
            state.entries.len()
        };

        if removed.is_empty() {
            return;
        }

        let steps = removed.len();
        for (entry, callback) in removed {
            if !silent {
                if let Some(callback) = callback {
                    callback();
                }
            }
            log::debug!("popped {:?} overlay {}", entry.kind, entry.id);
            let _ = self.inner.events.send(StackEvent::Popped {
                id: entry.id,
                kind: entry.kind,
                reason: PopReason::Requested,
            });
        }

        self.settle_back(steps, expected_depth).await;
    }

    /// Traverse `steps` back and wait for the host to confirm landing at
    /// `expected_depth`. Subscribes before traversing so the confirmation
    /// cannot be missed.
    async fn settle_back(&self, steps: usize, expected_depth: usize) {
        let rx = self.inner.host.subscribe();
        // Mark the traversal as program-initiated before requesting it, so
        // the watcher attributes its event correctly however late it runs.
        self.inner
            .pending_traversals
            .fetch_add(1, Ordering::SeqCst);
        self.inner.host.go_back(steps);
        wait_for_depth(rx, expected_depth).await;
    }
}

impl Drop for OverlayStack {
    fn drop(&mut self) {
        self.watcher.abort();
        if let Some(reconcile) = &self.reconcile {
            reconcile.abort();
        }
    }
}

/// Wait for a traversal event landing at `expected` depth, skipping
/// intermediate events.
async fn wait_for_depth(mut rx: broadcast::Receiver<NavEvent>, expected: usize) {
    loop {
        match rx.recv().await {
            Ok(event) if event.depth == expected => break,
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            // Host gone; the confirmation can never arrive.
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Watch for traversals the stack did not initiate and close the topmost
/// overlay for each one.
async fn watch_external(inner: Arc<Inner>, mut rx: broadcast::Receiver<NavEvent>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("navigation watcher lagged, skipped {} events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        // Events emitted by program-initiated traversals stay queued here
        // until the watcher runs, possibly after the operation already
        // finished and released the ops lock. Lock state at processing
        // time is therefore no proof of an external back; consume one
        // pending marker per such event instead of interpreting it.
        if claim_program_traversal(&inner.pending_traversals) {
            continue;
        }

        // A held ops lock means an in-flight operation is driving this
        // exact traversal and will interpret the event itself.
        let Ok(_guard) = inner.ops.try_lock() else {
            continue;
        };
        inner.pop_for_navigation(event.depth);
    }
}

/// Claim one pending program-initiated traversal, if any.
fn claim_program_traversal(pending: &AtomicUsize) -> bool {
    pending
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
            count.checked_sub(1)
        })
        .is_ok()
}
