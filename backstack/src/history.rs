//! In-memory session history.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::host::{NavEvent, NavigationHost};

/// Buffered traversal events per receiver.
const EVENT_CAPACITY: usize = 16;

/// In-memory session history with browser-like traversal semantics.
///
/// Keeps a list of history entries and a cursor over them. Pushing a new
/// entry truncates the forward tail first; traversing backward lands once
/// at the destination and emits a single [`NavEvent`], the way a multi-step
/// `history.go(-n)` fires a single `popstate`.
///
/// Cheap to clone; clones share the same session.
///
/// # Example
///
/// ```
/// use backstack::{MemoryHistory, NavigationHost};
///
/// let history = MemoryHistory::new();
/// assert_eq!(history.current_depth(), None);
///
/// history.push_depth(1);
/// history.push_depth(2);
/// history.back();
/// assert_eq!(history.current_depth(), Some(1));
/// ```
#[derive(Clone)]
pub struct MemoryHistory {
    inner: Arc<Inner>,
}

struct Inner {
    entries: Mutex<Entries>,
    events: broadcast::Sender<NavEvent>,
}

struct Entries {
    /// Depth recorded per entry; `None` for entries without one (the root).
    depths: Vec<Option<usize>>,
    /// Index of the current entry.
    cursor: usize,
}

impl MemoryHistory {
    /// Create a fresh session holding only the root entry.
    pub fn new() -> Self {
        Self::with_entries(vec![None], 0)
    }

    /// Create a session restored from a previous run: the root entry plus
    /// `depth` overlay entries, positioned on the deepest one.
    ///
    /// Models a page reload while overlays were open, which is the state
    /// [`OverlayStack::new`](crate::OverlayStack::new) reconciles away.
    pub fn restored(depth: usize) -> Self {
        let mut depths = vec![None];
        depths.extend((1..=depth).map(Some));
        Self::with_entries(depths, depth)
    }

    fn with_entries(depths: Vec<Option<usize>>, cursor: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(Entries { depths, cursor }),
                events,
            }),
        }
    }

    /// User-initiated backward traversal (back button, back gesture).
    pub fn back(&self) {
        self.go_back(1);
    }

    /// User-initiated forward traversal.
    ///
    /// No-op at the newest entry.
    pub fn forward(&self) {
        let depth = {
            let mut entries = self.lock();
            if entries.cursor + 1 >= entries.depths.len() {
                return;
            }
            entries.cursor += 1;
            entries.depths[entries.cursor].unwrap_or(0)
        };
        let _ = self.inner.events.send(NavEvent { depth });
    }

    /// Number of entries currently in the session.
    pub fn entry_count(&self) -> usize {
        self.lock().depths.len()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.inner.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationHost for MemoryHistory {
    fn current_depth(&self) -> Option<usize> {
        let entries = self.lock();
        entries.depths[entries.cursor]
    }

    fn push_depth(&self, depth: usize) {
        let mut entries = self.lock();
        let keep = entries.cursor + 1;
        entries.depths.truncate(keep);
        entries.depths.push(Some(depth));
        entries.cursor += 1;
    }

    fn go_back(&self, steps: usize) {
        if steps == 0 {
            return;
        }
        let depth = {
            let mut entries = self.lock();
            entries.cursor = entries.cursor.saturating_sub(steps);
            entries.depths[entries.cursor].unwrap_or(0)
        };
        log::trace!("history traversed back {} to depth {}", steps, depth);
        let _ = self.inner.events.send(NavEvent { depth });
    }

    fn subscribe(&self) -> broadcast::Receiver<NavEvent> {
        self.inner.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_has_no_depth() {
        let history = MemoryHistory::new();
        assert_eq!(history.current_depth(), None);
        assert_eq!(history.entry_count(), 1);
    }

    #[test]
    fn test_push_and_traverse() {
        let history = MemoryHistory::new();
        history.push_depth(1);
        history.push_depth(2);
        assert_eq!(history.current_depth(), Some(2));

        history.back();
        assert_eq!(history.current_depth(), Some(1));

        history.forward();
        assert_eq!(history.current_depth(), Some(2));
    }

    #[test]
    fn test_push_truncates_forward_tail() {
        let history = MemoryHistory::new();
        history.push_depth(1);
        history.push_depth(2);
        history.back();

        history.push_depth(2);
        assert_eq!(history.entry_count(), 3);

        // The old forward entry is gone.
        history.forward();
        assert_eq!(history.current_depth(), Some(2));
    }

    #[test]
    fn test_multi_step_traversal_emits_one_event() {
        let history = MemoryHistory::new();
        history.push_depth(1);
        history.push_depth(2);
        history.push_depth(3);

        let mut events = history.subscribe();
        history.go_back(3);

        assert_eq!(events.try_recv().unwrap(), NavEvent { depth: 0 });
        assert!(events.try_recv().is_err());
        assert_eq!(history.current_depth(), None);
    }

    #[test]
    fn test_back_clamps_at_root() {
        let history = MemoryHistory::new();
        history.push_depth(1);
        history.go_back(10);
        assert_eq!(history.current_depth(), None);
    }

    #[test]
    fn test_restored_session() {
        let history = MemoryHistory::restored(3);
        assert_eq!(history.current_depth(), Some(3));
        assert_eq!(history.entry_count(), 4);
    }
}
