//! The navigation host boundary.
//!
//! The stack core never talks to a concrete history API. It records an
//! overlay depth on new history entries, requests backward traversals, and
//! observes traversal events through this trait. A browser embedding maps
//! these onto `pushState` / `history.go` / `popstate`; [`MemoryHistory`]
//! implements the same contract in memory.
//!
//! [`MemoryHistory`]: crate::history::MemoryHistory

use tokio::sync::broadcast;

/// A session-history traversal event.
///
/// The host emits exactly one event per completed traversal, whether the
/// traversal was requested through [`NavigationHost::go_back`] or initiated
/// by the user (back button, back gesture, forward button).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEvent {
    /// Overlay depth recorded on the entry the session landed on, or 0 for
    /// entries that never had a depth recorded.
    pub depth: usize,
}

/// Minimal session-history contract the stack core needs from its host.
pub trait NavigationHost: Send + Sync + 'static {
    /// Depth recorded on the current history entry, if any.
    ///
    /// Read once at stack construction to detect a stale depth left over
    /// from a previous session.
    fn current_depth(&self) -> Option<usize>;

    /// Record `depth` on a freshly pushed history entry.
    ///
    /// Synchronous; pushing an entry does not traverse and fires no event.
    fn push_depth(&self, depth: usize);

    /// Request a traversal `steps` entries backward.
    ///
    /// Completion is reported through [`subscribe`](Self::subscribe), not
    /// through this call. A multi-step traversal lands once, at the
    /// destination entry.
    fn go_back(&self, steps: usize);

    /// Subscribe to traversal events.
    ///
    /// A receiver only observes events emitted after it subscribed, so
    /// callers that need a confirmation must subscribe before requesting
    /// the traversal.
    fn subscribe(&self) -> broadcast::Receiver<NavEvent>;
}
