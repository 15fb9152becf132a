//! Stack change notifications.
//!
//! Container registries subscribe to these to know when to mount and
//! unmount their overlay trees; the stack itself never renders anything.

use crate::id::EntryId;

/// What kind of overlay a stack entry represents.
///
/// Registries route on this tag; the stack treats all kinds the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlayKind {
    /// Modal dialog (default).
    #[default]
    Modal,
    /// Alert dialog.
    AlertDialog,
    /// Bottom sheet.
    BottomSheet,
    /// Lightbox.
    Lightbox,
}

/// Why an entry left the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopReason {
    /// A pop or flush call on the stack API.
    Requested,
    /// A host traversal the stack did not initiate (back button, gesture).
    Navigation,
}

/// Notification of a stack change.
#[derive(Debug, Clone)]
pub enum StackEvent {
    /// An entry was appended to the stack.
    Pushed {
        /// Id of the new entry.
        id: EntryId,
        /// Zero-based position in the stack.
        index: usize,
        /// Overlay kind tag.
        kind: OverlayKind,
    },
    /// An entry was removed from the stack.
    Popped {
        /// Id of the removed entry.
        id: EntryId,
        /// Overlay kind tag.
        kind: OverlayKind,
        /// What triggered the removal.
        reason: PopReason,
    },
}
