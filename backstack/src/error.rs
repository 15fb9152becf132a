//! Error types for stack operations.

use crate::id::EntryId;

/// Error type for stack mutations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StackError {
    /// An entry with this id is already open.
    ///
    /// Pushing a colliding id is a contract violation by the caller, not a
    /// recoverable runtime state; the stack is left unchanged.
    #[error("duplicate stack entry id: {0}; each push must use a unique id")]
    DuplicateId(EntryId),
}
