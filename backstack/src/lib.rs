//! Back-navigation-aware overlay stack coordination.
//!
//! `backstack` keeps a single ordered stack of open overlays (modals, alert
//! dialogs, bottom sheets, lightboxes) synchronized with a host session
//! history, so that one back traversal (hardware button, gesture, browser
//! back) closes exactly the topmost overlay instead of leaving the page.
//!
//! The host history is abstracted behind [`NavigationHost`]; the crate
//! ships [`MemoryHistory`], an in-memory implementation with browser-like
//! semantics that doubles as the test double.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use backstack::{MemoryHistory, NavigationHost, OverlayStack, PushOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let history = MemoryHistory::new();
//! let stack = OverlayStack::new(Arc::new(history.clone()));
//!
//! let pushed = stack
//!     .push(PushOptions::new(|| println!("modal closed")).with_id("settings"))
//!     .await
//!     .unwrap();
//! assert_eq!(pushed.index, 0);
//! assert_eq!(history.current_depth(), Some(1));
//!
//! stack.pop().await;
//! assert!(stack.is_empty());
//! # }
//! ```

pub mod error;
pub mod event;
pub mod history;
pub mod host;
pub mod id;
pub mod stack;

pub use error::StackError;
pub use event::{OverlayKind, PopReason, StackEvent};
pub use history::MemoryHistory;
pub use host::{NavEvent, NavigationHost};
pub use id::EntryId;
pub use stack::{OverlayStack, PopOptions, PushOptions, Pushed};
