// Example: Back-gesture coordination
//
// Opens a modal and a lightbox on top of it, then simulates the user
// pressing the hardware back button twice. Each traversal closes exactly
// the topmost overlay and fires its close callback.

use std::sync::Arc;
use std::time::Duration;

use backstack::{MemoryHistory, NavigationHost, OverlayKind, OverlayStack, PushOptions};
use simplelog::{Config, LevelFilter, SimpleLogger};
use tokio::time::timeout;

#[tokio::main]
async fn main() {
    SimpleLogger::init(LevelFilter::Debug, Config::default()).expect("Failed to initialize logger");

    let history = MemoryHistory::new();
    let stack = OverlayStack::new(Arc::new(history.clone()));

    let settings = stack
        .push(PushOptions::new(|| println!("-> settings modal closed")).with_id("settings"))
        .await
        .expect("push settings");
    println!("opened settings modal at index {}", settings.index);

    let photo = stack
        .push(
            PushOptions::new(|| println!("-> photo lightbox closed"))
                .with_id("photo-42")
                .with_kind(OverlayKind::Lightbox),
        )
        .await
        .expect("push lightbox");
    println!(
        "opened {} on top (index {}, session depth {:?})",
        photo.id,
        photo.index,
        history.current_depth()
    );

    let mut events = stack.subscribe();

    // The user presses back twice.
    for _ in 0..2 {
        history.back();
        let event = timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("overlay should close")
            .expect("stack alive");
        println!("back gesture: {event:?}");
    }

    println!(
        "open overlays: {}, session depth {:?}",
        stack.len(),
        history.current_depth()
    );
}
