//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::common::time::Clock;
use crate::registry::RoomRegistry;

/// State shared by all request handlers.
///
/// The registry sits behind one mutex; every upsert and snapshot holds it for
/// its full prune-then-touch span, which is what keeps "replace, not merge"
/// and prune-then-read atomic under concurrent requests.
pub struct AppState {
    /// The peer registry, the sole mutable shared state
    pub registry: Mutex<RoomRegistry>,
    /// Clock source; swapped for a fixed clock in tests
    pub clock: Arc<dyn Clock>,
    /// Directory holding the downloadable plugin binary
    pub asset_dir: PathBuf,
}

impl AppState {
    pub fn new(clock: Arc<dyn Clock>, asset_dir: PathBuf) -> Self {
        Self {
            registry: Mutex::new(RoomRegistry::new()),
            clock,
            asset_dir,
        }
    }
}
