//! Viewer window
//!
//! A topmost window showing the newest snapshot, a status indicator for
//! the in-flight download, and a last-modified caption. A watched global
//! keypress or any mouse click dismisses it.

mod app;

pub use app::ViewerApp;

use anyhow::anyhow;
use eframe::egui;
use tokio::sync::mpsc;

use crate::hook::{KeyEvent, WatchedKeys};
use crate::snapshot::{FetchOutcome, Snapshot};

/// Run the viewer on the calling thread until it is dismissed
pub fn run(
    cached: Option<Snapshot>,
    watched: WatchedKeys,
    key_rx: mpsc::Receiver<KeyEvent>,
    fetch_rx: mpsc::Receiver<FetchOutcome>,
) -> anyhow::Result<()> {
    let mut viewport = egui::ViewportBuilder::default()
        .with_title("camglance")
        .with_inner_size([800.0, 600.0]);
    // Topmost gets in the way of a debugger, so debug builds skip it
    if !cfg!(debug_assertions) {
        viewport = viewport.with_always_on_top();
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "camglance",
        options,
        Box::new(move |cc| Box::new(ViewerApp::new(cc, cached, watched, key_rx, fetch_rx))),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
