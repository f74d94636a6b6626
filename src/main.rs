//! camglance: topmost webcam snapshot viewer
//!
//! Shows the cached snapshot immediately, downloads a fresh one in the
//! background, and dismisses on a watched global keypress (numpad `+` or
//! `/` by default, grabbed before other applications see them) or on a
//! mouse click. The last download is cached beside the executable, and a
//! best-effort log file sits next to it.

mod config;
mod hook;
mod logging;
mod snapshot;
mod viewer;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::hook::{KeyboardHook, WatchedKeys};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let _log_guard = logging::init(&config.log_path());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        url = %config.url,
        "camglance starting"
    );

    let watched = WatchedKeys::new(config.watched_keys.clone());
    if watched.is_empty() {
        warn!("no watched keys configured; only a mouse click will dismiss");
    }

    // Hook thread -> viewer: every global key-down
    let (key_tx, key_rx) = mpsc::channel(64);
    // Fetch task -> viewer: download outcomes
    let (fetch_tx, fetch_rx) = mpsc::channel(4);

    let hook = Arc::new(KeyboardHook::new(key_tx, watched.clone()));

    // Delay the grab so a keypress still in flight from launching the
    // viewer doesn't immediately dismiss it
    let install_hook = Arc::clone(&hook);
    let delay = config.hook_delay();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match install_hook.start() {
            Ok(()) => info!("keyboard hook installed"),
            Err(e) => warn!(?e, "continuing without global keypress handling"),
        }
    });

    // Show whatever the previous run cached while the download runs
    let cached = match snapshot::cache::load(&config.cache_path()) {
        Ok(cached) => cached,
        Err(e) => {
            error!(?e, "failed to read cached snapshot");
            None
        }
    };

    tokio::spawn(snapshot::fetch::run(config.clone(), fetch_tx));

    // Blocks the main thread until the viewer is dismissed
    viewer::run(cached, watched, key_rx, fetch_rx)?;

    hook.stop();
    info!("exit");

    Ok(())
}
