//! Global low-level keyboard hook
//!
//! Installs a process-wide WH_KEYBOARD_LL hook on a dedicated thread and
//! forwards every key-down over a channel. Low-level hooks only fire while
//! the installing thread pumps messages, so the thread runs a Win32
//! message loop until `stop()` posts WM_QUIT to it.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::keys::WatchedKeys;

/// A single key-down observed by the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Windows virtual-key code of the pressed key
    pub vk_code: u32,
}

/// Errors that can occur installing or running the keyboard hook
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("keyboard hook is already installed")]
    AlreadyInstalled,

    #[error("failed to install WH_KEYBOARD_LL hook: {0}")]
    Install(String),

    #[error("failed to spawn hook thread: {0}")]
    ThreadSpawn(String),

    #[error("hook thread exited before reporting readiness")]
    ThreadExited,

    #[error("global keyboard hooks are not supported on this platform")]
    Unsupported,
}

/// Process-wide keyboard hook capability.
///
/// Constructed once with the event channel and the key codes to suppress;
/// a second installation attempt fails with `AlreadyInstalled`. The hook
/// emits a [`KeyEvent`] for every key-down and swallows the suppressed
/// codes (key-ups always pass through, matching what other applications
/// expect from a momentary keypress).
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub struct KeyboardHook {
    event_tx: mpsc::Sender<KeyEvent>,
    suppressed: WatchedKeys,
    running: Arc<AtomicBool>,
    thread_id: Arc<AtomicU32>,
}

impl KeyboardHook {
    /// Create a new hook capability (does not install anything yet)
    pub fn new(event_tx: mpsc::Sender<KeyEvent>, suppressed: WatchedKeys) -> Self {
        Self {
            event_tx,
            suppressed,
            running: Arc::new(AtomicBool::new(false)),
            thread_id: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Check if the hook is currently installed
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(target_os = "windows")]
mod imp {
    use std::sync::OnceLock;
    use std::thread;

    use tracing::{debug, error};
    use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
        TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL,
        WM_KEYDOWN, WM_QUIT, WM_SYSKEYDOWN,
    };

    use super::*;

    /// State the hook callback needs; set exactly once at install time.
    /// The callback is a plain `extern "system"` function, so this cannot
    /// live on the `KeyboardHook` instance.
    struct Shared {
        event_tx: mpsc::Sender<KeyEvent>,
        suppressed: WatchedKeys,
    }

    static SHARED: OnceLock<Shared> = OnceLock::new();

    impl KeyboardHook {
        /// Install the hook. One installation per process; a second call
        /// fails with `AlreadyInstalled`.
        ///
        /// Spawns a dedicated thread that registers WH_KEYBOARD_LL and
        /// pumps messages until `stop()` is called. Returns once the hook
        /// is registered (or registration failed).
        pub fn start(&self) -> Result<(), HookError> {
            if self.running.swap(true, Ordering::SeqCst) {
                return Err(HookError::AlreadyInstalled);
            }

            if SHARED
                .set(Shared {
                    event_tx: self.event_tx.clone(),
                    suppressed: self.suppressed.clone(),
                })
                .is_err()
            {
                self.running.store(false, Ordering::SeqCst);
                return Err(HookError::AlreadyInstalled);
            }

            let (ready_tx, ready_rx) = std::sync::mpsc::channel();
            let running = Arc::clone(&self.running);
            let thread_id = Arc::clone(&self.thread_id);

            thread::Builder::new()
                .name("keyboard-hook".to_string())
                .spawn(move || {
                    info!("keyboard hook thread started");

                    run_message_loop(&thread_id, ready_tx);

                    running.store(false, Ordering::SeqCst);
                    thread_id.store(0, Ordering::SeqCst);
                    info!("keyboard hook thread stopped");
                })
                .map_err(|e| {
                    self.running.store(false, Ordering::SeqCst);
                    HookError::ThreadSpawn(e.to_string())
                })?;

            // The install result arrives as soon as SetWindowsHookExW returns
            match ready_rx.recv() {
                Ok(Ok(())) => {
                    info!(suppressed = %self.suppressed, "WH_KEYBOARD_LL installed");
                    Ok(())
                }
                Ok(Err(e)) => {
                    self.running.store(false, Ordering::SeqCst);
                    Err(e)
                }
                Err(_) => {
                    self.running.store(false, Ordering::SeqCst);
                    Err(HookError::ThreadExited)
                }
            }
        }

        /// Uninstall the hook.
        ///
        /// Posts WM_QUIT to the hook thread; the thread unhooks and exits.
        /// Safe to call when the hook never installed.
        pub fn stop(&self) {
            if !self.running.swap(false, Ordering::SeqCst) {
                return;
            }

            let tid = self.thread_id.load(Ordering::SeqCst);
            if tid != 0 {
                unsafe {
                    if let Err(e) = PostThreadMessageW(tid, WM_QUIT, WPARAM(0), LPARAM(0)) {
                        warn!(?e, "failed to post WM_QUIT to hook thread");
                    }
                }
            }
        }
    }

    /// Register the hook and pump messages until WM_QUIT
    fn run_message_loop(
        thread_id: &AtomicU32,
        ready_tx: std::sync::mpsc::Sender<Result<(), HookError>>,
    ) {
        unsafe {
            thread_id.store(GetCurrentThreadId(), Ordering::SeqCst);

            let hmod = match GetModuleHandleW(None) {
                Ok(hmod) => hmod,
                Err(e) => {
                    let _ = ready_tx.send(Err(HookError::Install(e.to_string())));
                    return;
                }
            };

            let hook = match SetWindowsHookExW(
                WH_KEYBOARD_LL,
                Some(keyboard_proc),
                HINSTANCE(hmod.0),
                0,
            ) {
                Ok(hook) => hook,
                Err(e) => {
                    let _ = ready_tx.send(Err(HookError::Install(e.to_string())));
                    return;
                }
            };

            let _ = ready_tx.send(Ok(()));

            // Message loop: required for low-level hooks to fire
            let mut msg = MSG::default();
            loop {
                let ret = GetMessageW(&mut msg, HWND::default(), 0, 0);
                match ret.0 {
                    0 => break, // WM_QUIT
                    -1 => {
                        error!("GetMessageW failed, leaving hook loop");
                        break;
                    }
                    _ => {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }

            if let Err(e) = UnhookWindowsHookEx(hook) {
                warn!(?e, "UnhookWindowsHookEx failed");
            }
        }
    }

    /// The WH_KEYBOARD_LL callback.
    ///
    /// Must return quickly; Windows silently removes hooks that stall.
    /// Every key-down is forwarded, then swallowed iff its code is in the
    /// suppressed set. Key-ups and injected events pass straight through.
    unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        if code >= 0 {
            let message = wparam.0 as u32;
            if message == WM_KEYDOWN || message == WM_SYSKEYDOWN {
                let kb = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
                let vk_code = kb.vkCode;

                if let Some(shared) = SHARED.get() {
                    // Non-blocking: a full channel drops the event rather
                    // than stalling the hook
                    if shared.event_tx.try_send(KeyEvent { vk_code }).is_err() {
                        debug!(vk_code, "key event dropped");
                    }

                    if shared.suppressed.contains(vk_code) {
                        // The matching key-up is still delivered
                        return LRESULT(1);
                    }
                }
            }
        }

        CallNextHookEx(HHOOK::default(), code, wparam, lparam)
    }
}

#[cfg(not(target_os = "windows"))]
impl KeyboardHook {
    /// Low-level keyboard hooks exist only on Windows
    pub fn start(&self) -> Result<(), HookError> {
        warn!("global keyboard hook not available on this platform");
        Err(HookError::Unsupported)
    }

    /// Nothing to tear down off Windows
    pub fn stop(&self) {
        info!("keyboard hook stop: nothing installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::keys::{VK_NUMPAD_ADD, VK_NUMPAD_DIVIDE};

    fn watched() -> WatchedKeys {
        WatchedKeys::new(vec![VK_NUMPAD_ADD, VK_NUMPAD_DIVIDE])
    }

    #[test]
    fn test_hook_creation() {
        let (tx, _rx) = mpsc::channel(64);
        let hook = KeyboardHook::new(tx, watched());
        assert!(!hook.is_running());
    }

    #[test]
    fn test_stop_without_start_is_harmless() {
        let (tx, _rx) = mpsc::channel(64);
        let hook = KeyboardHook::new(tx, watched());
        hook.stop();
        assert!(!hook.is_running());
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_start_unsupported_off_windows() {
        let (tx, _rx) = mpsc::channel(64);
        let hook = KeyboardHook::new(tx, watched());
        assert!(matches!(hook.start(), Err(HookError::Unsupported)));
        assert!(!hook.is_running());
    }
}
