//! Hook module for global keyboard event interception
//!
//! Uses a Windows WH_KEYBOARD_LL hook to observe every key-down in the
//! system and suppress the watched key codes before they reach other
//! applications. On other platforms the hook reports `Unsupported` and
//! the viewer runs click-to-dismiss only.

pub mod keys;
mod listener;

pub use keys::WatchedKeys;
pub use listener::{HookError, KeyEvent, KeyboardHook};
