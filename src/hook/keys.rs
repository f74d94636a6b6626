//! Virtual-key code definitions and watched-key matching
//!
//! Provides constants for the Windows virtual-key codes the viewer
//! watches by default and a small set type answering membership.

/// Numpad `+` key (VK_ADD)
pub const VK_NUMPAD_ADD: u32 = 107;

/// Numpad `/` key (VK_DIVIDE)
pub const VK_NUMPAD_DIVIDE: u32 = 111;

/// The set of virtual-key codes that dismiss the viewer.
///
/// The same set is handed to the keyboard hook for suppression, so a
/// watched key never leaks through to other applications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchedKeys(Vec<u32>);

impl WatchedKeys {
    /// Create a watched-key set from raw virtual-key codes
    pub fn new(codes: impl Into<Vec<u32>>) -> Self {
        Self(codes.into())
    }

    /// Check whether `vk_code` is watched
    pub fn contains(&self, vk_code: u32) -> bool {
        self.0.contains(&vk_code)
    }

    /// Check if no keys are watched
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for WatchedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "[{}]", codes.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        let keys = WatchedKeys::default();
        assert!(keys.is_empty());
        assert!(!keys.contains(VK_NUMPAD_ADD));
    }

    #[test]
    fn test_default_watched_codes() {
        let keys = WatchedKeys::new(vec![VK_NUMPAD_ADD, VK_NUMPAD_DIVIDE]);
        assert!(keys.contains(107));
        assert!(keys.contains(111));
        assert!(!keys.contains(13)); // Enter is not watched
    }

    #[test]
    fn test_display() {
        let keys = WatchedKeys::new(vec![107, 111]);
        assert_eq!(keys.to_string(), "[107, 111]");
    }
}
