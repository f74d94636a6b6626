//! Snapshot module: the downloaded-image record, its disk cache, and the
//! background download task.
//!
//! A snapshot lives briefly: it is produced by the disk-read or the
//! network-fetch path, handed to the viewer over a channel, optionally
//! persisted, and dropped.

pub mod cache;
pub mod fetch;

use chrono::{DateTime, Local};

/// Raw image bytes paired with an optional source timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Undecoded image bytes as downloaded or read from disk
    pub bytes: Vec<u8>,
    /// `Last-Modified` of the source, or the cache file's mtime
    pub last_modified: Option<DateTime<Local>>,
}

impl Snapshot {
    /// A snapshot with no bytes is never displayed or persisted
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of one download attempt, delivered to the viewer
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Download succeeded; the cache has already been overwritten
    Fetched(Snapshot),
    /// Download failed; whatever is currently displayed stays
    Failed,
}

/// Errors from the snapshot cache and fetch paths
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("cache file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("download error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download returned an empty body")]
    EmptyBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot {
            bytes: Vec::new(),
            last_modified: None,
        };
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_nonempty_snapshot() {
        let snapshot = Snapshot {
            bytes: vec![0xff, 0xd8],
            last_modified: None,
        };
        assert!(!snapshot.is_empty());
    }
}
