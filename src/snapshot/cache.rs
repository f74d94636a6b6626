//! Snapshot disk cache
//!
//! One flat file beside the executable. The source timestamp rides on the
//! file's mtime, so a reload after restart reports the same last-modified
//! time the download did.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use super::{Snapshot, SnapshotError};

/// Read the cached snapshot, if one exists.
///
/// Returns `Ok(None)` when there is no usable cache (missing or empty
/// file). A failure to read the mtime is logged and leaves the timestamp
/// unset rather than discarding the bytes.
pub fn load(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        debug!(path = %path.display(), "no cached snapshot");
        return Ok(None);
    }

    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        warn!(path = %path.display(), "cached snapshot is empty, ignoring");
        return Ok(None);
    }

    let last_modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(mtime) => Some(DateTime::<Local>::from(mtime)),
        Err(e) => {
            warn!(?e, path = %path.display(), "could not read cache mtime");
            None
        }
    };

    Ok(Some(Snapshot {
        bytes,
        last_modified,
    }))
}

/// Overwrite the cache file with `snapshot`.
///
/// Empty snapshots are skipped so a bad download never clobbers a good
/// cache. When the snapshot carries a timestamp it is copied onto the
/// file's mtime; a failure there keeps the written bytes and is only
/// logged.
pub fn store(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    if snapshot.is_empty() {
        debug!("skipping cache write for empty snapshot");
        return Ok(());
    }

    std::fs::write(path, &snapshot.bytes)?;

    if let Some(ts) = snapshot.last_modified {
        if let Err(e) = set_mtime(path, ts) {
            warn!(?e, path = %path.display(), "could not set cache mtime");
        }
    }

    Ok(())
}

fn set_mtime(path: &Path, ts: DateTime<Local>) -> std::io::Result<()> {
    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_modified(SystemTime::from(ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn snapshot_with_timestamp() -> Snapshot {
        Snapshot {
            bytes: vec![1, 2, 3, 4],
            last_modified: Some(Local.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load(&dir.path().join("webcam.jpg")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webcam.jpg");
        std::fs::write(&path, b"").unwrap();
        assert!(load(&path).unwrap().is_none());
    }

    #[test]
    fn test_store_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webcam.jpg");
        let snapshot = snapshot_with_timestamp();

        store(&path, &snapshot).unwrap();
        let loaded = load(&path).unwrap().unwrap();

        assert_eq!(loaded.bytes, snapshot.bytes);

        // mtime carries the source timestamp across the round trip
        let expected = snapshot.last_modified.unwrap();
        let actual = loaded.last_modified.unwrap();
        assert!((actual - expected).abs() < Duration::seconds(2));
    }

    #[test]
    fn test_store_empty_keeps_previous_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webcam.jpg");
        store(&path, &snapshot_with_timestamp()).unwrap();

        let empty = Snapshot {
            bytes: Vec::new(),
            last_modified: None,
        };
        store(&path, &empty).unwrap();

        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_store_without_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webcam.jpg");
        let snapshot = Snapshot {
            bytes: vec![9, 9],
            last_modified: None,
        };

        store(&path, &snapshot).unwrap();
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.bytes, vec![9, 9]);
        // mtime falls back to the write time, which is "now"
        assert!(loaded.last_modified.is_some());
    }
}
