//! Background snapshot download
//!
//! One task owns the HTTP client: fetch the configured URL, persist the
//! bytes to the cache, and report the outcome to the viewer over a
//! channel. With a refresh interval configured the task repeats; without
//! one it fetches exactly once and exits.

use chrono::{DateTime, Local};
use reqwest::header::LAST_MODIFIED;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Config;

use super::{cache, FetchOutcome, Snapshot, SnapshotError};

/// Run the download task until the one-shot fetch completes, the viewer
/// hangs up, or forever when periodic refresh is configured.
pub async fn run(config: Config, outcome_tx: mpsc::Sender<FetchOutcome>) {
    let client = Client::new();
    let cache_path = config.cache_path();

    loop {
        let outcome = match fetch_once(&client, &config.url).await {
            Ok(snapshot) => {
                info!(
                    bytes = snapshot.bytes.len(),
                    last_modified = ?snapshot.last_modified,
                    "snapshot downloaded"
                );
                if let Err(e) = cache::store(&cache_path, &snapshot) {
                    error!(?e, path = %cache_path.display(), "failed to write snapshot cache");
                }
                FetchOutcome::Fetched(snapshot)
            }
            Err(e) => {
                error!(?e, url = %config.url, "snapshot download failed");
                FetchOutcome::Failed
            }
        };

        if outcome_tx.send(outcome).await.is_err() {
            // Viewer is gone
            return;
        }

        match config.refresh_interval() {
            Some(interval) => tokio::time::sleep(interval).await,
            None => return,
        }
    }
}

/// Download the snapshot once, carrying the `Last-Modified` header along
async fn fetch_once(client: &Client, url: &str) -> Result<Snapshot, SnapshotError> {
    let response = client.get(url).send().await?.error_for_status()?;

    let last_modified = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_last_modified);

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(SnapshotError::EmptyBody);
    }

    Ok(Snapshot {
        bytes: bytes.to_vec(),
        last_modified,
    })
}

/// Parse an HTTP `Last-Modified` value (RFC 2822 date) into local time
fn parse_last_modified(value: &str) -> Option<DateTime<Local>> {
    match DateTime::parse_from_rfc2822(value) {
        Ok(dt) => Some(dt.with_timezone(&Local)),
        Err(e) => {
            warn!(%value, ?e, "unparseable Last-Modified header");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_last_modified() {
        let parsed = parse_last_modified("Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        let utc = parsed.naive_utc();
        assert_eq!(utc.year(), 2015);
        assert_eq!(utc.month(), 10);
        assert_eq!(utc.day(), 21);
        assert_eq!(utc.hour(), 7);
        assert_eq!(utc.minute(), 28);
    }

    #[test]
    fn test_parse_garbage_last_modified() {
        assert!(parse_last_modified("not a date").is_none());
        assert!(parse_last_modified("").is_none());
    }

    #[test]
    fn test_unreachable_host_reports_failure_once() {
        tokio_test::block_on(async {
            let config = Config {
                url: "http://127.0.0.1:1/snapshot.jpg".to_string(),
                cache_file: "webcam.jpg".to_string(),
                refresh_secs: None,
                ..Config::default()
            };

            let (tx, mut rx) = mpsc::channel(4);
            run(config, tx).await;

            assert!(matches!(rx.recv().await, Some(FetchOutcome::Failed)));
            // one-shot: the task hung up after a single outcome
            assert!(rx.recv().await.is_none());
        });
    }
}
