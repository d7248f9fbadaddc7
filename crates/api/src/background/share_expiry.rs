//! Periodic removal of expired share records.
//!
//! Expired records are already invisible to `GET /api/share/{id}`; this job
//! reclaims their memory. Runs on a fixed interval using
//! `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::store::ShareStore;

/// Run the share expiry loop until `cancel` is triggered.
pub async fn run(store: Arc<dyn ShareStore>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Share expiry job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Share expiry job stopping");
                break;
            }
            _ = interval.tick() => {
                sweep(store.as_ref()).await;
            }
        }
    }
}

/// Purge everything expired as of now. Returns the number of records removed.
pub async fn sweep(store: &dyn ShareStore) -> usize {
    let purged = store.purge_expired(Utc::now()).await;
    if purged > 0 {
        tracing::info!(purged, "Share expiry: purged expired shares");
    } else {
        tracing::debug!("Share expiry: nothing to purge");
    }
    purged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryShareStore;
    use chrono::Duration as ChronoDuration;
    use pinboard_core::share::{SharePayload, ShareRecord};

    fn payload() -> SharePayload {
        SharePayload {
            image: "data:image/png;base64,AAAA".to_string(),
            annotations: vec![],
        }
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_records() {
        let store = InMemoryShareStore::new();
        let now = Utc::now();
        let expired = ShareRecord::new(
            "old".into(),
            payload(),
            now - ChronoDuration::days(8),
            ChronoDuration::days(7),
        );
        let live = ShareRecord::new("new".into(), payload(), now, ChronoDuration::days(7));
        store.insert(expired).await.unwrap();
        store.insert(live).await.unwrap();

        assert_eq!(sweep(&store).await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let store: Arc<dyn ShareStore> = Arc::new(InMemoryShareStore::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(store, Duration::from_millis(10), cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("expiry job did not stop")
            .unwrap();
    }
}
