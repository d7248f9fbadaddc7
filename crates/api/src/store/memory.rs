use std::collections::HashMap;

use async_trait::async_trait;
use pinboard_core::error::CoreError;
use pinboard_core::share::ShareRecord;
use pinboard_core::types::Timestamp;
use tokio::sync::RwLock;

use super::ShareStore;

/// Process-local share storage. Records are lost on restart.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
#[derive(Default)]
pub struct InMemoryShareStore {
    records: RwLock<HashMap<String, ShareRecord>>,
}

impl InMemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShareStore for InMemoryShareStore {
    async fn insert(&self, record: ShareRecord) -> Result<(), CoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(CoreError::Conflict(format!(
                "share id '{}' already exists",
                record.id
            )));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str, now: Timestamp) -> Option<ShareRecord> {
        self.records
            .read()
            .await
            .get(id)
            .filter(|record| !record.is_expired(now))
            .cloned()
    }

    async fn purge_expired(&self, now: Timestamp) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
