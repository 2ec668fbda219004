//! In-process adapter
//!
//! Not durable. Suited to tests and to embedding the registry where the
//! transport keeps its own persistence.

use super::{AccessLog, VideoStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{AccessLogEntry, NewAccessLogEntry, PayloadId, VideoRecord};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    videos: DashMap<PayloadId, VideoRecord>,
    access_logs: Mutex<Vec<AccessLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full stored record, including `created_at`
    pub fn video(&self, payload_id: PayloadId) -> Option<VideoRecord> {
        self.videos.get(&payload_id).map(|r| r.value().clone())
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// Snapshot of the access log in append order
    pub async fn access_log_entries(&self) -> Vec<AccessLogEntry> {
        self.access_logs.lock().await.clone()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn insert(&self, record: &VideoRecord) -> StoreResult<()> {
        // The entry guard holds the shard lock, making check-and-insert atomic.
        match self.videos.entry(record.payload_id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(record.payload_id)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn lookup(&self, payload_id: PayloadId) -> StoreResult<Option<String>> {
        Ok(self
            .videos
            .get(&payload_id)
            .map(|r| r.value().resource_ref.clone()))
    }

    async fn exists(&self, payload_id: PayloadId) -> StoreResult<bool> {
        Ok(self.videos.contains_key(&payload_id))
    }
}

#[async_trait]
impl AccessLog for MemoryStore {
    async fn append(&self, entry: &NewAccessLogEntry) -> StoreResult<i64> {
        let mut logs = self.access_logs.lock().await;
        let id = logs.len() as i64 + 1;
        logs.push(AccessLogEntry {
            id,
            requester_id: entry.requester_id,
            payload_id: entry.payload_id,
            accessed_at: entry.accessed_at,
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_once() {
        let store = MemoryStore::new();
        let id = PayloadId::new(5_555_555_555);

        store.insert(&VideoRecord::new(id, "file:A")).await.unwrap();
        let err = store.insert(&VideoRecord::new(id, "file:B")).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.lookup(id).await.unwrap().as_deref(), Some("file:A"));
        assert_eq!(store.video_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.lookup(PayloadId::new(999_999)).await.unwrap(), None);
        assert!(!store.exists(PayloadId::new(999_999)).await.unwrap());
    }

    #[tokio::test]
    async fn test_access_log_sequence() {
        let store = MemoryStore::new();
        let id = PayloadId::new(1_111_111_111);

        assert_eq!(store.append(&NewAccessLogEntry::now(1, id)).await.unwrap(), 1);
        assert_eq!(store.append(&NewAccessLogEntry::now(2, id)).await.unwrap(), 2);

        let entries = store.access_log_entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].requester_id, 2);
        assert_eq!(entries[1].payload_id, id);
    }
}
