//! Registry facade consumed by the chat-relay transport

use crate::allocator::IdAllocator;
use crate::error::{RegistryError, RegistryResult, StoreError};
use crate::metrics;
use crate::models::{NewAccessLogEntry, PayloadId, Resolution, VideoRecord};
use crate::store::{AccessLog, VideoStore};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default bound on insert attempts per registration
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Registers videos under fresh payload ids and resolves deep links.
///
/// Cheap to clone; clones share the same store, access log and allocator, so
/// one instance can be handed to every concurrent handler.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn VideoStore>,
    access_log: Arc<dyn AccessLog>,
    allocator: Arc<IdAllocator>,
    max_attempts: u32,
}

impl Registry {
    pub fn new(store: Arc<dyn VideoStore>, access_log: Arc<dyn AccessLog>) -> Self {
        Self {
            store,
            access_log,
            allocator: Arc::new(IdAllocator::default()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_allocator(mut self, allocator: IdAllocator) -> Self {
        self.allocator = Arc::new(allocator);
        self
    }

    /// Bound on insert attempts before `AllocationExhausted` (minimum 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Store `resource_ref` under a newly allocated payload id.
    ///
    /// A candidate that loses an insert race is discarded and a fresh one is
    /// drawn. Not externally idempotent: registering the same reference twice
    /// yields two ids.
    ///
    /// # Errors
    ///
    /// - `InvalidResourceRef` for an empty reference
    /// - `AllocationExhausted` after `max_attempts` rejected inserts
    /// - `Storage` on any other backend failure
    #[instrument(skip(self, resource_ref), fields(ref_len = resource_ref.len()))]
    pub async fn register(&self, resource_ref: &str) -> RegistryResult<PayloadId> {
        if resource_ref.is_empty() {
            return Err(RegistryError::InvalidResourceRef(
                "Resource reference cannot be empty".to_string(),
            ));
        }

        for attempt in 1..=self.max_attempts {
            let payload_id = self.allocator.allocate(self.store.as_ref()).await?;
            let record = VideoRecord::new(payload_id, resource_ref);

            match self.store.insert(&record).await {
                Ok(()) => {
                    metrics::record_registration();
                    info!(payload_id = %payload_id, attempt, "Video registered");
                    return Ok(payload_id);
                }
                Err(StoreError::DuplicateKey(_)) => {
                    metrics::record_collision("insert");
                    warn!(
                        payload_id = %payload_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        "Payload id taken between probe and insert, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RegistryError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Look up the resource behind `payload_id` on behalf of `requester_id`.
    ///
    /// A hit appends one access log entry. The write happens after the lookup
    /// and its failure is only reported; the resource is returned regardless.
    /// A miss writes nothing.
    #[instrument(skip(self, payload_id), fields(payload_id = %payload_id))]
    pub async fn resolve(
        &self,
        payload_id: PayloadId,
        requester_id: i64,
    ) -> RegistryResult<Resolution> {
        let Some(resource_ref) = self.store.lookup(payload_id).await? else {
            metrics::record_resolution("not_found");
            info!(requester_id, "Requested payload not found");
            return Ok(Resolution::NotFound);
        };

        let entry = NewAccessLogEntry::now(requester_id, payload_id);
        match self.access_log.append(&entry).await {
            Ok(seq) => debug!(requester_id, access_log_id = seq, "Access logged"),
            Err(e) => {
                metrics::record_access_log_failure();
                warn!(
                    requester_id,
                    error = %e,
                    "Failed to write access log, delivering video anyway"
                );
            }
        }

        metrics::record_resolution("found");
        info!(requester_id, "Requested payload resolved");
        Ok(Resolution::Found(resource_ref))
    }

    /// Resolve the raw argument of a `/start` deep link.
    ///
    /// Anything that is not a plain decimal payload id resolves to `NotFound`
    /// without touching the store.
    pub async fn resolve_start_payload(
        &self,
        raw: &str,
        requester_id: i64,
    ) -> RegistryResult<Resolution> {
        match crate::deep_link::parse_start_payload(raw) {
            Some(payload_id) => self.resolve(payload_id, requester_id).await,
            None => {
                metrics::record_resolution("invalid");
                debug!(requester_id, raw_len = raw.len(), "Ignoring malformed start payload");
                Ok(Resolution::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::CandidateSource;
    use crate::error::StoreResult;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted(Mutex<Vec<i64>>);

    impl CandidateSource for Scripted {
        fn next_candidate(&self) -> PayloadId {
            let mut ids = self.0.lock().unwrap();
            let next = if ids.len() > 1 { ids.remove(0) } else { ids[0] };
            PayloadId::new(next)
        }
    }

    /// Store whose probe always says "free", so every collision surfaces at insert
    struct BlindProbe(Arc<MemoryStore>);

    #[async_trait]
    impl VideoStore for BlindProbe {
        async fn insert(&self, record: &VideoRecord) -> StoreResult<()> {
            self.0.insert(record).await
        }

        async fn lookup(&self, payload_id: PayloadId) -> StoreResult<Option<String>> {
            self.0.lookup(payload_id).await
        }

        async fn exists(&self, _payload_id: PayloadId) -> StoreResult<bool> {
            Ok(false)
        }
    }

    fn registry_with(store: Arc<MemoryStore>) -> Registry {
        Registry::new(store.clone(), store)
    }

    #[tokio::test]
    async fn test_register_then_resolve() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_with(store.clone());

        let id = registry.register("file:AAA").await.unwrap();
        let resolution = registry.resolve(id, 42).await.unwrap();

        assert_eq!(resolution, Resolution::Found("file:AAA".to_string()));
        let logs = store.access_log_entries().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].requester_id, 42);
        assert_eq!(logs[0].payload_id, id);
    }

    #[tokio::test]
    async fn test_unknown_id_writes_no_log() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_with(store.clone());

        let resolution = registry.resolve(PayloadId::new(999_999), 7).await.unwrap();

        assert_eq!(resolution, Resolution::NotFound);
        assert!(store.access_log_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_resource_ref_rejected() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_with(store.clone());

        let err = registry.register("").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidResourceRef(_)));
        assert_eq!(store.video_count(), 0);
    }

    #[tokio::test]
    async fn test_insert_conflict_retries_with_fresh_id() {
        let inner = Arc::new(MemoryStore::new());
        inner
            .insert(&VideoRecord::new(PayloadId::new(1_234_567_890), "file:existing"))
            .await
            .unwrap();

        let registry = Registry::new(Arc::new(BlindProbe(inner.clone())), inner.clone())
            .with_allocator(IdAllocator::new(
                Scripted(Mutex::new(vec![1_234_567_890, 1_234_567_890, 2_222_222_222])),
                1,
            ));

        let id = registry.register("file:new").await.unwrap();

        assert_eq!(id, PayloadId::new(2_222_222_222));
        assert_eq!(
            inner.lookup(PayloadId::new(1_234_567_890)).await.unwrap().as_deref(),
            Some("file:existing")
        );
    }

    #[tokio::test]
    async fn test_persistent_conflict_exhausts() {
        let inner = Arc::new(MemoryStore::new());
        inner
            .insert(&VideoRecord::new(PayloadId::new(3_000_000_003), "file:existing"))
            .await
            .unwrap();

        let registry = Registry::new(Arc::new(BlindProbe(inner.clone())), inner.clone())
            .with_allocator(IdAllocator::new(Scripted(Mutex::new(vec![3_000_000_003])), 1))
            .with_max_attempts(5);

        let err = registry.register("file:new").await.unwrap_err();

        assert!(matches!(err, RegistryError::AllocationExhausted { attempts: 5 }));
        assert_eq!(inner.video_count(), 1);
    }

    #[tokio::test]
    async fn test_start_payload_parsing() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_with(store.clone());
        let id = registry.register("file:CCC").await.unwrap();

        let hit = registry
            .resolve_start_payload(&id.to_string(), 1)
            .await
            .unwrap();
        assert_eq!(hit.into_resource_ref().as_deref(), Some("file:CCC"));

        let miss = registry.resolve_start_payload("video_12", 1).await.unwrap();
        assert_eq!(miss, Resolution::NotFound);
        assert_eq!(store.access_log_entries().await.len(), 1);
    }

    #[test]
    fn test_max_attempts_clamped() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(registry_with(store).with_max_attempts(0).max_attempts(), 1);
    }
}
