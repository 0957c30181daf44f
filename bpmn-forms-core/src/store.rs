use crate::error::Result;
use crate::types::{RecordId, RecordKind, Timestamp};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// A persisted record type: processes, forms and integrations.
///
/// `Draft` carries every field except id and timestamps; `Patch` carries
/// the subset to overwrite. `apply` must leave `id` and the created
/// timestamp untouched.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Draft: Send + 'static;
    type Patch: Send + 'static;
    const KIND: RecordKind;

    fn id(&self) -> RecordId;
    fn create(id: RecordId, draft: Self::Draft, now: Timestamp) -> Self;
    fn apply(&mut self, patch: Self::Patch, now: Timestamp);
}

/// Produces the default record a store seeds itself with.
pub type SeedFn<R> = Arc<dyn Fn() -> <R as Record>::Draft + Send + Sync>;

/// CRUD contract shared by every collection and backend.
///
/// Missing ids surface as `StudioError::NotFound`, never as an empty value.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// All records. Seeds the default record on first access to an empty store.
    async fn list(&self) -> Result<Vec<R>>;

    async fn get(&self, id: RecordId) -> Result<R>;

    /// Assign a fresh id and equal created/updated timestamps.
    async fn create(&self, draft: R::Draft) -> Result<R>;

    /// Merge `patch` over the stored record and refresh its updated timestamp.
    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<R>;

    async fn delete(&self, id: RecordId) -> Result<()>;

    /// Drop every record `keep` rejects. Returns how many were removed.
    async fn retain(&self, keep: &(dyn for<'k> Fn(&'k R) -> bool + Send + Sync)) -> Result<usize>;

    /// True until the collection is first written. A collection emptied by
    /// deletes is no longer pristine.
    async fn is_pristine(&self) -> Result<bool>;
}

/// Artificial per-operation delay, modelling a remote API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Latency {
    pub read: Duration,
    pub write: Duration,
}

impl Latency {
    pub const NONE: Latency = Latency {
        read: Duration::ZERO,
        write: Duration::ZERO,
    };

    pub fn from_millis(read_ms: u64, write_ms: u64) -> Self {
        Self {
            read: Duration::from_millis(read_ms),
            write: Duration::from_millis(write_ms),
        }
    }

    pub(crate) async fn read_pause(&self) {
        pause(self.read).await;
    }

    pub(crate) async fn write_pause(&self) {
        pause(self.write).await;
    }
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

pub(crate) fn new_record_id() -> RecordId {
    uuid::Uuid::new_v4()
}
