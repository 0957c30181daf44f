use crate::error::{Result, StudioError};
use crate::store::{new_record_id, Latency, Record, RecordStore, SeedFn};
use crate::types::RecordId;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{RwLock, RwLockWriteGuard};

struct Inner<R> {
    records: Vec<R>,
    /// Set once the lazy seed has been considered; seeding never repeats.
    seed_checked: bool,
    /// Set by the first successful mutation.
    written: bool,
}

/// In-memory record collection for tests and the single-session POC.
///
/// All work happens under a synchronous lock that is never held across an
/// await; latency is paid before the lock is taken.
pub struct MemoryStore<R: Record> {
    inner: RwLock<Inner<R>>,
    seed: Option<SeedFn<R>>,
    latency: Latency,
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Vec::new(),
                seed_checked: false,
                written: false,
            }),
            seed: None,
            latency: Latency::NONE,
        }
    }

    /// Builder: seed `seed()` on the first read of an empty store.
    pub fn with_seed(mut self, seed: SeedFn<R>) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    fn lock(&self) -> Result<RwLockWriteGuard<'_, Inner<R>>> {
        self.inner
            .write()
            .map_err(|e| StudioError::Storage(format!("Lock: {}", e)))
    }

    fn lock_seeded(&self) -> Result<RwLockWriteGuard<'_, Inner<R>>> {
        let mut inner = self.lock()?;
        if !inner.seed_checked {
            inner.seed_checked = true;
            if let (true, Some(seed)) = (inner.records.is_empty(), &self.seed) {
                let record = R::create(new_record_id(), seed(), Utc::now());
                tracing::warn!(kind = %R::KIND, id = %record.id(), "store empty, seeding default record");
                inner.records.push(record);
                inner.written = true;
            }
        }
        Ok(inner)
    }

    fn list_now(&self) -> Result<Vec<R>> {
        Ok(self.lock_seeded()?.records.clone())
    }

    fn get_now(&self, id: RecordId) -> Result<R> {
        self.lock_seeded()?
            .records
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| StudioError::not_found(R::KIND, id))
    }

    fn create_now(&self, draft: R::Draft) -> Result<R> {
        let mut inner = self.lock()?;
        let mut id = new_record_id();
        while inner.records.iter().any(|r| r.id() == id) {
            id = new_record_id();
        }
        let record = R::create(id, draft, Utc::now());
        inner.records.push(record.clone());
        inner.written = true;
        Ok(record)
    }

    fn update_now(&self, id: RecordId, patch: R::Patch) -> Result<R> {
        let mut inner = self.lock()?;
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StudioError::not_found(R::KIND, id))?;
        record.apply(patch, Utc::now());
        let updated = record.clone();
        inner.written = true;
        Ok(updated)
    }

    fn delete_now(&self, id: RecordId) -> Result<()> {
        let mut inner = self.lock()?;
        let index = inner
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| StudioError::not_found(R::KIND, id))?;
        inner.records.remove(index);
        inner.written = true;
        Ok(())
    }

    fn retain_now(&self, keep: &(dyn for<'k> Fn(&'k R) -> bool + Send + Sync)) -> Result<usize> {
        let mut inner = self.lock()?;
        let before = inner.records.len();
        inner.records.retain(|r| keep(r));
        let removed = before - inner.records.len();
        if removed > 0 {
            inner.written = true;
        }
        Ok(removed)
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn list(&self) -> Result<Vec<R>> {
        self.latency.read_pause().await;
        self.list_now()
    }

    async fn get(&self, id: RecordId) -> Result<R> {
        self.latency.read_pause().await;
        self.get_now(id)
    }

    async fn create(&self, draft: R::Draft) -> Result<R> {
        self.latency.write_pause().await;
        let record = self.create_now(draft)?;
        tracing::debug!(kind = %R::KIND, id = %record.id(), "record created");
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<R> {
        self.latency.write_pause().await;
        let record = self.update_now(id, patch)?;
        tracing::debug!(kind = %R::KIND, id = %id, "record updated");
        Ok(record)
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.latency.write_pause().await;
        self.delete_now(id)?;
        tracing::debug!(kind = %R::KIND, id = %id, "record deleted");
        Ok(())
    }

    async fn retain(&self, keep: &(dyn for<'k> Fn(&'k R) -> bool + Send + Sync)) -> Result<usize> {
        self.latency.write_pause().await;
        self.retain_now(keep)
    }

    async fn is_pristine(&self) -> Result<bool> {
        Ok(!self.lock()?.written)
    }
}
