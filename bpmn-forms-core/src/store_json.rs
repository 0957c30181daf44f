//! Key-value persistence: one JSON array per collection.
//!
//! Each collection lives at `<dir>/<key>.json`, where `key` is the
//! collection's logical storage key. A missing file reads as an empty
//! collection and is the only state in which the default record is seeded.

use crate::error::{Result, StudioError};
use crate::store::{new_record_id, Latency, Record, RecordStore, SeedFn};
use crate::types::RecordId;
use async_trait::async_trait;
use chrono::Utc;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JsonFileStore<R: Record> {
    path: PathBuf,
    seed: Option<SeedFn<R>>,
    latency: Latency,
    /// Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> JsonFileStore<R> {
    /// Store under `dir` using the record kind's storage key.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_key(dir, R::KIND.storage_key())
    }

    pub fn with_key(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
            seed: None,
            latency: Latency::NONE,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn with_seed(mut self, seed: SeedFn<R>) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file does not exist yet.
    async fn read_raw(&self) -> Result<Option<Vec<R>>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(Some(Vec::new())),
            Ok(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                StudioError::Storage(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_all(&self) -> Result<Vec<R>> {
        Ok(self.read_raw().await?.unwrap_or_default())
    }

    /// Write via a sibling temp file and rename so readers never see a torn array.
    async fn write_all(&self, records: &[R]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn read_seeded(&self) -> Result<Vec<R>> {
        if let Some(records) = self.read_raw().await? {
            return Ok(records);
        }
        let Some(seed) = &self.seed else {
            return Ok(Vec::new());
        };

        let _guard = self.write_lock.lock().await;
        // Another writer may have created the file while we waited.
        if let Some(records) = self.read_raw().await? {
            return Ok(records);
        }
        let record = R::create(new_record_id(), seed(), Utc::now());
        tracing::warn!(kind = %R::KIND, id = %record.id(), path = %self.path.display(), "no stored collection, seeding default record");
        let records = vec![record];
        self.write_all(&records).await?;
        Ok(records)
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for JsonFileStore<R> {
    async fn list(&self) -> Result<Vec<R>> {
        self.latency.read_pause().await;
        self.read_seeded().await
    }

    async fn get(&self, id: RecordId) -> Result<R> {
        self.latency.read_pause().await;
        self.read_seeded()
            .await?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| StudioError::not_found(R::KIND, id))
    }

    async fn create(&self, draft: R::Draft) -> Result<R> {
        self.latency.write_pause().await;
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        let mut id = new_record_id();
        while records.iter().any(|r| r.id() == id) {
            id = new_record_id();
        }
        let record = R::create(id, draft, Utc::now());
        records.push(record.clone());
        self.write_all(&records).await?;
        tracing::debug!(kind = %R::KIND, id = %record.id(), "record created");
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<R> {
        self.latency.write_pause().await;
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StudioError::not_found(R::KIND, id))?;
        record.apply(patch, Utc::now());
        let updated = record.clone();
        self.write_all(&records).await?;
        tracing::debug!(kind = %R::KIND, id = %id, "record updated");
        Ok(updated)
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.latency.write_pause().await;
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| StudioError::not_found(R::KIND, id))?;
        records.remove(index);
        self.write_all(&records).await?;
        tracing::debug!(kind = %R::KIND, id = %id, "record deleted");
        Ok(())
    }

    async fn retain(&self, keep: &(dyn for<'k> Fn(&'k R) -> bool + Send + Sync)) -> Result<usize> {
        self.latency.write_pause().await;
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        let before = records.len();
        records.retain(|r| keep(r));
        let removed = before - records.len();
        if removed > 0 {
            self.write_all(&records).await?;
        }
        Ok(removed)
    }

    /// Only a missing file is pristine; an empty array has been written.
    async fn is_pristine(&self) -> Result<bool> {
        Ok(self.read_raw().await?.is_none())
    }
}
