//! Credential store.
//!
//! Holds exactly one [`UserCredential`] per [`ExternalId`]. The JSON-backed
//! implementation keeps all records in memory behind a `RwLock` and writes a
//! full snapshot on every change:
//!
//! ```text
//! state/
//! └── credentials.json   { "credentials": [ {...}, {...} ] }
//! ```
//!
//! Writes are serialized by the lock, so concurrent upserts for the same
//! identity resolve as last-writer-wins.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use davomat_models::{CredentialUpdate, ExternalId, UserCredential};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::{PersistenceError, Result};

/// Read/write contract for stored credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the record for `id`, if any.
    async fn get(&self, id: &ExternalId) -> Result<Option<UserCredential>>;

    /// Creates the record if absent, otherwise updates only the supplied
    /// fields. Returns the record as stored.
    async fn upsert(&self, id: &ExternalId, update: CredentialUpdate) -> Result<UserCredential>;

    /// Deletes the record for `id`. Returns whether one existed.
    async fn remove(&self, id: &ExternalId) -> Result<bool>;
}

#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    credentials: Vec<UserCredential>,
}

/// Credential store persisted as a single JSON file.
pub struct JsonCredentialStore {
    /// Backing file; `None` keeps records in memory only.
    path: Option<PathBuf>,
    records: RwLock<HashMap<ExternalId, UserCredential>>,
}

impl JsonCredentialStore {
    /// Opens (or prepares to create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file: StoreFile = read_json_optional(&path)?.unwrap_or_default();
        let records: HashMap<_, _> = file
            .credentials
            .into_iter()
            .map(|record| (record.external_id.clone(), record))
            .collect();

        info!(count = records.len(), path = %path.display(), "Loaded credential store");

        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// Creates a store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Writes a snapshot of `records` on the blocking pool.
    ///
    /// Callers hold the write guard across this call, so snapshots reach
    /// disk in the order the changes were made.
    async fn persist(&self, records: &HashMap<ExternalId, UserCredential>) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        let mut credentials: Vec<UserCredential> = records.values().cloned().collect();
        credentials.sort_by(|a, b| a.external_id.cmp(&b.external_id));

        let target = path.clone();
        tokio::task::spawn_blocking(move || atomic_write_json(&target, &StoreFile { credentials }))
            .await
            .map_err(|e| PersistenceError::WriteError {
                path,
                source: std::io::Error::other(e),
            })?
    }
}

#[async_trait]
impl CredentialStore for JsonCredentialStore {
    async fn get(&self, id: &ExternalId) -> Result<Option<UserCredential>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn upsert(&self, id: &ExternalId, update: CredentialUpdate) -> Result<UserCredential> {
        let mut records = self.records.write().await;

        let mut record = records
            .get(id)
            .cloned()
            .unwrap_or_else(|| UserCredential::new(id.clone()));
        record.apply(update);

        let previous = records.insert(id.clone(), record.clone());
        if let Err(e) = self.persist(&records).await {
            // Keep memory consistent with disk.
            match previous {
                Some(prev) => records.insert(id.clone(), prev),
                None => records.remove(id),
            };
            return Err(e);
        }

        debug!(external_id = %id, created = previous.is_none(), "Credential record stored");
        Ok(record)
    }

    async fn remove(&self, id: &ExternalId) -> Result<bool> {
        let mut records = self.records.write().await;

        let Some(previous) = records.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&records).await {
            records.insert(id.clone(), previous);
            return Err(e);
        }

        info!(external_id = %id, "Credential record removed");
        Ok(true)
    }
}
