//! JSON document store
//!
//! The captain's only durable state is three human-readable JSON
//! documents under the data directory: `crew.json` (sailors by name),
//! `chores.json` (chores by id string), `users.json` (quota records by
//! UID). Each document is guarded by one async mutex and replaced as a
//! whole file via write-to-temp-and-rename, so a concurrent reader never
//! observes a torn document.
//!
//! A missing or unparsable file loads as the empty document; the store
//! never propagates a load failure into the control loop.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;

use flotilla_core::domain::chore::Chore;
use flotilla_core::domain::sailor::Sailor;
use flotilla_core::domain::user::User;

/// Crew document: sailors keyed by name.
pub type CrewDoc = BTreeMap<String, Sailor>;
/// Chores document: chores keyed by id rendered as a string.
pub type ChoresDoc = BTreeMap<String, Chore>;
/// Users document: quota records keyed by UID string.
pub type UsersDoc = BTreeMap<String, User>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One JSON document plus its in-memory authoritative copy.
///
/// The in-memory value is the writer-side cache: it is loaded once at
/// startup and every mutation goes through [`Document::with_lock`],
/// which persists before releasing the lock. If the write fails the
/// mutation is rolled back, so memory and disk never drift apart.
#[derive(Debug)]
pub struct Document<T> {
    path: PathBuf,
    value: Mutex<T>,
}

impl<T> Document<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Loads the document from disk, falling back to the empty document
    /// on a missing file or a parse failure.
    pub fn load(path: PathBuf) -> Self {
        let value = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    tracing::error!("Failed parsing {}: {}", path.display(), err);
                    T::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(err) => {
                tracing::error!("Failed reading {}: {}", path.display(), err);
                T::default()
            }
        };

        Self {
            path,
            value: Mutex::new(value),
        }
    }

    /// Clones the current value under the lock.
    pub async fn snapshot(&self) -> T {
        self.value.lock().await.clone()
    }

    /// Computes something from the current value without persisting.
    pub async fn with_read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.value.lock().await;
        f(&value)
    }

    /// Atomically reads, mutates, and writes the document.
    ///
    /// On a persistence failure the in-memory mutation is rolled back
    /// and the error is returned to the caller.
    pub async fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let mut value = self.value.lock().await;
        let before = value.clone();
        let out = f(&mut value);

        if let Err(err) = self.persist(&value).await {
            tracing::error!("Failed persisting {}: {}", self.path.display(), err);
            *value = before;
            return Err(err);
        }

        Ok(out)
    }

    /// Whole-file JSON replace: serialize, write a sibling temp file,
    /// rename over the target.
    async fn persist(&self, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// The three documents the captain owns.
#[derive(Debug)]
pub struct Store {
    pub crew: Document<CrewDoc>,
    pub chores: Document<ChoresDoc>,
    pub users: Document<UsersDoc>,
}

impl Store {
    /// Opens (or creates) the data directory and loads all documents.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            crew: Document::load(data_dir.join("crew.json")),
            chores: Document::load(data_dir.join("chores.json")),
            users: Document::load(data_dir.join("users.json")),
        })
    }
}
