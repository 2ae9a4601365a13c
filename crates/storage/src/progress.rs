//! The persistence port for cross-session progress.
//!
//! Mastery is the only state that survives a restart. It is stored as a JSON
//! snapshot under a fixed key through the small [`ProgressStore`] KV
//! interface, so the same code runs against a file on disk, memory, or
//! whatever a platform provides. Writes are last-writer-wins with no
//! transactional guarantees.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::bank::StorageError;

/// Storage key for the mastery snapshot.
pub const MASTERY_KEY: &str = "quiz-correct-answers";

//
// ─── KV PORT ───────────────────────────────────────────────────────────────────
//

/// Minimal string key-value store.
///
/// Keys are short fixed names chosen by this crate, never user input.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Fetch a value, `None` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backing store cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the value cannot be persisted.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Erase a key; removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backing store cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory progress store for tests.
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Load(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Load(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Load(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// File-backed progress store: one JSON document per key in a state
/// directory, created on first write.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl ProgressStore for FileProgressStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.key_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.key_path(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}

//
// ─── MASTERY SNAPSHOT ──────────────────────────────────────────────────────────
//

/// Persisted shape of the mastered-question set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterySnapshot {
    pub bank_fingerprint: String,
    pub mastered_question_indices: Vec<usize>,
    pub saved_at: DateTime<Utc>,
}

/// Fingerprint-scoped mastery persistence over a [`ProgressStore`].
#[derive(Clone)]
pub struct MasteryStore {
    store: Arc<dyn ProgressStore>,
}

impl MasteryStore {
    #[must_use]
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Restores the mastered indices saved for the given bank fingerprint.
    ///
    /// A missing, corrupt, or mismatching snapshot restores nothing: mastery
    /// scoped to another bank must never leak into this one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backing store cannot be read.
    pub async fn load(&self, fingerprint: &str) -> Result<Vec<usize>, StorageError> {
        let Some(stored) = self.store.get(MASTERY_KEY).await? else {
            return Ok(Vec::new());
        };
        let Ok(snapshot) = serde_json::from_str::<MasterySnapshot>(&stored) else {
            return Ok(Vec::new());
        };
        if snapshot.bank_fingerprint != fingerprint {
            return Ok(Vec::new());
        }
        Ok(snapshot.mastered_question_indices)
    }

    /// Writes the snapshot, replacing whatever was stored before.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails, or the
    /// backing store's write error.
    pub async fn save(&self, snapshot: &MasterySnapshot) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(snapshot)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(MASTERY_KEY, &encoded).await
    }

    /// Erases the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backing store cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(MASTERY_KEY).await
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use qcm_core::time::fixed_now;

    fn snapshot(fingerprint: &str, indices: Vec<usize>) -> MasterySnapshot {
        MasterySnapshot {
            bank_fingerprint: fingerprint.to_string(),
            mastered_question_indices: indices,
            saved_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn load_restores_only_on_fingerprint_match() {
        let mastery = MasteryStore::new(Arc::new(InMemoryProgressStore::new()));
        mastery.save(&snapshot("F1", vec![0, 2])).await.unwrap();

        assert_eq!(mastery.load("F1").await.unwrap(), vec![0, 2]);
        assert!(mastery.load("F2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_without_snapshot_is_empty() {
        let mastery = MasteryStore::new(Arc::new(InMemoryProgressStore::new()));
        assert!(mastery.load("F1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_snapshot_restores_nothing() {
        let store = Arc::new(InMemoryProgressStore::new());
        store.set(MASTERY_KEY, "pas du json").await.unwrap();

        let mastery = MasteryStore::new(store);
        assert!(mastery.load("F1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_replaces_the_previous_snapshot() {
        let mastery = MasteryStore::new(Arc::new(InMemoryProgressStore::new()));
        mastery.save(&snapshot("F1", vec![0])).await.unwrap();
        mastery.save(&snapshot("F1", vec![0, 1])).await.unwrap();

        assert_eq!(mastery.load("F1").await.unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn clear_erases_the_snapshot() {
        let mastery = MasteryStore::new(Arc::new(InMemoryProgressStore::new()));
        mastery.save(&snapshot("F1", vec![1])).await.unwrap();
        mastery.clear().await.unwrap();
        assert!(mastery.load("F1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_an_absent_key_is_fine() {
        let store = InMemoryProgressStore::new();
        store.remove(MASTERY_KEY).await.unwrap();
    }
}
