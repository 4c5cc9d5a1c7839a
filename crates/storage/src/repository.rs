use async_trait::async_trait;
use chrono::{DateTime, Utc};
use radix_core::model::StudyProgress;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key under which the aggregate study progress is stored.
pub const STUDY_PROGRESS_KEY: &str = "studyProgress";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("write failed: {0}")]
    WriteFailure(String),
}

/// Minimal string key-value store the progress ledger persists through.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WriteFailure` if the value was not stored.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::WriteFailure(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Persisted shape for `StudyProgress`.
///
/// Missing fields read as zero/absent. Fields this crate does not model (such as
/// `studyTime` or `completedLessons` written by the host) are kept in `extra` and
/// written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub total_questions: u64,
    pub correct_answers: u64,
    pub wrong_answers: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_study_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &StudyProgress) -> Self {
        let mut record = Self::default();
        record.set_progress(progress);
        record
    }

    #[must_use]
    pub fn progress(&self) -> StudyProgress {
        StudyProgress {
            total_questions: self.total_questions,
            correct_answers: self.correct_answers,
            wrong_answers: self.wrong_answers,
            last_study_date: self.last_study_date,
        }
    }

    /// Overwrite the modelled counters, leaving `extra` untouched.
    pub fn set_progress(&mut self, progress: &StudyProgress) {
        self.total_questions = progress.total_questions;
        self.correct_answers = progress.correct_answers;
        self.wrong_answers = progress.wrong_answers;
        self.last_study_date = progress.last_study_date;
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if `raw` is not a JSON object of this shape.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Typed access to the `studyProgress` entry of a key-value store.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the stored record, including fields the host owns.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read fails or the payload cannot be decoded.
    pub async fn load_record(&self) -> Result<Option<ProgressRecord>, StorageError> {
        let Some(raw) = self.kv.get(STUDY_PROGRESS_KEY).await? else {
            return Ok(None);
        };
        ProgressRecord::from_json(&raw).map(Some)
    }

    /// Load the stored aggregate; `None` when nothing has been recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read fails or the payload cannot be decoded.
    pub async fn load(&self) -> Result<Option<StudyProgress>, StorageError> {
        Ok(self.load_record().await?.as_ref().map(ProgressRecord::progress))
    }

    /// Replace the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn save_record(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let raw = record.to_json()?;
        self.kv.set(STUDY_PROGRESS_KEY, &raw).await
    }
}

/// Wraps the key-value backend behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        Self { kv }
    }

    #[must_use]
    pub fn progress(&self) -> ProgressStore {
        ProgressStore::new(Arc::clone(&self.kv))
    }
}
