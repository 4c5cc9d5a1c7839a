use tokio::sync::Mutex;
use tracing::{info, warn};

use radix_core::model::{ProgressDelta, StudyProgress};
use storage::repository::{ProgressRecord, ProgressStore};

use crate::Clock;
use crate::error::LedgerError;

/// Owner of the persisted study progress.
///
/// Merges run one at a time: the read, merge and write of one delta complete
/// before the next delta is read, so concurrent completions never lose updates.
pub struct ProgressLedger {
    clock: Clock,
    store: ProgressStore,
    write_retries: u32,
    merge_lock: Mutex<()>,
}

impl ProgressLedger {
    #[must_use]
    pub fn new(clock: Clock, store: ProgressStore) -> Self {
        Self {
            clock,
            store,
            write_retries: 0,
            merge_lock: Mutex::new(()),
        }
    }

    /// Retry a failed write up to `retries` extra times before giving up.
    #[must_use]
    pub fn with_write_retries(mut self, retries: u32) -> Self {
        self.write_retries = retries;
        self
    }

    /// Current aggregate, or `None` if nothing has been recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Storage` if the store cannot be read or decoded.
    pub async fn load(&self) -> Result<Option<StudyProgress>, LedgerError> {
        let _guard = self.merge_lock.lock().await;
        Ok(self.store.load().await?)
    }

    /// Fold `delta` into the stored aggregate and persist the result.
    ///
    /// Fields of the stored record that the ledger does not model are written back as read.
    ///
    /// # Errors
    ///
    /// - `LedgerError::Storage` if the existing aggregate cannot be read.
    /// - `LedgerError::WriteFailure` if the merged aggregate could not be written.
    pub async fn record(&self, delta: ProgressDelta) -> Result<StudyProgress, LedgerError> {
        let _guard = self.merge_lock.lock().await;

        let mut record = self
            .store
            .load_record()
            .await
            .inspect_err(|err| {
                warn!(error = %err, "failed to read study progress");
            })?;
        let existing = record.as_ref().map(ProgressRecord::progress);
        let merged = StudyProgress::merge(existing.as_ref(), delta, self.clock.now());
        let record = record.get_or_insert_with(ProgressRecord::default);
        record.set_progress(&merged);
        self.write(record).await?;

        info!(
            correct = delta.correct(),
            total = delta.total(),
            total_questions = merged.total_questions,
            "recorded session in study progress"
        );
        Ok(merged)
    }

    async fn write(&self, record: &ProgressRecord) -> Result<(), LedgerError> {
        let attempts = self.write_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.save_record(record).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < attempts => {
                    warn!(attempt, error = %err, "study progress write failed, retrying");
                }
                Err(err) => {
                    warn!(attempt, error = %err, "study progress write failed");
                    return Err(LedgerError::WriteFailure {
                        attempts,
                        source: err,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use radix_core::time::fixed_now;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use storage::repository::{InMemoryStore, KeyValueStore, STUDY_PROGRESS_KEY, StorageError};

    /// Yields inside every call so interleavings are exercised.
    #[derive(Clone, Default)]
    struct YieldingStore {
        inner: InMemoryStore,
    }

    #[async_trait]
    impl KeyValueStore for YieldingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            tokio::task::yield_now().await;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            tokio::task::yield_now().await;
            self.inner.set(key, value).await
        }
    }

    /// Fails the first `failures` writes.
    struct FlakyStore {
        inner: InMemoryStore,
        failures: AtomicU32,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StorageError::WriteFailure("disk full".into()));
            }
            self.inner.set(key, value).await
        }
    }

    fn ledger_with(kv: Arc<dyn KeyValueStore>) -> ProgressLedger {
        ProgressLedger::new(Clock::fixed(fixed_now()), ProgressStore::new(kv))
    }

    fn delta(correct: u32, total: u32) -> ProgressDelta {
        ProgressDelta::new(correct, total).unwrap()
    }

    #[tokio::test]
    async fn first_record_starts_from_zero() {
        let ledger = ledger_with(Arc::new(InMemoryStore::new()));
        assert_eq!(ledger.load().await.unwrap(), None);

        let progress = ledger.record(delta(3, 5)).await.unwrap();
        assert_eq!(progress.total_questions, 5);
        assert_eq!(progress.correct_answers, 3);
        assert_eq!(progress.wrong_answers, 2);
        assert_eq!(progress.last_study_date, Some(fixed_now()));
        assert_eq!(ledger.load().await.unwrap(), Some(progress));
    }

    #[tokio::test]
    async fn records_accumulate() {
        let ledger = ledger_with(Arc::new(InMemoryStore::new()));
        ledger.record(delta(3, 5)).await.unwrap();
        let progress = ledger.record(delta(10, 10)).await.unwrap();
        assert_eq!(progress.total_questions, 15);
        assert_eq!(progress.correct_answers, 13);
        assert_eq!(progress.wrong_answers, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_do_not_lose_updates() {
        let ledger = Arc::new(ledger_with(Arc::new(YieldingStore::default())));

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.record(delta(i % 2, 1)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let progress = ledger.load().await.unwrap().unwrap();
        assert_eq!(progress.total_questions, 32);
        assert_eq!(progress.correct_answers, 16);
        assert_eq!(progress.wrong_answers, 16);
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryStore::new(),
            failures: AtomicU32::new(1),
        });
        let ledger = ledger_with(store.clone());

        let err = ledger.record(delta(1, 1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::WriteFailure { attempts: 1, .. }));
        assert_eq!(store.inner.get(STUDY_PROGRESS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn retries_recover_from_transient_failures() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryStore::new(),
            failures: AtomicU32::new(2),
        });
        let ledger = ledger_with(store).with_write_retries(2);

        let progress = ledger.record(delta(2, 4)).await.unwrap();
        assert_eq!(progress.total_questions, 4);
        assert_eq!(ledger.load().await.unwrap(), Some(progress));
    }

    #[tokio::test]
    async fn recording_keeps_fields_owned_by_the_host() {
        let kv = InMemoryStore::new();
        kv.set(
            STUDY_PROGRESS_KEY,
            r#"{"totalQuestions":4,"correctAnswers":3,"wrongAnswers":1,"studyTime":120,"completedLessons":["intro"]}"#,
        )
        .await
        .unwrap();
        let ledger = ledger_with(Arc::new(kv.clone()));

        let progress = ledger.record(delta(1, 1)).await.unwrap();
        assert_eq!(progress.total_questions, 5);
        assert_eq!(progress.correct_answers, 4);

        let raw = kv.get(STUDY_PROGRESS_KEY).await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["totalQuestions"], 5);
        assert_eq!(json["studyTime"], 120);
        assert_eq!(json["completedLessons"], serde_json::json!(["intro"]));
    }

    #[tokio::test]
    async fn corrupt_progress_surfaces_storage_error() {
        let kv = InMemoryStore::new();
        kv.set(STUDY_PROGRESS_KEY, "{broken").await.unwrap();
        let ledger = ledger_with(Arc::new(kv));

        let err = ledger.record(delta(1, 1)).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Storage(StorageError::Serialization(_))
        ));
    }
}
