use std::sync::Arc;

use radix_core::QuestionBank;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::ledger::ProgressLedger;
use crate::practice::PracticeService;
use crate::sampler::DEFAULT_EXAM_SIZE;
use crate::sessions::ExamLoopService;

/// Assembles app-facing services over one storage backend and the bundled bank.
#[derive(Clone)]
pub struct AppServices {
    bank: Arc<QuestionBank>,
    ledger: Arc<ProgressLedger>,
    exam_loop: Arc<ExamLoopService>,
    practice: PracticeService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the bundled
    /// question bank does not validate.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        exam_size: usize,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::with_storage(&storage, clock, exam_size)
    }

    /// Build services over an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Question` if the bundled question bank does not validate.
    pub fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::with_storage(&Storage::in_memory(), clock, DEFAULT_EXAM_SIZE)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Question` if the bundled question bank does not validate.
    pub fn with_storage(
        storage: &Storage,
        clock: Clock,
        exam_size: usize,
    ) -> Result<Self, AppServicesError> {
        let bank = Arc::new(QuestionBank::builtin()?);
        let ledger = Arc::new(ProgressLedger::new(clock, storage.progress()).with_write_retries(1));
        let exam_loop = Arc::new(
            ExamLoopService::new(Arc::clone(&bank), Arc::clone(&ledger)).with_exam_size(exam_size),
        );

        Ok(Self {
            bank,
            ledger,
            exam_loop,
            practice: PracticeService::new(),
        })
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<ProgressLedger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn exam_loop(&self) -> Arc<ExamLoopService> {
        Arc::clone(&self.exam_loop)
    }

    #[must_use]
    pub fn practice(&self) -> PracticeService {
        self.practice
    }
}
