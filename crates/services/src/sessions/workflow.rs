use std::sync::Arc;

use rand::Rng;
use tracing::warn;

use radix_core::QuestionBank;
use radix_core::model::{DifficultyFilter, Score, StudyProgress};

use super::service::{AnswerFeedback, ExamSession, SessionAction, SessionStep};
use crate::error::SessionError;
use crate::ledger::ProgressLedger;
use crate::sampler::{self, DEFAULT_EXAM_SIZE};

/// Result of advancing an exam through the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamAdvance {
    Next { position: usize },
    /// The exam finished and its outcome was merged into the study progress.
    Completed {
        score: Score,
        progress: StudyProgress,
    },
}

/// Orchestrates exam start, answering, and recording outcomes in the ledger.
#[derive(Clone)]
pub struct ExamLoopService {
    bank: Arc<QuestionBank>,
    ledger: Arc<ProgressLedger>,
    exam_size: usize,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>, ledger: Arc<ProgressLedger>) -> Self {
        Self {
            bank,
            ledger,
            exam_size: DEFAULT_EXAM_SIZE,
        }
    }

    #[must_use]
    pub fn with_exam_size(mut self, exam_size: usize) -> Self {
        self.exam_size = exam_size;
        self
    }

    #[must_use]
    pub fn exam_size(&self) -> usize {
        self.exam_size
    }

    /// Draw questions from the bank and start a new exam.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if no question matches `filter`.
    pub fn start_exam<R: Rng + ?Sized>(
        &self,
        filter: DifficultyFilter,
        rng: &mut R,
    ) -> Result<ExamSession, SessionError> {
        let drawn = sampler::draw(self.bank.questions(), self.exam_size, filter, rng)?;
        ExamSession::started(drawn)
    }

    /// Start a new exam using the thread-local random generator.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if no question matches `filter`.
    pub fn start_exam_random(&self, filter: DifficultyFilter) -> Result<ExamSession, SessionError> {
        self.start_exam(filter, &mut rand::rng())
    }

    /// Answer the current question.
    ///
    /// # Errors
    ///
    /// See [`ExamSession::submit_answer`].
    pub fn answer(
        &self,
        session: &mut ExamSession,
        option_index: usize,
    ) -> Result<AnswerFeedback, SessionError> {
        session.submit_answer(option_index)
    }

    /// Advance the exam; on completion merge the score into the study progress.
    ///
    /// If the merge fails the session stays completed and unrecorded, and
    /// [`finalize_progress`](Self::finalize_progress) can retry it.
    ///
    /// # Errors
    ///
    /// Returns session transition errors, or `SessionError::Ledger` if recording fails.
    pub async fn advance(&self, session: &mut ExamSession) -> Result<ExamAdvance, SessionError> {
        match session.advance()? {
            SessionStep::Next { position } => Ok(ExamAdvance::Next { position }),
            SessionStep::Completed(score) => {
                let progress = self.record(session, score).await?;
                Ok(ExamAdvance::Completed { score, progress })
            }
        }
    }

    /// Retry recording a completed session whose merge previously failed.
    ///
    /// Returns the stored progress without merging again if already recorded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the session is not complete,
    /// or `SessionError::Ledger` if the ledger cannot be read or written.
    pub async fn finalize_progress(
        &self,
        session: &mut ExamSession,
    ) -> Result<StudyProgress, SessionError> {
        if !session.is_complete() {
            return Err(SessionError::InvalidTransition {
                action: SessionAction::Record,
                state: session.state(),
            });
        }
        if session.is_recorded() {
            return Ok(self.ledger.load().await?.unwrap_or_default());
        }

        let score = session.score()?;
        self.record(session, score).await
    }

    async fn record(
        &self,
        session: &mut ExamSession,
        score: Score,
    ) -> Result<StudyProgress, SessionError> {
        let progress = self.ledger.record(score.delta()).await.inspect_err(|err| {
            warn!(error = %err, "exam result kept in memory but not recorded");
        })?;
        session.mark_recorded();
        Ok(progress)
    }
}
