use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

/// Outcome of a single session, proposed for accumulation into `StudyProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressDelta {
    correct: u32,
    total: u32,
}

impl ProgressDelta {
    /// # Errors
    ///
    /// Returns `ProgressError::CorrectExceedsTotal` if `correct > total`.
    pub fn new(correct: u32, total: u32) -> Result<Self, ProgressError> {
        if correct > total {
            return Err(ProgressError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self { correct, total })
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.total - self.correct
    }
}

/// Aggregate study statistics across every completed session.
///
/// Totals only ever grow; resetting them is left to whoever owns the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudyProgress {
    pub total_questions: u64,
    pub correct_answers: u64,
    pub wrong_answers: u64,
    pub last_study_date: Option<DateTime<Utc>>,
}

impl StudyProgress {
    /// Folds `delta` into `existing`, treating an absent aggregate as all zeros.
    #[must_use]
    pub fn merge(existing: Option<&Self>, delta: ProgressDelta, now: DateTime<Utc>) -> Self {
        let base = existing.cloned().unwrap_or_default();
        Self {
            total_questions: base.total_questions.saturating_add(u64::from(delta.total())),
            correct_answers: base.correct_answers.saturating_add(u64::from(delta.correct())),
            wrong_answers: base.wrong_answers.saturating_add(u64::from(delta.wrong())),
            last_study_date: Some(now),
        }
    }

    /// Share of correct answers, rounded to a whole percent. Zero when nothing was answered.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        rounded_percent(self.correct_answers, self.total_questions)
    }
}

/// `part / whole * 100`, rounded half up; zero when `whole` is zero.
pub(crate) fn rounded_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = u128::from(part);
    let whole = u128::from(whole);
    let rounded = (part * 200 + whole) / (whole * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn delta(correct: u32, total: u32) -> ProgressDelta {
        ProgressDelta::new(correct, total).unwrap()
    }

    #[test]
    fn merge_initializes_absent_progress() {
        let now = fixed_now();
        let merged = StudyProgress::merge(None, delta(7, 10), now);
        assert_eq!(merged.total_questions, 10);
        assert_eq!(merged.correct_answers, 7);
        assert_eq!(merged.wrong_answers, 3);
        assert_eq!(merged.last_study_date, Some(now));
    }

    #[test]
    fn merge_is_additive() {
        let now = fixed_now();
        let later = now + Duration::minutes(5);
        let d1 = delta(3, 5);
        let d2 = delta(9, 10);

        let stepwise = StudyProgress::merge(Some(&StudyProgress::merge(None, d1, now)), d2, later);
        let combined = StudyProgress::merge(None, delta(12, 15), now);

        assert_eq!(stepwise.total_questions, combined.total_questions);
        assert_eq!(stepwise.correct_answers, combined.correct_answers);
        assert_eq!(stepwise.wrong_answers, combined.wrong_answers);
        assert_eq!(stepwise.last_study_date, Some(later));
    }

    #[test]
    fn delta_rejects_more_correct_than_total() {
        assert_eq!(
            ProgressDelta::new(3, 2).unwrap_err(),
            ProgressError::CorrectExceedsTotal { correct: 3, total: 2 }
        );
    }

    #[test]
    fn accuracy_rounds_and_handles_empty() {
        assert_eq!(StudyProgress::default().accuracy_percent(), 0);
        let progress = StudyProgress {
            total_questions: 3,
            correct_answers: 2,
            wrong_answers: 1,
            last_study_date: None,
        };
        assert_eq!(progress.accuracy_percent(), 67);
        assert_eq!(rounded_percent(1, 2), 50);
        assert_eq!(rounded_percent(1, 8), 13);
    }
}
