use std::fmt;

use radix_core::model::{OPTION_COUNT, Question, Score};
use tracing::debug;

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of an exam session. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::NotStarted => "not started",
            SessionState::InProgress => "in progress",
            SessionState::Completed => "completed",
        })
    }
}

/// Operations a caller can attempt on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    SubmitAnswer,
    Advance,
    Score,
    Record,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionAction::Start => "start",
            SessionAction::SubmitAnswer => "submit an answer",
            SessionAction::Advance => "advance",
            SessionAction::Score => "read the score",
            SessionAction::Record => "record the result",
        })
    }
}

//
// ─── ENTRIES ───────────────────────────────────────────────────────────────────
//

/// One drawn question together with the player's choice, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    question: Question,
    selected: Option<usize>,
}

impl SessionEntry {
    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.selected.is_some_and(|index| self.question.is_correct(index))
    }
}

/// What the UI needs to reveal once a question is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    /// The option recorded for this question (the first submission wins).
    pub selected: usize,
    pub correct_answer: usize,
    pub is_correct: bool,
    /// False when the question had already been answered and nothing changed.
    pub newly_recorded: bool,
    pub explanation: String,
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Next { position: usize },
    Completed(Score),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for a single exam attempt.
///
/// The drawn question list is fixed once started; each entry can be answered once.
#[derive(Default)]
pub struct ExamSession {
    state: SessionState,
    entries: Vec<SessionEntry>,
    position: usize,
    correct: u32,
    recorded: bool,
}

impl ExamSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and start it with `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if `questions` is empty.
    pub fn started(questions: Vec<Question>) -> Result<Self, SessionError> {
        let mut session = Self::new();
        session.start(questions)?;
        Ok(session)
    }

    /// Move from `NotStarted` to `InProgress` with the drawn questions.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` if the session was already started.
    /// - `SessionError::EmptyPool` if `questions` is empty.
    pub fn start(&mut self, questions: Vec<Question>) -> Result<(), SessionError> {
        self.expect_state(SessionAction::Start, SessionState::NotStarted)?;
        if questions.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        self.entries = questions
            .into_iter()
            .map(|question| SessionEntry {
                question,
                selected: None,
            })
            .collect();
        self.position = 0;
        self.correct = 0;
        self.state = SessionState::InProgress;
        debug!(questions = self.entries.len(), "exam session started");
        Ok(())
    }

    /// Record the player's choice for the current question.
    ///
    /// Submitting again for an answered question changes nothing and returns the
    /// feedback for the original choice, whatever `option_index` is.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` unless the session is in progress.
    /// - `SessionError::OptionOutOfRange` if the question is unanswered and
    ///   `option_index` is not a valid option.
    pub fn submit_answer(&mut self, option_index: usize) -> Result<AnswerFeedback, SessionError> {
        self.expect_state(SessionAction::SubmitAnswer, SessionState::InProgress)?;

        let position = self.position;
        let entry = self
            .entries
            .get_mut(position)
            .ok_or(SessionError::InvalidTransition {
                action: SessionAction::SubmitAnswer,
                state: SessionState::Completed,
            })?;

        let newly_recorded = entry.selected.is_none();
        if newly_recorded {
            if option_index >= OPTION_COUNT {
                return Err(SessionError::OptionOutOfRange {
                    index: option_index,
                });
            }
            entry.selected = Some(option_index);
            if entry.question.is_correct(option_index) {
                self.correct += 1;
            }
        }

        let selected = entry.selected.unwrap_or(option_index);
        Ok(AnswerFeedback {
            selected,
            correct_answer: entry.question.correct_answer(),
            is_correct: entry.question.is_correct(selected),
            newly_recorded,
            explanation: entry.question.explanation().to_owned(),
        })
    }

    /// Move to the next question, or complete the session after the last one.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` unless the session is in progress.
    /// - `SessionError::Unanswered` if the current question has no answer yet.
    pub fn advance(&mut self) -> Result<SessionStep, SessionError> {
        self.expect_state(SessionAction::Advance, SessionState::InProgress)?;
        let answered = self
            .entries
            .get(self.position)
            .is_some_and(SessionEntry::is_answered);
        if !answered {
            return Err(SessionError::Unanswered {
                position: self.position,
            });
        }

        if self.position + 1 < self.entries.len() {
            self.position += 1;
            return Ok(SessionStep::Next {
                position: self.position,
            });
        }

        self.state = SessionState::Completed;
        let score = self.final_score();
        debug!(
            correct = score.correct(),
            total = score.total(),
            "exam session completed"
        );
        Ok(SessionStep::Completed(score))
    }

    /// Final score of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` before the session completes.
    pub fn score(&self) -> Result<Score, SessionError> {
        self.expect_state(SessionAction::Score, SessionState::Completed)?;
        Ok(self.final_score())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Zero-based index of the current question.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of drawn questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    /// The entry being shown, while the session is in progress.
    #[must_use]
    pub fn current(&self) -> Option<&SessionEntry> {
        if self.state == SessionState::InProgress {
            self.entries.get(self.position)
        } else {
            None
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current().map(SessionEntry::question)
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.entries.iter().filter(|e| e.is_answered()).count();
        SessionProgress {
            position: self.position,
            total: self.entries.len(),
            answered,
            remaining: self.entries.len() - answered,
            is_complete: self.is_complete(),
        }
    }

    /// Whether the outcome has been merged into the study progress.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        self.recorded
    }

    pub(crate) fn mark_recorded(&mut self) {
        self.recorded = true;
    }

    fn final_score(&self) -> Score {
        let total = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        Score::new(self.correct, total)
    }

    fn expect_state(&self, action: SessionAction, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("state", &self.state)
            .field("entries_len", &self.entries.len())
            .field("position", &self.position)
            .field("correct", &self.correct)
            .field("recorded", &self.recorded)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use radix_core::model::{Category, Difficulty, QuestionDraft, Verdict};

    fn build_question(id: u32, correct_answer: usize) -> Question {
        QuestionDraft {
            id: format!("q{id}"),
            prompt: format!("Question {id}"),
            options: vec!["0".into(), "1".into(), "10".into(), "11".into()],
            correct_answer,
            explanation: format!("Explanation {id}"),
            difficulty: Difficulty::Beginner,
            category: Category::Conversion,
        }
        .validate()
        .unwrap()
    }

    fn build_session(len: u32) -> ExamSession {
        let questions = (1..=len).map(|id| build_question(id, 1)).collect();
        ExamSession::started(questions).unwrap()
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let err = ExamSession::started(Vec::new()).unwrap_err();
        assert!(matches!(err, SessionError::EmptyPool));
    }

    #[test]
    fn start_initializes_state() {
        let session = build_session(3);
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.position(), 0);
        assert_eq!(session.len(), 3);
        assert_eq!(session.correct_count(), 0);
        assert!(session.entries().iter().all(|e| !e.is_answered()));
        assert_eq!(session.current_question().unwrap().id(), "q1");
    }

    #[test]
    fn cannot_start_twice() {
        let mut session = build_session(1);
        let err = session.start(vec![build_question(9, 0)]).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                action: SessionAction::Start,
                state: SessionState::InProgress
            }
        ));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn resubmitting_is_a_no_op() {
        let mut session = build_session(2);
        let first = session.submit_answer(1).unwrap();
        assert!(first.is_correct);
        assert!(first.newly_recorded);
        assert_eq!(first.explanation, "Explanation 1");

        let second = session.submit_answer(3).unwrap();
        assert!(!second.newly_recorded);
        assert_eq!(second.selected, 1);
        assert!(second.is_correct);
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.entries()[0].selected(), Some(1));
    }

    #[test]
    fn wrong_answer_does_not_count() {
        let mut session = build_session(1);
        let feedback = session.submit_answer(0).unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.correct_answer, 1);
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut session = build_session(1);
        let err = session.submit_answer(4).unwrap_err();
        assert!(matches!(err, SessionError::OptionOutOfRange { index: 4 }));
        assert!(!session.entries()[0].is_answered());
    }

    #[test]
    fn resubmitting_with_any_index_is_a_no_op() {
        let mut session = build_session(1);
        session.submit_answer(1).unwrap();

        let again = session.submit_answer(9).unwrap();
        assert!(!again.newly_recorded);
        assert_eq!(again.selected, 1);
        assert!(again.is_correct);
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut session = build_session(2);
        let err = session.advance().unwrap_err();
        assert!(matches!(err, SessionError::Unanswered { position: 0 }));
        assert_eq!(session.position(), 0);
    }

    #[test]
    fn score_unavailable_until_completed() {
        let mut session = build_session(1);
        assert!(matches!(
            session.score(),
            Err(SessionError::InvalidTransition {
                action: SessionAction::Score,
                ..
            })
        ));
        session.submit_answer(1).unwrap();
        assert!(session.score().is_err());
    }

    #[test]
    fn not_started_session_rejects_actions() {
        let mut session = ExamSession::new();
        assert!(matches!(
            session.submit_answer(0),
            Err(SessionError::InvalidTransition {
                state: SessionState::NotStarted,
                ..
            })
        ));
        assert!(session.advance().is_err());
        assert!(session.current().is_none());
    }

    #[test]
    fn session_advances_and_completes() {
        let mut session = build_session(3);
        session.submit_answer(1).unwrap();
        assert_eq!(session.advance().unwrap(), SessionStep::Next { position: 1 });
        session.submit_answer(2).unwrap();
        assert_eq!(session.advance().unwrap(), SessionStep::Next { position: 2 });
        session.submit_answer(1).unwrap();

        let step = session.advance().unwrap();
        let score = session.score().unwrap();
        assert_eq!(step, SessionStep::Completed(score));
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!((score.correct(), score.total()), (2, 3));
        assert_eq!(score.percentage(), 67);
        assert!(score.correct() <= score.total());
    }

    #[test]
    fn completed_session_is_terminal() {
        let mut session = build_session(1);
        session.submit_answer(1).unwrap();
        session.advance().unwrap();

        assert!(matches!(
            session.submit_answer(1),
            Err(SessionError::InvalidTransition {
                state: SessionState::Completed,
                ..
            })
        ));
        assert!(session.advance().is_err());
        assert!(session.current_question().is_none());
        assert_eq!(session.score().unwrap().verdict(), Verdict::Perfect);
    }

    #[test]
    fn progress_tracks_answers() {
        let mut session = build_session(2);
        session.submit_answer(0).unwrap();
        let progress = session.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 1);
        assert!(!progress.is_complete);
    }
}
