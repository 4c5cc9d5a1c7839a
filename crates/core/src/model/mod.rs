mod progress;
mod question;
mod score;

pub use progress::{ProgressDelta, ProgressError, StudyProgress};
pub use question::{
    Category, Difficulty, DifficultyFilter, OPTION_COUNT, Question, QuestionDraft, QuestionError,
};
pub use score::{Score, Verdict};
