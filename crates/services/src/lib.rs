#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod ledger;
pub mod practice;
pub mod sampler;
pub mod sessions;

pub use radix_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, LedgerError, PracticeError, SessionError};
pub use ledger::ProgressLedger;
pub use practice::{PracticeAnswer, PracticeService};
pub use sampler::DEFAULT_EXAM_SIZE;

pub use sessions::{
    AnswerFeedback, ExamAdvance, ExamLoopService, ExamSession, SessionAction, SessionEntry,
    SessionProgress, SessionState, SessionStep,
};
