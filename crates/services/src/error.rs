//! Shared error types for the services crate.

use thiserror::Error;

use radix_core::model::QuestionError;
use radix_core::radix::{Base, RadixError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::{SessionAction, SessionState};

/// Errors emitted by the progress ledger.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("progress write failed after {attempts} attempt(s): {source}")]
    WriteFailure {
        attempts: u32,
        #[source]
        source: StorageError,
    },
}

/// Errors emitted by exam sessions and the sampler.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    EmptyPool,
    #[error("cannot {action} while the session is {state}")]
    InvalidTransition {
        action: SessionAction,
        state: SessionState,
    },
    #[error("cannot advance before question {position} is answered")]
    Unanswered { position: usize },
    #[error("option {index} does not exist")]
    OptionOutOfRange { index: usize },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Errors emitted by `PracticeService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("enter a value to convert")]
    EmptyInput,
    #[error("{input:?} is not a valid {base} number")]
    InvalidInput { input: String, base: Base },
    #[error(transparent)]
    Conversion(#[from] RadixError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Question(#[from] QuestionError),
}
