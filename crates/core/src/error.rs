//! Error types for the Actian ODBC layer.
//!
//! Every crate in the workspace reports failures through [`Error`]. No error
//! is retried automatically; callers decide whether a failure ends their
//! scenario.

use thiserror::Error;

/// All errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A session to the backend could not be established or was lost
    #[error("connection error: {0}")]
    Connection(String),

    /// A transaction or connection was used outside its valid state
    #[error("invalid state: {0}")]
    State(String),

    /// Lock or deadlock condition reported by the backend
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend rejected a statement (syntax, unknown table, constraint)
    #[error("execution error: {0}")]
    Execution(String),

    /// A single-row query produced no rows
    #[error("no rows in result set")]
    NoRows,

    /// A result value could not be scanned into the requested type
    #[error("wrong type: expected {expected}, got {actual}")]
    WrongType {
        /// Expected type
        expected: &'static str,
        /// Actual type found
        actual: &'static str,
    },

    /// Time-of-day fields out of range or a malformed wire image
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(String),

    /// A bug or a panicked worker, not a backend condition
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for all operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error aborts the whole run rather than one statement.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a state machine violation.
    pub fn is_state(&self) -> bool {
        matches!(self, Error::State(_))
    }

    /// Check if this is a backend-reported conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Check if this error may succeed when the caller retries.
    ///
    /// Only lock conflicts qualify. The library itself never retries.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}
