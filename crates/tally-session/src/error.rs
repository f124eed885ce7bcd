use tally_ledger::{ErrorClass, LedgerError};
use tally_types::Money;

use crate::config::CoveragePolicy;
use crate::session::SessionStatus;

/// Failures reported by a settlement sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The downstream system refused the settlement.
    #[error("settlement rejected: {0}")]
    Rejected(String),

    /// The downstream system could not be reached.
    #[error("settlement sink unavailable: {0}")]
    Unavailable(String),

    #[error("settlement serialization failed: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The operation is not allowed in the session's current status.
    #[error("cannot {operation} while the session is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },

    #[error("only a single payment is allowed for this settlement")]
    SinglePaymentOnly,

    #[error("add at least one payment before submitting")]
    NoEntries,

    #[error("remaining balance {remaining} does not satisfy the {policy} policy")]
    NotCovered {
        policy: CoveragePolicy,
        remaining: Money,
    },

    #[error("select a customer before submitting")]
    CustomerRequired,

    /// A custom submit check refused the settlement.
    #[error("submit check '{check}' failed: {reason}")]
    CheckFailed { check: String, reason: String },

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// A submit result arrived for an attempt that is no longer current.
    #[error("submit attempt {attempt} is stale (current attempt {current})")]
    StaleAttempt { attempt: u32, current: u32 },
}

impl SessionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Ledger(err) => err.class(),
            Self::SinglePaymentOnly
            | Self::NoEntries
            | Self::NotCovered { .. }
            | Self::CustomerRequired
            | Self::CheckFailed { .. } => ErrorClass::Validation,
            Self::Sink(_) => ErrorClass::Sink,
            Self::InvalidState { .. } | Self::StaleAttempt { .. } => ErrorClass::Contract,
        }
    }
}

/// Result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
