use serde::{Deserialize, Serialize};
use tally_types::{EntryId, MethodId, Money};

/// Which part of the error taxonomy a failure belongs to.
///
/// Callers map this to presentation: validation errors go inline next to
/// the field, resolution errors mark the method unusable, contract errors
/// indicate a bug in the driving code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    Resolution,
    Sink,
    Contract,
}

/// Errors produced by ledger operations.
///
/// Every failed mutation leaves the ledger exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("target amount must be positive, got {0}")]
    InvalidTarget(Money),

    #[error("{}", invalid_amount_message(.amount, .remaining))]
    InvalidAmount { amount: Money, remaining: Money },

    #[error("a transaction reference is required for {method}")]
    EmptyReference { method: MethodId },

    #[error("reference for {method} is malformed; expected {expected}")]
    MalformedReference { method: MethodId, expected: String },

    #[error("payment method {method} has already been added")]
    DuplicateMethod { method: MethodId },

    #[error("payment method {method} is not in the catalog")]
    UnknownMethod { method: MethodId },

    #[error("no compatible account for payment method {method}; choose a different method")]
    NoCompatibleAccount { method: MethodId },

    #[error("no payment methods are available")]
    CatalogEmpty,

    #[error("payment catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("payment entry {id} not found")]
    NotFound { id: EntryId },

    #[error("ledger is frozen; no further changes are allowed")]
    Frozen,
}

fn invalid_amount_message(amount: &Money, remaining: &Money) -> String {
    if amount.amount.is_positive() {
        format!("amount {amount} exceeds the remaining balance {remaining}")
    } else {
        format!("amount must be greater than zero, got {amount}")
    }
}

impl LedgerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidAmount { .. }
            | Self::EmptyReference { .. }
            | Self::MalformedReference { .. }
            | Self::DuplicateMethod { .. } => ErrorClass::Validation,
            Self::UnknownMethod { .. }
            | Self::NoCompatibleAccount { .. }
            | Self::CatalogEmpty
            | Self::CatalogUnavailable(_) => ErrorClass::Resolution,
            Self::InvalidTarget(_) | Self::NotFound { .. } | Self::Frozen => ErrorClass::Contract,
        }
    }
}

impl From<tally_catalog::CatalogError> for LedgerError {
    fn from(error: tally_catalog::CatalogError) -> Self {
        match error {
            tally_catalog::CatalogError::Empty => Self::CatalogEmpty,
            other => Self::CatalogUnavailable(other.to_string()),
        }
    }
}
