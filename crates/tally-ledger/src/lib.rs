//! Settlement ledger for Tally.
//!
//! This crate owns the money rules of a settlement. It provides:
//! - `SettlementLedger`: ordered entries against a fixed target, with
//!   all-or-nothing mutations that never overpay
//! - `ReferenceValidator`: transaction reference checks and normalization
//! - Quick-amount shortcuts (25% / 50% / 75% / Full)
//! - `LedgerValidator`: an audit of every ledger invariant against the
//!   catalog's current state
//!
//! The ledger is synchronous and single-writer. Session lifecycle and
//! submission live in `tally-session`.

pub mod error;
pub mod ledger;
pub mod quick;
pub mod reference;
pub mod validation;

pub use error::{ErrorClass, LedgerError};
pub use ledger::SettlementLedger;
pub use quick::{QuickAmount, QuickFraction};
pub use reference::ReferenceValidator;
pub use validation::{LedgerReport, LedgerValidator, Violation, ViolationKind};
