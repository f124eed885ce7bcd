//! Settlement session lifecycle for Tally.
//!
//! A [`SettlementSession`] wraps one [`tally_ledger::SettlementLedger`] and
//! drives it through `Collecting -> Submitting -> Submitted`:
//!
//! - Entries are added and removed only while `Collecting`.
//! - `submit` runs a fail-fast pipeline of [`SubmitCheck`]s, then calls the
//!   [`SettlementSink`] exactly once.
//! - A sink failure returns the session to `Collecting` with every entry
//!   intact. There is no automatic retry.
//! - Every state change publishes a [`SessionSnapshot`] on a broadcast
//!   channel for the presentation layer.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tally_catalog::InMemoryCatalog;
//! use tally_session::{RecordingSink, SessionConfig, SessionContext, SettlementSession};
//! use tally_types::{Amount, MethodKind, PaymentAccount, PaymentMethod};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let catalog = Arc::new(InMemoryCatalog::new(
//!     vec![PaymentMethod::new("cash", "Cash", MethodKind::Cash)],
//!     vec![PaymentAccount::new("till-1", "Till #1", MethodKind::Cash)],
//! ));
//! let mut session = SettlementSession::start(
//!     Amount::from_minor(10_000),
//!     SessionContext::default(),
//!     SessionConfig::default(),
//!     catalog,
//! )
//! .unwrap();
//! session
//!     .add_entry(&"cash".into(), Amount::from_minor(10_000), None, None)
//!     .unwrap();
//! let settlement = session.submit(&RecordingSink::new()).await.unwrap();
//! assert_eq!(settlement.total_paid, Amount::from_minor(10_000));
//! # });
//! ```

pub mod checks;
pub mod config;
pub mod context;
pub mod draft;
pub mod error;
pub mod events;
pub mod session;
pub mod sink;
pub mod sinks;

pub use checks::{CheckInput, CheckReport, CheckResult, SubmitCheck, SubmitChecks};
pub use config::{CoveragePolicy, SessionConfig};
pub use context::{SessionContext, SessionId};
pub use draft::DraftEntry;
pub use error::{SessionError, SessionResult, SinkError};
pub use events::{EventStream, SessionEvent, SessionEventKind, SessionSnapshot};
pub use session::{SessionStatus, SettlementSession, SubmitTicket};
pub use sink::{settlement_digest, Settlement, SettlementSink};
pub use sinks::{JsonLinesSink, RecordingSink};
