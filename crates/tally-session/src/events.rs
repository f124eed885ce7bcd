use serde::{Deserialize, Serialize};
use tally_ledger::QuickAmount;
use tally_types::{Amount, Currency, EntryId, PaymentEntry};
use tokio::sync::broadcast;

use crate::context::SessionId;
use crate::session::SessionStatus;

/// Read-only view of a session for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub currency: Currency,
    pub target: Amount,
    pub total_paid: Amount,
    pub remaining: Amount,
    pub progress_percent: u8,
    pub entries: Vec<PaymentEntry>,
    pub quick_amounts: Vec<QuickAmount>,
    /// Whether `submit` would pass its checks right now.
    pub can_submit: bool,
    pub attempt: u32,
    /// Reason the last submit attempt failed, cleared on the next mutation.
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// `"TZS 7,500.00 of TZS 10,000.00 (75%)"`.
    pub fn summary(&self) -> String {
        format!(
            "{} of {} ({}%)",
            self.currency.format(self.total_paid),
            self.currency.format(self.target),
            self.progress_percent
        )
    }
}

/// What just happened to a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    EntryAdded { entry: EntryId },
    EntryRemoved { entry: EntryId },
    SubmitStarted { attempt: u32 },
    SubmitFailed { attempt: u32, reason: String },
    SubmitAborted { attempt: u32 },
    Submitted { attempt: u32, digest: String },
    Cancelled,
}

/// A state change plus the snapshot taken right after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub snapshot: SessionSnapshot,
}

/// A broadcast channel receiver for session events.
pub type EventStream = broadcast::Receiver<SessionEvent>;
