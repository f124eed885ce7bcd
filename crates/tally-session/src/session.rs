use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tally_catalog::{CatalogSource, CompatibilityResolver};
use tally_ledger::{LedgerError, QuickAmount, QuickFraction, SettlementLedger};
use tally_types::{Amount, EntryId, MethodId, PaymentAccount, PaymentEntry, PaymentMethod};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::checks::{CheckInput, CheckReport, SubmitChecks};
use crate::config::SessionConfig;
use crate::context::{SessionContext, SessionId};
use crate::draft::DraftEntry;
use crate::error::{SessionError, SessionResult, SinkError};
use crate::events::{EventStream, SessionEvent, SessionEventKind, SessionSnapshot};
use crate::sink::{settlement_digest, Settlement, SettlementSink};

/// Lifecycle of a settlement session.
///
/// `Collecting -> Submitting -> Submitted`, with `Submitting -> Collecting`
/// on a failed or abandoned attempt and `Collecting -> Cancelled` on cancel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Collecting,
    Submitting,
    Submitted,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted | Self::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Collecting => "collecting",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Proof that a submit attempt is in flight.
///
/// Hand the settlement to a sink, then report the sink's answer through
/// [`SettlementSession::complete_submit`]. An answer for a ticket that is no
/// longer current is refused.
#[derive(Debug)]
pub struct SubmitTicket {
    attempt: u32,
    settlement: Settlement,
}

impl SubmitTicket {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn settlement(&self) -> &Settlement {
        &self.settlement
    }

    pub fn into_settlement(self) -> Settlement {
        self.settlement
    }
}

/// One settlement of a fixed target amount across one or more payments.
///
/// Single writer. All operations except [`Self::submit`] are synchronous.
/// While a submit is in flight the session is `Submitting` and refuses
/// every mutation.
pub struct SettlementSession {
    id: SessionId,
    config: SessionConfig,
    context: SessionContext,
    catalog: Arc<dyn CatalogSource>,
    ledger: SettlementLedger,
    status: SessionStatus,
    attempt: u32,
    last_error: Option<String>,
    checks: SubmitChecks,
    events: broadcast::Sender<SessionEvent>,
}

impl SettlementSession {
    /// Open a session in `Collecting` for `target`.
    ///
    /// The catalog is not read here; an empty or failing catalog surfaces on
    /// the first add.
    pub fn start(
        target: Amount,
        context: SessionContext,
        config: SessionConfig,
        catalog: Arc<dyn CatalogSource>,
    ) -> SessionResult<Self> {
        let ledger = SettlementLedger::with_currency(target, config.currency.clone())?;
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let session = Self {
            id: SessionId::new(),
            config,
            context,
            catalog,
            ledger,
            status: SessionStatus::Collecting,
            attempt: 0,
            last_error: None,
            checks: SubmitChecks::with_default_checks(),
            events,
        };

        info!(
            session = %session.id,
            target = %session.config.currency.format(target),
            coverage = %session.config.coverage,
            "settlement session started"
        );
        Ok(session)
    }

    /// Replace the pre-submit pipeline.
    pub fn with_checks(mut self, checks: SubmitChecks) -> Self {
        self.checks = checks;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn ledger(&self) -> &SettlementLedger {
        &self.ledger
    }

    pub fn entries(&self) -> &[PaymentEntry] {
        self.ledger.entries()
    }

    pub fn total_paid(&self) -> Amount {
        self.ledger.total_paid()
    }

    pub fn remaining(&self) -> Amount {
        self.ledger.remaining()
    }

    pub fn progress_percent(&self) -> u8 {
        self.ledger.progress_percent()
    }

    pub fn quick_amount(&self, fraction: QuickFraction) -> Amount {
        self.ledger.quick_amount(fraction)
    }

    pub fn quick_amounts(&self) -> Vec<QuickAmount> {
        self.ledger.quick_amounts()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Methods that can take a payment right now, with the account each
    /// would resolve to.
    pub fn usable_methods(&self) -> SessionResult<Vec<(PaymentMethod, PaymentAccount)>> {
        CompatibilityResolver::usable_methods(self.catalog.as_ref())
            .map_err(|e| SessionError::Ledger(LedgerError::from(e)))
    }

    /// Add a payment entry. See [`SettlementLedger::add_entry`] for the
    /// checks applied.
    pub fn add_entry(
        &mut self,
        method_id: &MethodId,
        amount: Amount,
        reference: Option<&str>,
        notes: Option<&str>,
    ) -> SessionResult<PaymentEntry> {
        self.ensure_collecting("add an entry")?;
        if !self.config.allow_multiple_payments
            && !self.ledger.is_empty()
            && !self.ledger.contains_method(method_id)
        {
            return Err(SessionError::SinglePaymentOnly);
        }

        let entry = self
            .ledger
            .add_entry(self.catalog.as_ref(), method_id, amount, reference, notes)?;
        self.last_error = None;
        self.emit(SessionEventKind::EntryAdded {
            entry: entry.id.clone(),
        });
        Ok(entry)
    }

    /// Add a drafted entry, filling a missing amount with the remaining
    /// balance.
    pub fn add_draft(&mut self, draft: &DraftEntry) -> SessionResult<PaymentEntry> {
        let amount = draft.amount_or(self.ledger.remaining());
        self.add_entry(
            &draft.method_id,
            amount,
            draft.reference.as_deref(),
            draft.notes.as_deref(),
        )
    }

    pub fn remove_entry(&mut self, id: &EntryId) -> SessionResult<PaymentEntry> {
        self.ensure_collecting("remove an entry")?;
        let removed = self.ledger.remove_entry(id)?;
        self.last_error = None;
        self.emit(SessionEventKind::EntryRemoved {
            entry: removed.id.clone(),
        });
        Ok(removed)
    }

    /// Run the pre-submit checks without changing state.
    pub fn submit_readiness(&self) -> CheckReport {
        self.checks.evaluate(&CheckInput {
            ledger: &self.ledger,
            context: &self.context,
            config: &self.config,
        })
    }

    /// Enter `Submitting` and hand out the settlement to send.
    ///
    /// Fails without changing state if the session is not `Collecting` or a
    /// pre-submit check fails.
    pub fn begin_submit(&mut self) -> SessionResult<SubmitTicket> {
        self.ensure_collecting("submit")?;
        self.submit_readiness().into_result()?;

        let attempt = self.attempt + 1;
        let entries = self.ledger.entries().to_vec();
        let settlement = Settlement {
            session_id: self.id.clone(),
            attempt,
            target: self.ledger.target(),
            total_paid: self.ledger.total_paid(),
            currency: self.config.currency.clone(),
            digest: settlement_digest(self.ledger.target(), &entries)?,
            entries,
            context: self.context.clone(),
            submitted_at: Utc::now(),
        };

        self.attempt = attempt;
        self.status = SessionStatus::Submitting;
        info!(
            session = %self.id,
            attempt,
            entries = settlement.entries.len(),
            total_paid = %settlement.total_paid,
            digest = %settlement.digest,
            "settlement submit started"
        );
        self.emit(SessionEventKind::SubmitStarted { attempt });
        Ok(SubmitTicket {
            attempt,
            settlement,
        })
    }

    /// Record the sink's answer for `ticket`.
    ///
    /// Success moves to `Submitted` and freezes the ledger. Failure returns
    /// to `Collecting` with every entry intact and yields the sink error.
    pub fn complete_submit(
        &mut self,
        ticket: &SubmitTicket,
        result: Result<(), SinkError>,
    ) -> SessionResult<()> {
        if self.status != SessionStatus::Submitting || ticket.attempt != self.attempt {
            warn!(
                session = %self.id,
                attempt = ticket.attempt,
                current = self.attempt,
                status = %self.status,
                "ignoring stale submit result"
            );
            return Err(SessionError::StaleAttempt {
                attempt: ticket.attempt,
                current: self.attempt,
            });
        }

        match result {
            Ok(()) => {
                self.status = SessionStatus::Submitted;
                self.ledger.freeze();
                self.last_error = None;
                info!(session = %self.id, attempt = ticket.attempt, "settlement submitted");
                self.emit(SessionEventKind::Submitted {
                    attempt: ticket.attempt,
                    digest: ticket.settlement.digest.clone(),
                });
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                self.status = SessionStatus::Collecting;
                self.last_error = Some(reason.clone());
                warn!(
                    session = %self.id,
                    attempt = ticket.attempt,
                    error = %reason,
                    "settlement submit failed"
                );
                self.emit(SessionEventKind::SubmitFailed {
                    attempt: ticket.attempt,
                    reason,
                });
                Err(err.into())
            }
        }
    }

    /// Submit to `sink` and wait for its answer.
    ///
    /// The sink is called exactly once. Dropping this future before it
    /// resolves leaves the session `Submitting`; call
    /// [`Self::abort_submit`] to resume collecting.
    pub async fn submit(&mut self, sink: &dyn SettlementSink) -> SessionResult<Settlement> {
        let ticket = self.begin_submit()?;
        let result = sink.submit(ticket.settlement()).await;
        self.complete_submit(&ticket, result)?;
        Ok(ticket.into_settlement())
    }

    /// Give up on the in-flight attempt and return to `Collecting`.
    ///
    /// The abandoned ticket becomes stale, so a late sink answer is refused
    /// by [`Self::complete_submit`].
    pub fn abort_submit(&mut self) -> SessionResult<()> {
        if self.status != SessionStatus::Submitting {
            return Err(SessionError::InvalidState {
                operation: "abort a submit",
                status: self.status,
            });
        }
        self.status = SessionStatus::Collecting;
        self.last_error = Some(format!("submit attempt {} abandoned", self.attempt));
        warn!(session = %self.id, attempt = self.attempt, "settlement submit abandoned");
        self.emit(SessionEventKind::SubmitAborted {
            attempt: self.attempt,
        });
        Ok(())
    }

    /// Discard the session. Only allowed while `Collecting`.
    pub fn cancel(&mut self) -> SessionResult<()> {
        self.ensure_collecting("cancel")?;
        self.status = SessionStatus::Cancelled;
        self.ledger.freeze();
        info!(
            session = %self.id,
            discarded_entries = self.ledger.len(),
            "settlement session cancelled"
        );
        self.emit(SessionEventKind::Cancelled);
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let can_submit =
            self.status == SessionStatus::Collecting && self.submit_readiness().passed();
        SessionSnapshot {
            session_id: self.id.clone(),
            status: self.status,
            currency: self.config.currency.clone(),
            target: self.ledger.target(),
            total_paid: self.ledger.total_paid(),
            remaining: self.ledger.remaining(),
            progress_percent: self.ledger.progress_percent(),
            entries: self.ledger.entries().to_vec(),
            quick_amounts: self.ledger.quick_amounts(),
            can_submit,
            attempt: self.attempt,
            last_error: self.last_error.clone(),
        }
    }

    /// Receive a [`SessionEvent`] after every state change from now on.
    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    fn ensure_collecting(&self, operation: &'static str) -> SessionResult<()> {
        if self.status != SessionStatus::Collecting {
            return Err(SessionError::InvalidState {
                operation,
                status: self.status,
            });
        }
        Ok(())
    }

    fn emit(&self, kind: SessionEventKind) {
        if self.events.receiver_count() == 0 {
            return;
        }
        debug!(session = %self.id, event = ?kind, "session event");
        // A send only fails when every receiver has been dropped.
        let _ = self.events.send(SessionEvent {
            kind,
            snapshot: self.snapshot(),
        });
    }
}

impl fmt::Debug for SettlementSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettlementSession")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("attempt", &self.attempt)
            .field("ledger", &self.ledger)
            .finish()
    }
}
