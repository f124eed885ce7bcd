use chrono::Utc;
use serde::{Deserialize, Serialize};
use tally_catalog::{CatalogSource, CompatibilityResolver};
use tally_types::{
    Amount, Currency, EntryId, MethodId, PaymentAccount, PaymentEntry, PaymentMethod,
};
use tracing::debug;

use crate::error::LedgerError;
use crate::quick::{QuickAmount, QuickFraction};
use crate::reference::ReferenceValidator;

/// Ordered list of payment entries settling one fixed target amount.
///
/// Every mutation either succeeds completely or leaves the ledger untouched.
/// After any successful mutation:
/// - `total_paid() <= target()`
/// - no two entries share an id or a method
/// - each entry carries a reference exactly when its method requires one
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementLedger {
    target: Amount,
    #[serde(default)]
    currency: Currency,
    entries: Vec<PaymentEntry>,
    #[serde(default)]
    frozen: bool,
}

impl SettlementLedger {
    /// A ledger for `target` in the default currency.
    pub fn new(target: Amount) -> Result<Self, LedgerError> {
        Self::with_currency(target, Currency::default())
    }

    pub fn with_currency(target: Amount, currency: Currency) -> Result<Self, LedgerError> {
        if !target.is_positive() {
            return Err(LedgerError::InvalidTarget(currency.money(target)));
        }
        Ok(Self {
            target,
            currency,
            entries: Vec::new(),
            frozen: false,
        })
    }

    /// Rebuild a ledger from previously recorded entries without
    /// re-checking them. Run [`crate::LedgerValidator`] over the result to
    /// audit what was restored.
    pub fn restore(
        target: Amount,
        currency: Currency,
        entries: Vec<PaymentEntry>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::with_currency(target, currency)?;
        let mut total = Amount::ZERO;
        for entry in &entries {
            total = total.checked_add(entry.amount).ok_or_else(|| {
                LedgerError::InvalidAmount {
                    amount: ledger.currency.money(entry.amount),
                    remaining: ledger.currency.money(target.saturating_sub(total)),
                }
            })?;
        }
        ledger.entries = entries;
        Ok(ledger)
    }

    pub fn target(&self) -> Amount {
        self.target
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn entries(&self) -> &[PaymentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: &EntryId) -> Option<&PaymentEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn contains_method(&self, method: &MethodId) -> bool {
        self.entries.iter().any(|e| &e.method_id == method)
    }

    /// Sum of entry amounts. Saturates instead of overflowing, which only
    /// a restored ledger can reach.
    pub fn total_paid(&self) -> Amount {
        self.entries
            .iter()
            .fold(Amount::ZERO, |total, e| total.saturating_add(e.amount))
    }

    /// `target - total_paid`, saturating. Negative only for a restored,
    /// overpaid ledger.
    pub fn remaining(&self) -> Amount {
        self.target.saturating_sub(self.total_paid())
    }

    /// Share of the target paid so far, rounded, capped at 100.
    pub fn progress_percent(&self) -> u8 {
        self.total_paid().percent_of(self.target)
    }

    pub fn is_covered(&self) -> bool {
        !self.remaining().is_positive()
    }

    pub fn is_exactly_covered(&self) -> bool {
        self.remaining().is_zero()
    }

    pub fn quick_amount(&self, fraction: QuickFraction) -> Amount {
        fraction.apply(self.target, self.remaining())
    }

    pub fn quick_amounts(&self) -> Vec<QuickAmount> {
        QuickFraction::ALL
            .into_iter()
            .map(|fraction| QuickAmount {
                fraction,
                label: fraction.label().to_string(),
                amount: self.quick_amount(fraction),
            })
            .collect()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Reject all further mutations. Irreversible.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Check an amount against the current remaining balance.
    pub fn check_amount(&self, amount: Amount) -> Result<(), LedgerError> {
        let remaining = self.remaining();
        if !amount.is_positive() || amount > remaining {
            return Err(LedgerError::InvalidAmount {
                amount: self.currency.money(amount),
                remaining: self.currency.money(remaining),
            });
        }
        Ok(())
    }

    /// Add a payment entry for `method_id`, resolving its receiving account
    /// from the catalog's current state.
    ///
    /// Checks run in order: duplicate method, amount, method lookup,
    /// account resolution, reference. The first failure is returned.
    pub fn add_entry<C: CatalogSource + ?Sized>(
        &mut self,
        catalog: &C,
        method_id: &MethodId,
        amount: Amount,
        reference: Option<&str>,
        notes: Option<&str>,
    ) -> Result<PaymentEntry, LedgerError> {
        self.ensure_mutable()?;
        if self.contains_method(method_id) {
            return Err(LedgerError::DuplicateMethod {
                method: method_id.clone(),
            });
        }
        self.check_amount(amount)?;

        let methods = catalog.list_methods()?;
        if methods.is_empty() {
            return Err(LedgerError::CatalogEmpty);
        }
        let method = methods
            .into_iter()
            .find(|m| &m.id == method_id)
            .ok_or_else(|| LedgerError::UnknownMethod {
                method: method_id.clone(),
            })?;
        let account = CompatibilityResolver::resolve(catalog, &method)?.ok_or_else(|| {
            LedgerError::NoCompatibleAccount {
                method: method_id.clone(),
            }
        })?;

        self.add_resolved(&method, &account, amount, reference, notes)
    }

    /// Add an entry for a method whose account has already been resolved.
    pub fn add_resolved(
        &mut self,
        method: &PaymentMethod,
        account: &PaymentAccount,
        amount: Amount,
        reference: Option<&str>,
        notes: Option<&str>,
    ) -> Result<PaymentEntry, LedgerError> {
        self.ensure_mutable()?;
        if self.contains_method(&method.id) {
            return Err(LedgerError::DuplicateMethod {
                method: method.id.clone(),
            });
        }
        self.check_amount(amount)?;
        if !method.kind.accepts(account.kind) || !account.is_active {
            return Err(LedgerError::NoCompatibleAccount {
                method: method.id.clone(),
            });
        }
        let reference = ReferenceValidator::reference_for_entry(method, reference)?;

        let entry = PaymentEntry {
            id: EntryId::new(),
            amount,
            method_id: method.id.clone(),
            method_name: method.name.clone(),
            account_id: account.id.clone(),
            account_name: account.name.clone(),
            reference,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            timestamp: Utc::now(),
        };
        self.entries.push(entry.clone());

        debug!(
            entry = %entry.id,
            method = %entry.method_id,
            account = %entry.account_id,
            amount = %amount,
            remaining = %self.remaining(),
            "payment entry added"
        );
        Ok(entry)
    }

    /// Remove an entry outright. `remaining` rises by its amount; other
    /// entries are untouched.
    pub fn remove_entry(&mut self, id: &EntryId) -> Result<PaymentEntry, LedgerError> {
        self.ensure_mutable()?;
        let index = self
            .entries
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| LedgerError::NotFound { id: id.clone() })?;
        let removed = self.entries.remove(index);

        debug!(
            entry = %removed.id,
            method = %removed.method_id,
            amount = %removed.amount,
            remaining = %self.remaining(),
            "payment entry removed"
        );
        Ok(removed)
    }

    fn ensure_mutable(&self) -> Result<(), LedgerError> {
        if self.frozen {
            return Err(LedgerError::Frozen);
        }
        Ok(())
    }
}
