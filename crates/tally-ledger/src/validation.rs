use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tally_catalog::CatalogSource;
use tally_types::{Amount, EntryId};

use crate::error::LedgerError;
use crate::ledger::SettlementLedger;
use crate::reference::ReferenceValidator;

/// Result of a ledger audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub entry_count: usize,
    pub target: Amount,
    pub total_paid: Amount,
    pub within_target: bool,
    pub ids_unique: bool,
    pub methods_unique: bool,
    pub references_valid: bool,
    pub accounts_compatible: bool,
    pub violations: Vec<Violation>,
}

impl LedgerReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific invariant violation found during an audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The offending entry; `None` for ledger-wide violations.
    pub entry: Option<EntryId>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Overpaid,
    NonPositiveAmount,
    DuplicateEntryId,
    DuplicateMethod,
    MissingReference,
    MalformedReference,
    UnexpectedReference,
    UnknownMethod,
    UnknownAccount,
    IncompatibleAccount,
}

/// Re-checks every ledger invariant against the catalog's current state.
///
/// Useful after [`SettlementLedger::restore`], or to audit a ledger whose
/// catalog changed since the entries were added. Reports; never mutates.
pub struct LedgerValidator;

impl LedgerValidator {
    pub fn validate<C: CatalogSource + ?Sized>(
        ledger: &SettlementLedger,
        catalog: &C,
    ) -> Result<LedgerReport, LedgerError> {
        let methods = catalog.list_methods()?;
        let accounts = catalog.list_accounts()?;

        let mut violations = Vec::new();
        let mut ids_unique = true;
        let mut methods_unique = true;
        let mut references_valid = true;
        let mut accounts_compatible = true;
        let mut seen_ids = HashSet::new();
        let mut seen_methods = HashSet::new();

        for entry in ledger.entries() {
            let mut flag = |kind: ViolationKind, description: String| {
                violations.push(Violation {
                    entry: Some(entry.id.clone()),
                    kind,
                    description,
                });
            };

            if !entry.amount.is_positive() {
                flag(
                    ViolationKind::NonPositiveAmount,
                    format!(
                        "amount {} is not positive",
                        ledger.currency().format(entry.amount)
                    ),
                );
            }
            if !seen_ids.insert(&entry.id) {
                ids_unique = false;
                flag(ViolationKind::DuplicateEntryId, "entry id appears twice".into());
            }
            if !seen_methods.insert(&entry.method_id) {
                methods_unique = false;
                flag(
                    ViolationKind::DuplicateMethod,
                    format!("method {} has more than one entry", entry.method_id),
                );
            }

            let Some(method) = methods.iter().find(|m| m.id == entry.method_id) else {
                accounts_compatible = false;
                flag(
                    ViolationKind::UnknownMethod,
                    format!("method {} is no longer in the catalog", entry.method_id),
                );
                continue;
            };

            match (&entry.reference, method.requires_reference) {
                (None, true) => {
                    references_valid = false;
                    flag(
                        ViolationKind::MissingReference,
                        format!("method {} requires a reference", method.id),
                    );
                }
                (Some(reference), true) => {
                    if let Err(err) = ReferenceValidator::validate_reference(method, reference) {
                        references_valid = false;
                        flag(ViolationKind::MalformedReference, err.to_string());
                    }
                }
                (Some(_), false) => {
                    references_valid = false;
                    flag(
                        ViolationKind::UnexpectedReference,
                        format!("method {} does not take a reference", method.id),
                    );
                }
                (None, false) => {}
            }

            match accounts.iter().find(|a| a.id == entry.account_id) {
                None => {
                    accounts_compatible = false;
                    flag(
                        ViolationKind::UnknownAccount,
                        format!("account {} is not active in the catalog", entry.account_id),
                    );
                }
                Some(account) if !method.kind.accepts(account.kind) => {
                    accounts_compatible = false;
                    flag(
                        ViolationKind::IncompatibleAccount,
                        format!(
                            "{} account {} cannot receive {} payments",
                            account.kind, account.id, method.kind
                        ),
                    );
                }
                Some(_) => {}
            }
        }

        let total_paid = ledger.total_paid();
        let within_target = total_paid <= ledger.target();
        if !within_target {
            violations.push(Violation {
                entry: None,
                kind: ViolationKind::Overpaid,
                description: format!(
                    "total paid {} exceeds target {}",
                    ledger.currency().format(total_paid),
                    ledger.currency().format(ledger.target())
                ),
            });
        }

        Ok(LedgerReport {
            entry_count: ledger.len(),
            target: ledger.target(),
            total_paid,
            within_target,
            ids_unique,
            methods_unique,
            references_valid,
            accounts_compatible,
            violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tally_catalog::InMemoryCatalog;
    use tally_types::{Currency, PaymentEntry};

    use super::*;
    use crate::ledger::tests::catalog;

    fn entry(method: &str, account: &str, minor: i64, reference: Option<&str>) -> PaymentEntry {
        PaymentEntry {
            id: EntryId::new(),
            amount: Amount::from_minor(minor),
            method_id: method.into(),
            method_name: method.to_string(),
            account_id: account.into(),
            account_name: account.to_string(),
            reference: reference.map(str::to_string),
            notes: None,
            timestamp: Utc::now(),
        }
    }

    fn kinds(report: &LedgerReport) -> Vec<ViolationKind> {
        report.violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn ledger_built_through_add_is_valid() {
        let catalog = catalog();
        let mut ledger = SettlementLedger::new(Amount::from_minor(10_000)).unwrap();
        ledger
            .add_entry(&catalog, &"cash".into(), Amount::from_minor(4_000), None, None)
            .unwrap();
        ledger
            .add_entry(
                &catalog,
                &"mpesa".into(),
                Amount::from_minor(6_000),
                Some("QHX4K2L9PZ"),
                None,
            )
            .unwrap();

        let report = LedgerValidator::validate(&ledger, &catalog).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.entry_count, 2);
        assert_eq!(report.total_paid, Amount::from_minor(10_000));
    }

    #[test]
    fn restored_overpayment_is_reported() {
        let ledger = SettlementLedger::restore(
            Amount::from_minor(1_000),
            Currency::tzs(),
            vec![
                entry("cash", "till-1", 800, None),
                entry("visa", "pos-1", 800, None),
            ],
        )
        .unwrap();
        let report = LedgerValidator::validate(&ledger, &catalog()).unwrap();
        assert!(!report.within_target);
        assert_eq!(kinds(&report), [ViolationKind::Overpaid]);
        assert!(report.violations[0].entry.is_none());
        assert_eq!(
            report.violations[0].description,
            "total paid TZS 16.00 exceeds target TZS 10.00"
        );
    }

    #[test]
    fn negative_entry_at_extreme_target_is_reported() {
        let ledger = SettlementLedger::restore(
            Amount::from_minor(i64::MAX),
            Currency::tzs(),
            vec![entry("cash", "till-1", -1, None)],
        )
        .unwrap();
        let report = LedgerValidator::validate(&ledger, &catalog()).unwrap();
        assert_eq!(kinds(&report), [ViolationKind::NonPositiveAmount]);
        assert_eq!(report.violations[0].description, "amount TZS -0.01 is not positive");
    }

    #[test]
    fn duplicates_and_references_are_reported() {
        let duplicate = entry("cash", "till-1", 100, None);
        let ledger = SettlementLedger::restore(
            Amount::from_minor(10_000),
            Currency::tzs(),
            vec![
                duplicate.clone(),
                duplicate,
                entry("mpesa", "mpesa-till", 100, None),
                entry("visa", "pos-1", 100, Some("R-1")),
            ],
        )
        .unwrap();
        let report = LedgerValidator::validate(&ledger, &catalog()).unwrap();
        assert!(!report.ids_unique);
        assert!(!report.methods_unique);
        assert!(!report.references_valid);
        assert_eq!(
            kinds(&report),
            [
                ViolationKind::DuplicateEntryId,
                ViolationKind::DuplicateMethod,
                ViolationKind::MissingReference,
                ViolationKind::UnexpectedReference,
            ]
        );
    }

    #[test]
    fn incompatible_and_unknown_accounts_are_reported() {
        let ledger = SettlementLedger::restore(
            Amount::from_minor(10_000),
            Currency::tzs(),
            vec![
                entry("cash", "pos-1", 100, None),
                entry("visa", "gone", 100, None),
                entry("amex", "pos-1", 100, None),
            ],
        )
        .unwrap();
        let report = LedgerValidator::validate(&ledger, &catalog()).unwrap();
        assert!(!report.accounts_compatible);
        assert_eq!(
            kinds(&report),
            [
                ViolationKind::IncompatibleAccount,
                ViolationKind::UnknownAccount,
                ViolationKind::UnknownMethod,
            ]
        );
    }

    #[test]
    fn malformed_reference_is_reported() {
        let ledger = SettlementLedger::restore(
            Amount::from_minor(10_000),
            Currency::tzs(),
            vec![entry("mpesa", "mpesa-till", 100, Some("short"))],
        )
        .unwrap();
        let report = LedgerValidator::validate(&ledger, &catalog()).unwrap();
        assert_eq!(kinds(&report), [ViolationKind::MalformedReference]);
    }

    #[test]
    fn unavailable_catalog_is_an_error() {
        let ledger = SettlementLedger::new(Amount::from_minor(100)).unwrap();
        let catalog = InMemoryCatalog::unavailable("offline");
        assert!(matches!(
            LedgerValidator::validate(&ledger, &catalog),
            Err(LedgerError::CatalogUnavailable(_))
        ));
    }
}
