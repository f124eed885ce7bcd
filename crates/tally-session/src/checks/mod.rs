//! Pre-submit checks.
//!
//! Before a session enters `Submitting` it runs a fail-fast pipeline of
//! [`SubmitCheck`] stages. The default pipeline is
//! entries -> coverage -> customer.

pub mod coverage;
pub mod customer;
pub mod entries;

pub use coverage::CoverageCheck;
pub use customer::CustomerCheck;
pub use entries::HasEntriesCheck;

use tally_ledger::SettlementLedger;

use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::error::{SessionError, SessionResult};

/// Everything a check may look at.
pub struct CheckInput<'a> {
    pub ledger: &'a SettlementLedger,
    pub context: &'a SessionContext,
    pub config: &'a SessionConfig,
}

/// A single stage in the pre-submit pipeline.
///
/// Object-safe and `Send + Sync` so checks can be stored as
/// `Box<dyn SubmitCheck>`.
pub trait SubmitCheck: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(())` to pass; the error otherwise becomes the submit failure.
    fn evaluate(&self, input: &CheckInput<'_>) -> SessionResult<()>;
}

/// Recorded outcome of one check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub check: String,
    pub passed: bool,
    pub reason: Option<String>,
}

/// Outcome of running the whole pipeline.
#[derive(Debug)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
    failure: Option<SessionError>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&SessionError> {
        self.failure.as_ref()
    }

    pub fn into_result(self) -> SessionResult<()> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Ordered, fail-fast list of submit checks.
pub struct SubmitChecks {
    checks: Vec<Box<dyn SubmitCheck>>,
}

impl SubmitChecks {
    /// An empty pipeline; every ledger passes.
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Entries -> Coverage -> Customer.
    pub fn with_default_checks() -> Self {
        let mut checks = Self::new();
        checks.add_check(Box::new(HasEntriesCheck));
        checks.add_check(Box::new(CoverageCheck));
        checks.add_check(Box::new(CustomerCheck));
        checks
    }

    pub fn add_check(&mut self, check: Box<dyn SubmitCheck>) {
        self.checks.push(check);
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Run checks in order, stopping at the first failure.
    pub fn evaluate(&self, input: &CheckInput<'_>) -> CheckReport {
        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            match check.evaluate(input) {
                Ok(()) => results.push(CheckResult {
                    check: check.name().to_string(),
                    passed: true,
                    reason: None,
                }),
                Err(err) => {
                    results.push(CheckResult {
                        check: check.name().to_string(),
                        passed: false,
                        reason: Some(err.to_string()),
                    });
                    return CheckReport {
                        results,
                        failure: Some(err),
                    };
                }
            }
        }
        CheckReport {
            results,
            failure: None,
        }
    }
}

impl Default for SubmitChecks {
    fn default() -> Self {
        Self::with_default_checks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::{Amount, MethodKind, PaymentAccount, PaymentMethod};

    fn covered_ledger() -> SettlementLedger {
        let mut ledger = SettlementLedger::new(Amount::from_minor(10_000)).unwrap();
        ledger
            .add_resolved(
                &PaymentMethod::new("cash", "Cash", MethodKind::Cash),
                &PaymentAccount::new("till-1", "Till #1", MethodKind::Cash),
                Amount::from_minor(10_000),
                None,
                None,
            )
            .unwrap();
        ledger
    }

    fn run(checks: &SubmitChecks, ledger: &SettlementLedger, config: &SessionConfig) -> CheckReport {
        let context = SessionContext::default();
        checks.evaluate(&CheckInput {
            ledger,
            context: &context,
            config,
        })
    }

    #[test]
    fn default_pipeline_passes_covered_ledger() {
        let report = run(
            &SubmitChecks::with_default_checks(),
            &covered_ledger(),
            &SessionConfig::default(),
        );
        assert!(report.passed());
        assert_eq!(report.results.len(), 3);
        assert!(report.results.iter().all(|r| r.passed));
    }

    #[test]
    fn pipeline_is_fail_fast() {
        let empty = SettlementLedger::new(Amount::from_minor(10_000)).unwrap();
        let report = run(
            &SubmitChecks::with_default_checks(),
            &empty,
            &SessionConfig::strict(),
        );
        assert!(!report.passed());
        // Coverage and customer would also fail but never ran.
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].check, "entries");
        assert!(matches!(report.into_result(), Err(SessionError::NoEntries)));
    }

    #[test]
    fn custom_check_integration() {
        struct BusinessHours;
        impl SubmitCheck for BusinessHours {
            fn name(&self) -> &str {
                "business-hours"
            }
            fn evaluate(&self, _input: &CheckInput<'_>) -> SessionResult<()> {
                Err(SessionError::CheckFailed {
                    check: "business-hours".into(),
                    reason: "till is closed".into(),
                })
            }
        }

        let mut checks = SubmitChecks::with_default_checks();
        checks.add_check(Box::new(BusinessHours));
        assert_eq!(checks.check_count(), 4);

        let report = run(&checks, &covered_ledger(), &SessionConfig::default());
        assert_eq!(report.results.len(), 4);
        assert_eq!(
            report.results[3].reason.as_deref(),
            Some("submit check 'business-hours' failed: till is closed")
        );
    }

    #[test]
    fn empty_pipeline_passes() {
        let empty = SettlementLedger::new(Amount::from_minor(1)).unwrap();
        let report = run(&SubmitChecks::new(), &empty, &SessionConfig::default());
        assert!(report.passed());
        assert!(report.results.is_empty());
    }
}
