use crate::checks::{CheckInput, SubmitCheck};
use crate::error::{SessionError, SessionResult};

/// The ledger must satisfy the configured [`crate::CoveragePolicy`].
pub struct CoverageCheck;

impl SubmitCheck for CoverageCheck {
    fn name(&self) -> &str {
        "coverage"
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> SessionResult<()> {
        let policy = input.config.coverage;
        if !policy.is_met(input.ledger) {
            return Err(SessionError::NotCovered {
                policy,
                remaining: input.ledger.currency().money(input.ledger.remaining()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoveragePolicy, SessionConfig};
    use crate::context::SessionContext;
    use tally_ledger::SettlementLedger;
    use tally_types::{Amount, MethodKind, PaymentAccount, PaymentMethod};

    fn ledger_paying(paid: i64) -> SettlementLedger {
        let mut ledger = SettlementLedger::new(Amount::from_minor(10_000)).unwrap();
        ledger
            .add_resolved(
                &PaymentMethod::new("cash", "Cash", MethodKind::Cash),
                &PaymentAccount::new("till-1", "Till #1", MethodKind::Cash),
                Amount::from_minor(paid),
                None,
                None,
            )
            .unwrap();
        ledger
    }

    fn check(ledger: &SettlementLedger, coverage: CoveragePolicy) -> SessionResult<()> {
        let config = SessionConfig {
            coverage,
            ..Default::default()
        };
        let context = SessionContext::default();
        CoverageCheck.evaluate(&CheckInput {
            ledger,
            context: &context,
            config: &config,
        })
    }

    #[test]
    fn partial_ledger_fails_default_policy() {
        let err = check(&ledger_paying(7_500), CoveragePolicy::AtLeastCovered).unwrap_err();
        match err {
            SessionError::NotCovered { remaining, .. } => {
                assert_eq!(remaining.amount, Amount::from_minor(2_500))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn partial_ledger_passes_allow_partial() {
        assert!(check(&ledger_paying(100), CoveragePolicy::AllowPartial).is_ok());
    }

    #[test]
    fn exact_coverage() {
        assert!(check(&ledger_paying(10_000), CoveragePolicy::ExactlyCovered).is_ok());
        assert!(check(&ledger_paying(9_999), CoveragePolicy::ExactlyCovered).is_err());
    }
}
