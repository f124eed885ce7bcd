use std::fmt;

use serde::{Deserialize, Serialize};
use tally_ledger::SettlementLedger;
use tally_types::Currency;

/// When a ledger counts as ready for submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// `remaining <= 0`.
    #[default]
    AtLeastCovered,
    /// `remaining == 0`.
    ExactlyCovered,
    /// Any non-empty ledger may be submitted.
    AllowPartial,
}

impl CoveragePolicy {
    pub fn is_met(self, ledger: &SettlementLedger) -> bool {
        match self {
            Self::AtLeastCovered => ledger.is_covered(),
            Self::ExactlyCovered => ledger.is_exactly_covered(),
            Self::AllowPartial => true,
        }
    }
}

impl fmt::Display for CoveragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AtLeastCovered => "at_least_covered",
            Self::ExactlyCovered => "exactly_covered",
            Self::AllowPartial => "allow_partial",
        })
    }
}

/// Configuration for a settlement session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Submission gating policy.
    pub coverage: CoveragePolicy,
    /// When `false`, a session holds at most one entry.
    pub allow_multiple_payments: bool,
    /// Refuse to submit without a customer id in the context.
    pub require_customer: bool,
    /// Currency all amounts are denominated in. Display only.
    pub currency: Currency,
    /// Buffer size of the snapshot event channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            coverage: CoveragePolicy::AtLeastCovered,
            allow_multiple_payments: true,
            require_customer: false,
            currency: Currency::default(),
            event_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Submit only when the target is met to the minor unit, and only for a
    /// known customer. Suited to invoice settlement.
    pub fn strict() -> Self {
        Self {
            coverage: CoveragePolicy::ExactlyCovered,
            require_customer: true,
            ..Default::default()
        }
    }

    /// Accept deposits and partial settlements.
    pub fn partial() -> Self {
        Self {
            coverage: CoveragePolicy::AllowPartial,
            ..Default::default()
        }
    }

    /// One payment method per settlement.
    pub fn single_payment() -> Self {
        Self {
            allow_multiple_payments: false,
            ..Default::default()
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::Amount;

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.coverage, CoveragePolicy::AtLeastCovered);
        assert!(config.allow_multiple_payments);
        assert!(!config.require_customer);
        assert_eq!(config.currency.code(), "TZS");
    }

    #[test]
    fn named_configs() {
        let strict = SessionConfig::strict();
        assert_eq!(strict.coverage, CoveragePolicy::ExactlyCovered);
        assert!(strict.require_customer);
        assert_eq!(SessionConfig::partial().coverage, CoveragePolicy::AllowPartial);
        assert!(!SessionConfig::single_payment().allow_multiple_payments);
        assert_eq!(
            SessionConfig::default()
                .with_currency(Currency::usd())
                .currency
                .code(),
            "USD"
        );
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"coverage": "exactly_covered"}"#).unwrap();
        assert_eq!(config.coverage, CoveragePolicy::ExactlyCovered);
        assert!(config.allow_multiple_payments);
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn coverage_policies() {
        let ledger = SettlementLedger::new(Amount::from_minor(100)).unwrap();
        assert!(!CoveragePolicy::AtLeastCovered.is_met(&ledger));
        assert!(!CoveragePolicy::ExactlyCovered.is_met(&ledger));
        assert!(CoveragePolicy::AllowPartial.is_met(&ledger));
        assert_eq!(CoveragePolicy::ExactlyCovered.to_string(), "exactly_covered");
    }
}
