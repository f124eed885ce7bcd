use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_types::{Amount, Currency, PaymentEntry};

use crate::context::{SessionContext, SessionId};
use crate::error::SinkError;

/// The finalized payload handed to a [`SettlementSink`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub session_id: SessionId,
    pub attempt: u32,
    pub target: Amount,
    pub total_paid: Amount,
    pub currency: Currency,
    pub entries: Vec<PaymentEntry>,
    pub context: SessionContext,
    /// Hex BLAKE3 digest over the target and entries. Identical across
    /// retries of the same ledger.
    pub digest: String,
    pub submitted_at: DateTime<Utc>,
}

impl Settlement {
    /// Overpayment, when the entries exceed the target.
    pub fn change_due(&self) -> Amount {
        (self.total_paid - self.target).max(Amount::ZERO)
    }
}

/// Deterministic digest of a settlement's money content.
pub fn settlement_digest(target: Amount, entries: &[PaymentEntry]) -> Result<String, SinkError> {
    let encoded =
        serde_json::to_vec(&(target, entries)).map_err(|e| SinkError::Serialization(e.to_string()))?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"tally-settlement-v1:");
    hasher.update(&encoded);
    Ok(hex::encode(hasher.finalize().as_bytes()))
}

/// Downstream receiver of finalized settlements (the order or invoice
/// system).
///
/// Called exactly once per submit attempt. Implementations must not assume
/// they will be retried automatically.
#[async_trait]
pub trait SettlementSink: Send + Sync {
    async fn submit(&self, settlement: &Settlement) -> Result<(), SinkError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_settlement() -> Settlement {
        Settlement {
            session_id: SessionId::new(),
            attempt: 1,
            target: Amount::from_minor(10_000),
            total_paid: Amount::from_minor(10_000),
            currency: Currency::default(),
            entries: Vec::new(),
            context: SessionContext::default().with_customer("cus-042", None),
            digest: settlement_digest(Amount::from_minor(10_000), &[]).unwrap(),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn change_due_is_never_negative() {
        let mut settlement = sample_settlement();
        assert_eq!(settlement.change_due(), Amount::ZERO);
        settlement.total_paid = Amount::from_minor(12_000);
        assert_eq!(settlement.change_due(), Amount::from_minor(2_000));
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = settlement_digest(Amount::from_minor(100), &[]).unwrap();
        let b = settlement_digest(Amount::from_minor(100), &[]).unwrap();
        let c = settlement_digest(Amount::from_minor(101), &[]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
