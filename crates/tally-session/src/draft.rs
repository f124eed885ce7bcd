use serde::{Deserialize, Serialize};
use tally_types::{Amount, MethodId};

/// The payment the operator is currently composing, before it becomes an
/// entry.
///
/// An omitted amount means "whatever is still owed" and is filled from the
/// ledger's remaining balance when the draft is added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    pub method_id: MethodId,
    pub amount: Option<Amount>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl DraftEntry {
    pub fn new(method_id: impl Into<MethodId>) -> Self {
        Self {
            method_id: method_id.into(),
            amount: None,
            reference: None,
            notes: None,
        }
    }

    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// The amount to add given the current remaining balance.
    pub fn amount_or(&self, remaining: Amount) -> Amount {
        self.amount.unwrap_or(remaining)
    }
}
