use crate::checks::{CheckInput, SubmitCheck};
use crate::error::{SessionError, SessionResult};

/// A settlement needs at least one payment entry.
pub struct HasEntriesCheck;

impl SubmitCheck for HasEntriesCheck {
    fn name(&self) -> &str {
        "entries"
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> SessionResult<()> {
        if input.ledger.is_empty() {
            return Err(SessionError::NoEntries);
        }
        Ok(())
    }
}
