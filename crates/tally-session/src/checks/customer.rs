use crate::checks::{CheckInput, SubmitCheck};
use crate::error::{SessionError, SessionResult};

/// When the config demands it, the context must name a customer.
pub struct CustomerCheck;

impl SubmitCheck for CustomerCheck {
    fn name(&self) -> &str {
        "customer"
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> SessionResult<()> {
        if input.config.require_customer && !input.context.has_customer() {
            return Err(SessionError::CustomerRequired);
        }
        Ok(())
    }
}
