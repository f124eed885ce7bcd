use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a settlement session (UUID v7 for time-ordering).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.short_id())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who and what a settlement is for. Passed through to the sink untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub description: Option<String>,
}

impl SessionContext {
    pub fn with_customer(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.customer_id = Some(id.into());
        self.customer_name = name;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether a non-blank customer id is present.
    pub fn has_customer(&self) -> bool {
        self.customer_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_eq!(SessionId::new().short_id().len(), 8);
    }

    #[test]
    fn blank_customer_does_not_count() {
        assert!(!SessionContext::default().has_customer());
        assert!(!SessionContext::default().with_customer("  ", None).has_customer());
        let context = SessionContext::default()
            .with_customer("cus-042", Some("Amina Juma".into()))
            .with_description("Invoice INV-1007");
        assert!(context.has_customer());
        assert_eq!(context.description.as_deref(), Some("Invoice INV-1007"));
    }
}
