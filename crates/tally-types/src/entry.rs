use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::method::{AccountId, MethodId};
use crate::money::Amount;

/// Unique identifier for a payment entry (UUID v7 for time-ordering).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(uuid::Uuid);

impl EntryId {
    /// Generate a new time-ordered entry ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.short_id())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// One committed line of a settlement.
///
/// Entries are never edited in place. Removing one deletes it outright;
/// the method and account names are copied in so the audit trail survives a
/// later catalog rename.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub id: EntryId,
    pub amount: Amount,
    pub method_id: MethodId,
    pub method_name: String,
    pub account_id: AccountId,
    pub account_name: String,
    /// Present iff the method requires a reference.
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}
