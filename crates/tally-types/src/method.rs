use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reference::ReferenceFormat;

/// Canonical payment instrument type.
///
/// Methods and accounts share this one vocabulary. Legacy spellings such as
/// `credit_card` or `bank` are translated into it where catalog data enters
/// the engine, so the engine itself only ever compares canonical kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Cash,
    Card,
    MobileMoney,
    BankTransfer,
    Other,
}

impl MethodKind {
    pub const ALL: [MethodKind; 5] = [
        Self::Cash,
        Self::Card,
        Self::MobileMoney,
        Self::BankTransfer,
        Self::Other,
    ];

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::MobileMoney => "mobile_money",
            Self::BankTransfer => "bank_transfer",
            Self::Other => "other",
        }
    }

    /// Whether funds of kind `self` may be deposited into an account of kind
    /// `account`.
    pub fn accepts(&self, account: MethodKind) -> bool {
        *self == account
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Catalog identifier of a [`PaymentMethod`].
    MethodId
);

string_id!(
    /// Catalog identifier of a [`PaymentAccount`].
    AccountId
);

/// A logical payment instrument ("Cash", "M-Pesa", "Visa").
///
/// Owned by the external catalog and immutable for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: MethodId,
    pub name: String,
    pub kind: MethodKind,
    /// Whether an entry for this method must carry a transaction reference.
    pub requires_reference: bool,
    /// Shape the reference must match, if the method defines one.
    pub reference_format: Option<ReferenceFormat>,
}

impl PaymentMethod {
    /// A method that needs no reference.
    pub fn new(id: impl Into<MethodId>, name: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            requires_reference: false,
            reference_format: None,
        }
    }

    /// Require a reference, optionally constrained to `format`.
    pub fn with_required_reference(mut self, format: Option<ReferenceFormat>) -> Self {
        self.requires_reference = true;
        self.reference_format = format;
        self
    }
}

/// A concrete ledger that receives funds of one [`MethodKind`] ("Till #1").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAccount {
    pub id: AccountId,
    pub name: String,
    pub kind: MethodKind,
    pub is_active: bool,
}

impl PaymentAccount {
    /// An active account.
    pub fn new(id: impl Into<AccountId>, name: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            is_active: true,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}
