use std::fmt;

use serde::{Deserialize, Serialize};
use tally_types::Amount;

/// Shortcut fractions of the target offered to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickFraction {
    Quarter,
    Half,
    ThreeQuarters,
    Full,
}

impl QuickFraction {
    pub const ALL: [QuickFraction; 4] = [
        QuickFraction::Quarter,
        QuickFraction::Half,
        QuickFraction::ThreeQuarters,
        QuickFraction::Full,
    ];

    fn quarters(self) -> u32 {
        match self {
            Self::Quarter => 1,
            Self::Half => 2,
            Self::ThreeQuarters => 3,
            Self::Full => 4,
        }
    }

    pub fn percent(self) -> u8 {
        (self.quarters() * 25) as u8
    }

    pub fn from_percent(percent: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.percent() == percent)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Quarter => "25%",
            Self::Half => "50%",
            Self::ThreeQuarters => "75%",
            Self::Full => "Full",
        }
    }

    /// `min(target * fraction, remaining)`, never negative.
    pub fn apply(self, target: Amount, remaining: Amount) -> Amount {
        let share = target.scale(self.quarters(), 4);
        share.min(remaining).max(Amount::ZERO)
    }
}

impl fmt::Display for QuickFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One quick-amount button: its fraction, label, and the amount it fills in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAmount {
    pub fraction: QuickFraction,
    pub label: String,
    pub amount: Amount,
}
