use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("currency exponent {0} is out of range (0..=4)")]
    InvalidExponent(u8),

    #[error("invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("amount '{input}' has more than {max_digits} fractional digits")]
    ExcessPrecision { input: String, max_digits: u8 },

    #[error("invalid reference format: {0}")]
    InvalidReferenceFormat(String),
}
