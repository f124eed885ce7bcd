//! Foundation types for Tally, the payment settlement engine.
//!
//! This crate provides the value types shared by every other Tally crate.
//! Nothing here performs I/O or holds mutable session state.
//!
//! # Key Types
//!
//! - [`Amount`]: Signed money value in integer minor units (never floating point)
//! - [`Currency`]: ISO code plus minor-unit exponent, used for parsing and display
//! - [`Money`]: An amount paired with its currency, for messages and display
//! - [`MethodKind`]: Canonical payment instrument type shared by methods and accounts
//! - [`PaymentMethod`] / [`PaymentAccount`]: Catalog records consumed by the engine
//! - [`ReferenceFormat`]: Shape of an external transaction reference
//! - [`PaymentEntry`]: One committed settlement line, identified by a UUID v7 [`EntryId`]

pub mod entry;
pub mod error;
pub mod method;
pub mod money;
pub mod reference;

pub use entry::{EntryId, PaymentEntry};
pub use error::TypeError;
pub use method::{AccountId, MethodId, MethodKind, PaymentAccount, PaymentMethod};
pub use money::{Amount, Currency, Money};
pub use reference::{ReferenceCharset, ReferenceFormat};
