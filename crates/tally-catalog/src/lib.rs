//! Method/account catalog for Tally.
//!
//! The catalog is owned by the surrounding application; the settlement
//! engine only reads it. This crate provides:
//!
//! - [`CatalogSource`]: the read boundary the engine consumes
//! - [`InMemoryCatalog`]: a lock-guarded snapshot for tests and embedding
//! - [`CatalogRecords`]: raw TOML/JSON records, translated into canonical
//!   [`MethodKind`](tally_types::MethodKind)s at load time
//! - [`CompatibilityResolver`]: picks the account that receives a method's funds
//!
//! # Design Rules
//!
//! 1. The engine never mutates the catalog.
//! 2. Vocabulary translation happens once, at the boundary.
//! 3. Resolution is deterministic: first compatible account in catalog order.

pub mod error;
pub mod memory;
pub mod records;
pub mod resolver;
pub mod traits;

pub use error::{CatalogError, CatalogResult};
pub use memory::InMemoryCatalog;
pub use records::{canonical_kind, AccountRecord, CatalogRecords, MethodRecord};
pub use resolver::CompatibilityResolver;
pub use traits::CatalogSource;
