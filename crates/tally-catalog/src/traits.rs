use tally_types::{MethodId, PaymentAccount, PaymentMethod};

use crate::error::CatalogResult;

/// Read boundary for the payment method/account catalog.
///
/// All implementations must satisfy these invariants:
/// - Both listings return only active, usable records.
/// - Listing order is stable for an unchanged catalog; account resolution
///   depends on it.
/// - Load failures surface as errors, never as silently empty lists.
pub trait CatalogSource: Send + Sync {
    fn list_methods(&self) -> CatalogResult<Vec<PaymentMethod>>;

    fn list_accounts(&self) -> CatalogResult<Vec<PaymentAccount>>;

    /// Look a method up by ID.
    ///
    /// Default implementation scans [`Self::list_methods`].
    fn method(&self, id: &MethodId) -> CatalogResult<Option<PaymentMethod>> {
        Ok(self.list_methods()?.into_iter().find(|m| &m.id == id))
    }
}
