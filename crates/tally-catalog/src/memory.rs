use std::sync::RwLock;

use tally_types::{PaymentAccount, PaymentMethod};

use crate::error::{CatalogError, CatalogResult};
use crate::traits::CatalogSource;

/// In-memory catalog snapshot for tests, demos, and embedding.
///
/// Inactive accounts are dropped on construction and on [`Self::replace`],
/// so the listings always satisfy the [`CatalogSource`] contract.
#[derive(Debug)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogState>,
}

#[derive(Debug, Default)]
struct CatalogState {
    methods: Vec<PaymentMethod>,
    accounts: Vec<PaymentAccount>,
    failure: Option<String>,
}

impl InMemoryCatalog {
    pub fn new(methods: Vec<PaymentMethod>, accounts: Vec<PaymentAccount>) -> Self {
        Self {
            inner: RwLock::new(CatalogState {
                methods,
                accounts: active_only(accounts),
                failure: None,
            }),
        }
    }

    /// A catalog whose every read fails with [`CatalogError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(CatalogState {
                failure: Some(reason.into()),
                ..Default::default()
            }),
        }
    }

    /// Swap in a new snapshot, e.g. after the back office deactivates an
    /// account mid-session.
    pub fn replace(
        &self,
        methods: Vec<PaymentMethod>,
        accounts: Vec<PaymentAccount>,
    ) -> CatalogResult<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| CatalogError::Unavailable("catalog write lock poisoned".into()))?;
        state.methods = methods;
        state.accounts = active_only(accounts);
        state.failure = None;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogState) -> T) -> CatalogResult<T> {
        let state = self
            .inner
            .read()
            .map_err(|_| CatalogError::Unavailable("catalog read lock poisoned".into()))?;
        if let Some(reason) = &state.failure {
            return Err(CatalogError::Unavailable(reason.clone()));
        }
        Ok(f(&state))
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl CatalogSource for InMemoryCatalog {
    fn list_methods(&self) -> CatalogResult<Vec<PaymentMethod>> {
        self.read(|state| state.methods.clone())
    }

    fn list_accounts(&self) -> CatalogResult<Vec<PaymentAccount>> {
        self.read(|state| state.accounts.clone())
    }
}

fn active_only(accounts: Vec<PaymentAccount>) -> Vec<PaymentAccount> {
    accounts.into_iter().filter(|a| a.is_active).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::{MethodId, MethodKind};

    fn sample() -> InMemoryCatalog {
        InMemoryCatalog::new(
            vec![
                PaymentMethod::new("cash", "Cash", MethodKind::Cash),
                PaymentMethod::new("visa", "Visa", MethodKind::Card),
            ],
            vec![
                PaymentAccount::new("till-1", "Till #1", MethodKind::Cash),
                PaymentAccount::new("old-pos", "Old POS", MethodKind::Card).deactivated(),
                PaymentAccount::new("pos-1", "POS Terminal", MethodKind::Card),
            ],
        )
    }

    #[test]
    fn lists_preserve_order_and_drop_inactive() {
        let catalog = sample();
        let methods = catalog.list_methods().unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].id, MethodId::from("cash"));

        let accounts = catalog.list_accounts().unwrap();
        let ids: Vec<_> = accounts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["till-1", "pos-1"]);
    }

    #[test]
    fn method_lookup_by_id() {
        let catalog = sample();
        let visa = catalog.method(&MethodId::from("visa")).unwrap().unwrap();
        assert_eq!(visa.name, "Visa");
        assert!(catalog.method(&MethodId::from("amex")).unwrap().is_none());
    }

    #[test]
    fn unavailable_catalog_reports_reason() {
        let catalog = InMemoryCatalog::unavailable("network down");
        let err = catalog.list_methods().unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(ref r) if r == "network down"));
        assert!(catalog.list_accounts().is_err());
    }

    #[test]
    fn replace_swaps_snapshot() {
        let catalog = InMemoryCatalog::unavailable("loading");
        catalog
            .replace(
                vec![PaymentMethod::new("cash", "Cash", MethodKind::Cash)],
                vec![PaymentAccount::new("till-2", "Till #2", MethodKind::Cash)],
            )
            .unwrap();
        assert_eq!(catalog.list_methods().unwrap().len(), 1);
        assert_eq!(catalog.list_accounts().unwrap()[0].id.as_str(), "till-2");
    }
}
