use tally_types::{PaymentAccount, PaymentMethod};

use crate::error::{CatalogError, CatalogResult};
use crate::traits::CatalogSource;

/// Picks the account that receives funds for a payment method.
///
/// Rule: the first active account, in catalog order, whose kind the method
/// accepts. Given an unchanged catalog the answer never changes. Callers
/// re-resolve on every new entry rather than caching for a whole session,
/// so an account deactivated mid-session stops receiving new entries.
pub struct CompatibilityResolver;

impl CompatibilityResolver {
    /// Resolve against an already-fetched account list.
    pub fn resolve_in<'a>(
        method: &PaymentMethod,
        accounts: &'a [PaymentAccount],
    ) -> Option<&'a PaymentAccount> {
        accounts
            .iter()
            .find(|account| account.is_active && method.kind.accepts(account.kind))
    }

    /// Resolve against the catalog's current account listing.
    pub fn resolve<C: CatalogSource + ?Sized>(
        catalog: &C,
        method: &PaymentMethod,
    ) -> CatalogResult<Option<PaymentAccount>> {
        let accounts = catalog.list_accounts()?;
        Ok(Self::resolve_in(method, &accounts).cloned())
    }

    /// Every method that currently resolves to an account, paired with it.
    ///
    /// This is the set a caller should offer for selection. Fails with
    /// [`CatalogError::Empty`] when no method is usable.
    pub fn usable_methods<C: CatalogSource + ?Sized>(
        catalog: &C,
    ) -> CatalogResult<Vec<(PaymentMethod, PaymentAccount)>> {
        let accounts = catalog.list_accounts()?;
        let usable: Vec<_> = catalog
            .list_methods()?
            .into_iter()
            .filter_map(|method| {
                let account = Self::resolve_in(&method, &accounts)?.clone();
                Some((method, account))
            })
            .collect();

        if usable.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(usable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalog;
    use tally_types::MethodKind;

    fn accounts() -> Vec<PaymentAccount> {
        vec![
            PaymentAccount::new("till-1", "Till #1", MethodKind::Cash),
            PaymentAccount::new("pos-1", "POS Terminal 1", MethodKind::Card),
            PaymentAccount::new("till-2", "Till #2", MethodKind::Cash),
            PaymentAccount::new("mpesa-till", "M-Pesa Till", MethodKind::MobileMoney),
        ]
    }

    #[test]
    fn first_compatible_account_wins() {
        let cash = PaymentMethod::new("cash", "Cash", MethodKind::Cash);
        let accounts = accounts();
        let account = CompatibilityResolver::resolve_in(&cash, &accounts).unwrap();
        assert_eq!(account.id.as_str(), "till-1");
    }

    #[test]
    fn resolution_is_deterministic() {
        let card = PaymentMethod::new("visa", "Visa", MethodKind::Card);
        let catalog = InMemoryCatalog::new(vec![card.clone()], accounts());
        let first = CompatibilityResolver::resolve(&catalog, &card).unwrap();
        for _ in 0..10 {
            assert_eq!(CompatibilityResolver::resolve(&catalog, &card).unwrap(), first);
        }
    }

    #[test]
    fn no_compatible_account() {
        let bank = PaymentMethod::new("bank", "Bank Transfer", MethodKind::BankTransfer);
        let accounts = accounts();
        assert!(CompatibilityResolver::resolve_in(&bank, &accounts).is_none());
    }

    #[test]
    fn inactive_accounts_are_skipped() {
        let cash = PaymentMethod::new("cash", "Cash", MethodKind::Cash);
        let accounts = vec![
            PaymentAccount::new("till-1", "Till #1", MethodKind::Cash).deactivated(),
            PaymentAccount::new("till-2", "Till #2", MethodKind::Cash),
        ];
        let account = CompatibilityResolver::resolve_in(&cash, &accounts).unwrap();
        assert_eq!(account.id.as_str(), "till-2");
    }

    #[test]
    fn reload_changes_resolution() {
        let cash = PaymentMethod::new("cash", "Cash", MethodKind::Cash);
        let catalog = InMemoryCatalog::new(vec![cash.clone()], accounts());
        catalog
            .replace(
                vec![cash.clone()],
                vec![PaymentAccount::new("till-1", "Till #1", MethodKind::Cash).deactivated()],
            )
            .unwrap();
        assert!(CompatibilityResolver::resolve(&catalog, &cash).unwrap().is_none());
    }

    #[test]
    fn usable_methods_excludes_unresolvable() {
        let catalog = InMemoryCatalog::new(
            vec![
                PaymentMethod::new("cash", "Cash", MethodKind::Cash),
                PaymentMethod::new("bank", "Bank Transfer", MethodKind::BankTransfer),
            ],
            accounts(),
        );
        let usable = CompatibilityResolver::usable_methods(&catalog).unwrap();
        assert_eq!(usable.len(), 1);
        assert_eq!(usable[0].0.id.as_str(), "cash");
        assert_eq!(usable[0].1.id.as_str(), "till-1");
    }

    #[test]
    fn usable_methods_on_empty_catalog() {
        let catalog = InMemoryCatalog::default();
        assert!(matches!(
            CompatibilityResolver::usable_methods(&catalog),
            Err(CatalogError::Empty)
        ));
    }
}
