use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tally_types::{MethodKind, PaymentAccount, PaymentMethod, ReferenceFormat};
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::memory::InMemoryCatalog;

/// Translate a raw type string from any known vocabulary into a canonical
/// [`MethodKind`].
///
/// Matching ignores case, surrounding whitespace, and `-`/space versus `_`.
pub fn canonical_kind(raw: &str) -> CatalogResult<MethodKind> {
    let normalized: String = raw
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect();

    let kind = match normalized.as_str() {
        "cash" => MethodKind::Cash,
        "card" | "credit_card" | "debit_card" => MethodKind::Card,
        "mobile_money" | "mobile" | "momo" => MethodKind::MobileMoney,
        "bank_transfer" | "bank" => MethodKind::BankTransfer,
        "other" | "savings" | "investment" => MethodKind::Other,
        _ => return Err(CatalogError::UnknownKind(raw.to_string())),
    };
    Ok(kind)
}

/// A payment method as stored by the back office.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MethodRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default, alias = "requiresReference")]
    pub requires_reference: bool,
    #[serde(default, alias = "referenceFormat")]
    pub reference_format: Option<ReferenceFormat>,
    #[serde(default = "active_by_default", alias = "isActive")]
    pub is_active: bool,
}

/// A payment account as stored by the back office.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default = "active_by_default", alias = "isActive")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

/// Raw catalog document, before vocabulary translation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogRecords {
    #[serde(default)]
    pub methods: Vec<MethodRecord>,
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
}

impl CatalogRecords {
    pub fn from_toml_str(input: &str) -> CatalogResult<Self> {
        toml::from_str(input).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    pub fn from_json_str(input: &str) -> CatalogResult<Self> {
        serde_json::from_str(input).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Load from a `.json` file, or TOML for any other extension.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Translate into canonical catalog types.
    ///
    /// Inactive records are dropped. Unknown type strings, duplicate IDs,
    /// and unusable reference formats are errors.
    pub fn translate(&self) -> CatalogResult<(Vec<PaymentMethod>, Vec<PaymentAccount>)> {
        let mut seen = HashSet::new();
        let mut methods = Vec::with_capacity(self.methods.len());
        for record in self.methods.iter().filter(|r| r.is_active) {
            if !seen.insert(record.id.as_str()) {
                return Err(invalid(&record.id, "duplicate method id"));
            }
            let kind = canonical_kind(&record.kind)?;
            if let Some(format) = &record.reference_format {
                format
                    .validate()
                    .map_err(|e| invalid(&record.id, &e.to_string()))?;
            }
            methods.push(PaymentMethod {
                id: record.id.as_str().into(),
                name: record.name.clone(),
                kind,
                // A declared format implies the reference is required.
                requires_reference: record.requires_reference || record.reference_format.is_some(),
                reference_format: record.reference_format.clone(),
            });
        }

        let mut seen = HashSet::new();
        let mut accounts = Vec::with_capacity(self.accounts.len());
        for record in self.accounts.iter().filter(|r| r.is_active) {
            if !seen.insert(record.id.as_str()) {
                return Err(invalid(&record.id, "duplicate account id"));
            }
            accounts.push(PaymentAccount::new(
                record.id.as_str(),
                record.name.clone(),
                canonical_kind(&record.kind)?,
            ));
        }

        debug!(
            methods = methods.len(),
            accounts = accounts.len(),
            dropped_methods = self.methods.len() - methods.len(),
            dropped_accounts = self.accounts.len() - accounts.len(),
            "catalog records translated"
        );
        Ok((methods, accounts))
    }

    /// Translate and wrap in an [`InMemoryCatalog`].
    pub fn into_catalog(self) -> CatalogResult<InMemoryCatalog> {
        let (methods, accounts) = self.translate()?;
        Ok(InMemoryCatalog::new(methods, accounts))
    }
}

fn invalid(id: &str, reason: &str) -> CatalogError {
    CatalogError::InvalidRecord {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}
