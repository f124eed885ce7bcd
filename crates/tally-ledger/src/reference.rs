use tally_types::PaymentMethod;

use crate::error::LedgerError;

/// Checks operator-entered transaction references against a method's rules.
pub struct ReferenceValidator;

impl ReferenceValidator {
    pub fn requires_reference(method: &PaymentMethod) -> bool {
        method.requires_reference
    }

    /// Validate `raw` for `method` and return the normalized reference.
    ///
    /// Blank input is an error only when the method requires a reference;
    /// otherwise it normalizes to an empty string. Non-blank input must match
    /// the method's format, if it has one.
    pub fn validate_reference(method: &PaymentMethod, raw: &str) -> Result<String, LedgerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if method.requires_reference {
                return Err(LedgerError::EmptyReference {
                    method: method.id.clone(),
                });
            }
            return Ok(String::new());
        }

        match &method.reference_format {
            Some(format) => {
                let normalized = format.normalize(trimmed);
                if !format.matches(&normalized) {
                    return Err(LedgerError::MalformedReference {
                        method: method.id.clone(),
                        expected: format.hint(),
                    });
                }
                Ok(normalized)
            }
            None => Ok(trimmed.to_string()),
        }
    }

    /// The reference to store on a new entry.
    ///
    /// `Some` exactly when the method requires one. Input supplied for a
    /// method that does not require a reference is discarded.
    pub fn reference_for_entry(
        method: &PaymentMethod,
        raw: Option<&str>,
    ) -> Result<Option<String>, LedgerError> {
        if !method.requires_reference {
            return Ok(None);
        }
        Self::validate_reference(method, raw.unwrap_or_default()).map(Some)
    }

    /// Placeholder text for the reference field, if the method has a format.
    pub fn hint(method: &PaymentMethod) -> Option<String> {
        method.reference_format.as_ref().map(|format| format.hint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::{MethodKind, ReferenceFormat};

    fn mpesa() -> PaymentMethod {
        PaymentMethod::new("mpesa", "M-Pesa", MethodKind::MobileMoney)
            .with_required_reference(Some(ReferenceFormat::confirmation_code()))
    }

    #[test]
    fn required_reference_rejects_blank() {
        for raw in ["", "   ", "\t\n"] {
            let err = ReferenceValidator::validate_reference(&mpesa(), raw).unwrap_err();
            assert!(matches!(err, LedgerError::EmptyReference { .. }));
        }
    }

    #[test]
    fn formatted_reference_is_normalized() {
        let reference = ReferenceValidator::validate_reference(&mpesa(), " qhx4k2l9pz ").unwrap();
        assert_eq!(reference, "QHX4K2L9PZ");
    }

    #[test]
    fn malformed_reference_carries_hint() {
        let err = ReferenceValidator::validate_reference(&mpesa(), "ABC").unwrap_err();
        match err {
            LedgerError::MalformedReference { method, expected } => {
                assert_eq!(method.as_str(), "mpesa");
                assert!(expected.starts_with("10 letters or digits"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unformatted_reference_is_trimmed() {
        let bank = PaymentMethod::new("bank", "Bank Transfer", MethodKind::BankTransfer)
            .with_required_reference(None);
        assert_eq!(
            ReferenceValidator::validate_reference(&bank, "  slip 0042 ").unwrap(),
            "slip 0042"
        );
    }

    #[test]
    fn optional_reference_allows_blank() {
        let cash = PaymentMethod::new("cash", "Cash", MethodKind::Cash);
        assert!(!ReferenceValidator::requires_reference(&cash));
        assert_eq!(ReferenceValidator::validate_reference(&cash, " ").unwrap(), "");
    }

    #[test]
    fn entry_reference_present_iff_required() {
        let cash = PaymentMethod::new("cash", "Cash", MethodKind::Cash);
        assert_eq!(
            ReferenceValidator::reference_for_entry(&cash, Some("R-1")).unwrap(),
            None
        );
        assert_eq!(
            ReferenceValidator::reference_for_entry(&mpesa(), Some("qhx4k2l9pz")).unwrap(),
            Some("QHX4K2L9PZ".to_string())
        );
        assert!(matches!(
            ReferenceValidator::reference_for_entry(&mpesa(), None),
            Err(LedgerError::EmptyReference { .. })
        ));
    }

    #[test]
    fn hint_only_for_formatted_methods() {
        assert!(ReferenceValidator::hint(&mpesa()).is_some());
        let cash = PaymentMethod::new("cash", "Cash", MethodKind::Cash);
        assert!(ReferenceValidator::hint(&cash).is_none());
    }
}
