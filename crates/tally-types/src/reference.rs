use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Characters a reference body may contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCharset {
    Digits,
    Alphanumeric,
    /// Digits, with an optional single leading `+`.
    PhoneLike,
    /// Anything but whitespace.
    Any,
}

impl ReferenceCharset {
    fn allows(self, c: char) -> bool {
        match self {
            Self::Digits | Self::PhoneLike => c.is_ascii_digit(),
            Self::Alphanumeric => c.is_ascii_alphanumeric(),
            Self::Any => !c.is_whitespace(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Digits => "digits",
            Self::Alphanumeric => "letters or digits",
            Self::PhoneLike => "phone digits",
            Self::Any => "characters",
        }
    }
}

/// Shape of an operator-issued transaction reference.
///
/// Length bounds apply to the reference body, i.e. after the optional
/// prefix and, for [`ReferenceCharset::PhoneLike`], after a leading `+`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFormat {
    pub min_len: usize,
    pub max_len: usize,
    pub charset: ReferenceCharset,
    #[serde(default)]
    pub prefix: Option<String>,
    /// Upper-case the input before matching.
    #[serde(default)]
    pub uppercase: bool,
    /// Sample value shown to the operator.
    #[serde(default)]
    pub example: Option<String>,
}

impl ReferenceFormat {
    pub fn new(
        min_len: usize,
        max_len: usize,
        charset: ReferenceCharset,
    ) -> Result<Self, TypeError> {
        let format = Self {
            min_len,
            max_len,
            charset,
            prefix: None,
            uppercase: false,
            example: None,
        };
        format.validate()?;
        Ok(format)
    }

    /// Mobile-money confirmation code: ten upper-case letters or digits.
    pub fn confirmation_code() -> Self {
        Self {
            min_len: 10,
            max_len: 10,
            charset: ReferenceCharset::Alphanumeric,
            prefix: None,
            uppercase: true,
            example: Some("QHX4K2L9PZ".into()),
        }
    }

    /// Phone-number-like reference: 9 to 13 digits, optional leading `+`.
    pub fn phone_number() -> Self {
        Self {
            min_len: 9,
            max_len: 13,
            charset: ReferenceCharset::PhoneLike,
            prefix: None,
            uppercase: false,
            example: Some("+255712345678".into()),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Check that the bounds are usable.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.max_len == 0 {
            return Err(TypeError::InvalidReferenceFormat(
                "max_len must be positive".into(),
            ));
        }
        if self.min_len > self.max_len {
            return Err(TypeError::InvalidReferenceFormat(format!(
                "min_len {} exceeds max_len {}",
                self.min_len, self.max_len
            )));
        }
        if let Some(prefix) = &self.prefix {
            if prefix.trim().is_empty() {
                return Err(TypeError::InvalidReferenceFormat("blank prefix".into()));
            }
        }
        Ok(())
    }

    /// Trim, drop inner spaces for phone-like references, and fold case.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let collapsed: String = match self.charset {
            ReferenceCharset::PhoneLike => trimmed.chars().filter(|c| *c != ' ').collect(),
            _ => trimmed.to_string(),
        };
        if self.uppercase {
            collapsed.to_ascii_uppercase()
        } else {
            collapsed
        }
    }

    /// Whether an already-normalized reference has this shape.
    pub fn matches(&self, normalized: &str) -> bool {
        let body = match &self.prefix {
            Some(prefix) => match normalized.strip_prefix(prefix.as_str()) {
                Some(rest) => rest,
                None => return false,
            },
            None => normalized,
        };
        let body = match self.charset {
            ReferenceCharset::PhoneLike => body.strip_prefix('+').unwrap_or(body),
            _ => body,
        };

        let len = body.chars().count();
        len >= self.min_len
            && len <= self.max_len
            && body.chars().all(|c| self.charset.allows(c))
    }

    /// Placeholder text describing the expected shape.
    pub fn hint(&self) -> String {
        let length = if self.min_len == self.max_len {
            format!("{}", self.max_len)
        } else {
            format!("{}-{}", self.min_len, self.max_len)
        };
        let mut hint = format!("{length} {}", self.charset.describe());
        if let Some(prefix) = &self.prefix {
            hint = format!("{prefix} followed by {hint}");
        }
        if let Some(example) = &self.example {
            hint.push_str(&format!(", e.g. {example}"));
        }
        hint
    }
}
