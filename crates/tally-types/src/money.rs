use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A signed money value in integer minor units (cents, senti, ...).
///
/// All settlement arithmetic happens on `Amount`, so many small entries
/// never accumulate rounding drift. Conversion to and from decimal text goes
/// through a [`Currency`], which knows how many minor-unit digits apply.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create from a raw minor-unit count.
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// The raw minor-unit count.
    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// `self * numerator / denominator`, truncated toward zero.
    ///
    /// Returns [`Amount::ZERO`] for a zero denominator.
    pub fn scale(self, numerator: u32, denominator: u32) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        let scaled = i128::from(self.0) * i128::from(numerator) / i128::from(denominator);
        Self(i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX }))
    }

    /// Share of `whole` covered by `self` as a whole percentage.
    ///
    /// Rounds half up and clamps to `0..=100`. A non-positive `whole`
    /// yields 0.
    pub fn percent_of(self, whole: Self) -> u8 {
        if whole.0 <= 0 || self.0 <= 0 {
            return 0;
        }
        let part = i128::from(self.0);
        let whole = i128::from(whole.0);
        let pct = (part * 200 + whole) / (2 * whole);
        pct.min(100) as u8
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// A currency used for pass-through parsing and display.
///
/// Tally never converts between currencies. The currency only decides how
/// many fractional digits an amount has and which code prefixes it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCurrency", into = "RawCurrency")]
pub struct Currency {
    code: String,
    exponent: u8,
}

#[derive(Clone, Serialize, Deserialize)]
struct RawCurrency {
    code: String,
    #[serde(default = "default_exponent")]
    exponent: u8,
}

fn default_exponent() -> u8 {
    2
}

impl TryFrom<RawCurrency> for Currency {
    type Error = TypeError;

    fn try_from(raw: RawCurrency) -> Result<Self, Self::Error> {
        Self::new(raw.code, raw.exponent)
    }
}

impl From<Currency> for RawCurrency {
    fn from(currency: Currency) -> Self {
        Self {
            code: currency.code,
            exponent: currency.exponent,
        }
    }
}

impl Currency {
    /// Create a currency from a three-letter code and minor-unit exponent.
    ///
    /// The code is upper-cased; it must be exactly three ASCII letters.
    pub fn new(code: impl Into<String>, exponent: u8) -> Result<Self, TypeError> {
        let code = code.into().trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TypeError::InvalidCurrency(code));
        }
        if exponent > 4 {
            return Err(TypeError::InvalidExponent(exponent));
        }
        Ok(Self { code, exponent })
    }

    /// Tanzanian shilling, the default till currency.
    pub fn tzs() -> Self {
        Self {
            code: "TZS".into(),
            exponent: 2,
        }
    }

    pub fn usd() -> Self {
        Self {
            code: "USD".into(),
            exponent: 2,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of fractional (minor-unit) digits.
    pub fn exponent(&self) -> u8 {
        self.exponent
    }

    fn scale(&self) -> i64 {
        10i64.pow(u32::from(self.exponent))
    }

    /// Parse a decimal string such as `"1,500.25"` into minor units.
    ///
    /// Accepts an optional leading `-`, `,` or `_` digit grouping, and at
    /// most [`Self::exponent`] fractional digits.
    pub fn parse(&self, input: &str) -> Result<Amount, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidAmount {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty input"));
        }
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let body: String = body.chars().filter(|c| *c != ',' && *c != '_').collect();
        let (whole, frac) = body.split_once('.').unwrap_or((body.as_str(), ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("not a decimal number"));
        }
        if frac.len() > usize::from(self.exponent) {
            return Err(TypeError::ExcessPrecision {
                input: input.to_string(),
                max_digits: self.exponent,
            });
        }

        let whole_minor = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .ok()
                .and_then(|w| w.checked_mul(self.scale()))
                .ok_or_else(|| invalid("out of range"))?
        };
        let frac_minor = if frac.is_empty() {
            0
        } else {
            let padding = 10i64.pow((usize::from(self.exponent) - frac.len()) as u32);
            frac.parse::<i64>().map_err(|_| invalid("out of range"))? * padding
        };

        let minor = whole_minor
            .checked_add(frac_minor)
            .ok_or_else(|| invalid("out of range"))?;
        Ok(Amount::from_minor(if negative { -minor } else { minor }))
    }

    /// Format without the currency code, e.g. `"1,500.00"`.
    pub fn format_plain(&self, amount: Amount) -> String {
        let minor = amount.minor();
        let abs = minor.unsigned_abs();
        let scale = self.scale() as u64;
        let whole = (abs / scale).to_string();
        let frac = abs % scale;

        let mut out = String::with_capacity(whole.len() + whole.len() / 3 + 8);
        if minor < 0 {
            out.push('-');
        }
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        if self.exponent > 0 {
            out.push('.');
            out.push_str(&format!("{frac:0width$}", width = usize::from(self.exponent)));
        }
        out
    }

    /// Format with the currency code, e.g. `"TZS 1,500.00"`.
    pub fn format(&self, amount: Amount) -> String {
        format!("{} {}", self.code, self.format_plain(amount))
    }

    /// Pair `amount` with this currency for display.
    pub fn money(&self, amount: Amount) -> Money {
        Money {
            amount,
            currency: self.clone(),
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::tzs()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// An [`Amount`] tagged with the [`Currency`] it is denominated in.
///
/// Displays as `"TZS 1,500.00"`. Errors carry this rather than a bare
/// `Amount` so their messages read in currency units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Amount,
    pub currency: Currency,
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.currency.format(self.amount))
    }
}
