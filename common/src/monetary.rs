//! Monetary types for the TokenRate engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fixed;

/// Currency code.
///
/// Codes are upper-cased on construction, so `"usd"` and `"USD"` name the
/// same currency everywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

/// Ratio between an amount of the base fiat currency and an amount of tokens.
///
/// Every pair is implicitly anchored at the configured token currency and
/// base fiat currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePair {
    /// Amount expressed in the base fiat currency.
    pub amount_in_currency: Decimal,
    /// Equivalent amount of tokens (18 fractional digits).
    pub amount_in_tokens: Decimal,
}

impl RatePair {
    /// Create a new rate pair.
    pub fn new(amount_in_currency: Decimal, amount_in_tokens: Decimal) -> Self {
        Self {
            amount_in_currency,
            amount_in_tokens: fixed::normalize(amount_in_tokens),
        }
    }

    /// Build a pair from the optional amounts upstream entities carry.
    pub fn from_parts(
        amount_in_currency: Option<Decimal>,
        amount_in_tokens: Option<Decimal>,
    ) -> Option<Self> {
        Some(Self::new(amount_in_currency?, amount_in_tokens?))
    }

    /// Currency per token. `None` when the token amount is zero.
    pub fn ratio(&self) -> Option<Decimal> {
        fixed::div(self.amount_in_currency, self.amount_in_tokens)
    }

    /// Whether the pair can be used as a divisor in either direction.
    pub fn is_usable(&self) -> bool {
        !self.amount_in_tokens.is_zero()
    }
}

impl fmt::Display for RatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {} tokens", self.amount_in_currency, self.amount_in_tokens)
    }
}

/// Directed market quote: one unit of `base_asset` equals `rate` units of
/// `quote_asset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRateEdge {
    pub base_asset: Currency,
    pub quote_asset: Currency,
    pub rate: Decimal,
}

impl CurrencyRateEdge {
    /// Create a new edge.
    pub fn new(base_asset: impl Into<Currency>, quote_asset: impl Into<Currency>, rate: Decimal) -> Self {
        Self {
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
            rate: fixed::normalize(rate),
        }
    }
}

impl fmt::Display for CurrencyRateEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.base_asset, self.quote_asset, self.rate)
    }
}

/// Which entity produced the rate used for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionSource {
    /// Taken from a burn (spend) rule.
    BurnRule,
    /// Taken from an earn rule.
    EarnRule,
    /// Taken from a partner profile.
    Partner,
    /// Taken from the global conversion rate.
    Global,
    /// Taken from a condition.
    Condition,
}

impl fmt::Display for ConversionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionSource::BurnRule => "BurnRule",
            ConversionSource::EarnRule => "EarnRule",
            ConversionSource::Partner => "Partner",
            ConversionSource::Global => "Global",
            ConversionSource::Condition => "Condition",
        };
        f.write_str(name)
    }
}
