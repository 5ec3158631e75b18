//! Engine configuration.

use serde::{Deserialize, Serialize};
use tokenrate_common::Currency;

/// The fixed currency pair every [`RatePair`](tokenrate_common::RatePair) is
/// expressed against. Set once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorCurrencies {
    /// The loyalty program's native token.
    pub token_currency: Currency,
    /// Reference fiat currency.
    pub base_fiat_currency: Currency,
}

impl AnchorCurrencies {
    /// Create a new anchor.
    pub fn new(token_currency: impl Into<Currency>, base_fiat_currency: impl Into<Currency>) -> Self {
        Self {
            token_currency: token_currency.into(),
            base_fiat_currency: base_fiat_currency.into(),
        }
    }
}

impl Default for AnchorCurrencies {
    fn default() -> Self {
        Self::new("MVN", "USD")
    }
}

/// Main engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Anchor currencies.
    pub anchor: AnchorCurrencies,
    /// Page size used when listing a partner's burn rules.
    pub burn_rule_page_size: u32,
    /// Log level.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            anchor: AnchorCurrencies::default(),
            burn_rule_page_size: 500,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(token) = std::env::var("TOKEN_CURRENCY") {
            config.anchor.token_currency = Currency::new(token);
        }

        if let Ok(fiat) = std::env::var("BASE_FIAT_CURRENCY") {
            config.anchor.base_fiat_currency = Currency::new(fiat);
        }

        if let Ok(size) = std::env::var("BURN_RULE_PAGE_SIZE") {
            if let Ok(size) = size.parse() {
                config.burn_rule_page_size = size;
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.anchor.token_currency.code().is_empty() {
            return Err("Token currency cannot be empty".to_string());
        }

        if self.anchor.base_fiat_currency.code().is_empty() {
            return Err("Base fiat currency cannot be empty".to_string());
        }

        if self.anchor.token_currency == self.anchor.base_fiat_currency {
            return Err("Token currency and base fiat currency must differ".to_string());
        }

        if self.burn_rule_page_size == 0 {
            return Err("Burn rule page size cannot be 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.anchor.token_currency.code(), "MVN");
    }

    #[test]
    fn test_invalid_config() {
        let mut config = EngineConfig::default();
        config.anchor.base_fiat_currency = Currency::new("mvn");
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.burn_rule_page_size = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.anchor.token_currency = Currency::new("");
        assert!(config.validate().is_err());
    }
}
