//! Upstream data snapshots.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use tokenrate_common::{BurnRule, Condition, CurrencyRateEdge, EarnRule, Partner, RatePair};
use tokenrate_engine::InMemoryProviders;

/// Everything the engine reads from its collaborators, captured as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Global token rate.
    pub global_rate: RatePair,
    #[serde(default)]
    pub currency_rates: Vec<CurrencyRateEdge>,
    #[serde(default)]
    pub partners: Vec<Partner>,
    #[serde(default)]
    pub burn_rules: Vec<BurnRule>,
    #[serde(default)]
    pub earn_rules: Vec<EarnRule>,
    /// Standalone conditions. Conditions nested in earn rules are
    /// registered as well.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;

        Self::parse(&raw).with_context(|| format!("Invalid snapshot {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serve the snapshot from in-memory providers.
    pub fn into_providers(self) -> Arc<InMemoryProviders> {
        let providers = InMemoryProviders::new(self.global_rate);
        providers.set_currency_rates(self.currency_rates);

        for partner in self.partners {
            providers.add_partner(partner);
        }
        for rule in self.burn_rules {
            providers.add_burn_rule(rule);
        }
        for rule in self.earn_rules {
            providers.add_earn_rule(rule);
        }
        for condition in self.conditions {
            providers.add_condition(condition);
        }

        Arc::new(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokenrate_common::{ConversionSource, CustomerId, PartnerId};
    use tokenrate_engine::{ConversionRateService, EngineConfig};

    const PARTNER: &str = "6f1c1f0e-7d2a-4b8e-9a51-0c3b8f0e2d11";

    fn sample() -> String {
        format!(
            r#"{{
                "global_rate": {{ "amount_in_currency": "1", "amount_in_tokens": "10" }},
                "currency_rates": [
                    {{ "base_asset": "usd", "quote_asset": "EUR", "rate": "0.5" }}
                ],
                "partners": [
                    {{
                        "id": "{PARTNER}",
                        "use_global_currency_rate": false,
                        "amount_in_currency": "2",
                        "amount_in_tokens": "10"
                    }}
                ]
            }}"#
        )
    }

    #[test]
    fn test_parse_fills_missing_sections() {
        let snapshot = Snapshot::parse(&sample()).unwrap();

        assert_eq!(snapshot.global_rate, RatePair::new(dec!(1), dec!(10)));
        assert_eq!(snapshot.partners.len(), 1);
        assert!(snapshot.burn_rules.is_empty());
        assert!(snapshot.conditions.is_empty());
        assert_eq!(snapshot.currency_rates[0].base_asset.code(), "USD");
    }

    #[test]
    fn test_parse_rejects_missing_global_rate() {
        assert!(Snapshot::parse(r#"{ "partners": [] }"#).is_err());
    }

    #[tokio::test]
    async fn test_snapshot_serves_engine() {
        let providers = Snapshot::parse(&sample()).unwrap().into_providers();
        let service = ConversionRateService::with_providers(&EngineConfig::default(), providers);
        let partner_id = PartnerId::parse(PARTNER).unwrap();

        let quote = service
            .optimal_rate_by_partner(partner_id, CustomerId::new(), "MVN", "EUR")
            .await
            .unwrap();

        assert_eq!(quote.source, ConversionSource::Partner);
        assert_eq!(quote.rate, dec!(0.1));
    }
}
