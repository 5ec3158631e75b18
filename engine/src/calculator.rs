//! Turns a resolved rate pair into a conversion rate between two currencies.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokenrate_common::{fixed, Currency, RatePair};
use tracing::{debug, instrument};

use crate::config::AnchorCurrencies;
use crate::error::{RateError, RateResult};
use crate::graph::{Direction, RateGraph};
use crate::provider::CurrencyRateProvider;

/// Rate calculator anchored at the token and base fiat currencies.
pub struct RateCalculator {
    anchor: AnchorCurrencies,
    rates: Arc<dyn CurrencyRateProvider>,
}

impl RateCalculator {
    /// Create a new calculator.
    pub fn new(anchor: AnchorCurrencies, rates: Arc<dyn CurrencyRateProvider>) -> Self {
        Self { anchor, rates }
    }

    /// Multiplicative factor converting one unit of `from` into `to`.
    ///
    /// The anchor pair alone answers token/base-fiat conversions. Anything
    /// else walks the market-rate graph between the base fiat currency and
    /// the other side, then scales by the anchor pair.
    #[instrument(skip(self, pair), fields(pair = %pair))]
    pub async fn calculate_conversion_rate(
        &self,
        pair: &RatePair,
        from: &Currency,
        to: &Currency,
    ) -> RateResult<Decimal> {
        let token = &self.anchor.token_currency;
        let base_fiat = &self.anchor.base_fiat_currency;

        let with_token = from == token || to == token;
        let forward = if with_token { from == token } else { from == base_fiat };

        let initial_rate = self.initial_rate(pair, from, to)?;

        if (from == token && to == base_fiat) || (from == base_fiat && to == token) {
            return Ok(initial_rate);
        }

        let (start, end, direction) = if forward {
            (base_fiat, to, Direction::Forward)
        } else {
            (from, base_fiat, Direction::Backward)
        };

        let edges = self.rates.currency_rates().await?;
        let graph = RateGraph::build(&edges, direction);

        if !graph.contains(start) {
            debug!(start = %start, "Starting currency has no market rates");
            return Err(RateError::rate_not_found(start, end));
        }

        let path_rate = graph
            .find_rate(start, end)?
            .ok_or_else(|| RateError::rate_not_found(from, to))?;

        debug!(
            start = %start,
            end = %end,
            path_rate = %path_rate,
            initial_rate = %initial_rate,
            "Found market rate path"
        );

        fixed::mul(path_rate, initial_rate)
            .ok_or_else(|| RateError::InvalidRatePair(format!("rate overflow converting {} to {}", from, to)))
    }

    fn initial_rate(&self, pair: &RatePair, from: &Currency, to: &Currency) -> RateResult<Decimal> {
        let token = &self.anchor.token_currency;

        let rate = if from == token {
            fixed::div(pair.amount_in_currency, pair.amount_in_tokens)
        } else if to == token {
            fixed::div(pair.amount_in_tokens, pair.amount_in_currency)
        } else {
            // Token is on neither side; the pair only seeds the product.
            Some(Decimal::ONE)
        };

        rate.ok_or_else(|| RateError::InvalidRatePair(pair.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProviders;
    use rust_decimal_macros::dec;
    use tokenrate_common::CurrencyRateEdge;

    const TOLERANCE: Decimal = dec!(0.0000000001);

    fn edge(base: &str, quote: &str, rate: Decimal) -> CurrencyRateEdge {
        CurrencyRateEdge::new(base, quote, rate)
    }

    fn market() -> Vec<CurrencyRateEdge> {
        vec![
            edge("MVN", "USD", dec!(2)),
            edge("USD", "AED", dec!(3.67)),
            edge("USD", "NZD", dec!(1.58)),
            edge("AED", "EUR", dec!(0.25)),
            edge("EUR", "GBP", dec!(0.89)),
            edge("EUR", "BGN", dec!(1.96)),
        ]
    }

    fn setup_calculator(edges: Vec<CurrencyRateEdge>) -> (RateCalculator, Arc<InMemoryProviders>) {
        let providers = Arc::new(InMemoryProviders::new(RatePair::new(dec!(1), dec!(1))));
        providers.set_currency_rates(edges);

        let anchor = AnchorCurrencies::new("MVN", "USD");
        (RateCalculator::new(anchor, providers.clone()), providers)
    }

    fn mvn() -> Currency {
        Currency::new("MVN")
    }

    #[tokio::test]
    async fn test_anchor_pair_needs_no_graph() {
        let (calculator, providers) = setup_calculator(market());

        let forward = calculator
            .calculate_conversion_rate(&RatePair::new(dec!(5), dec!(100)), &mvn(), &Currency::usd())
            .await
            .unwrap();
        let backward = calculator
            .calculate_conversion_rate(&RatePair::new(dec!(4), dec!(100)), &Currency::usd(), &mvn())
            .await
            .unwrap();

        assert_eq!(forward, dec!(0.05));
        assert_eq!(backward, dec!(25));
        assert_eq!(providers.calls(), 0);
    }

    #[tokio::test]
    async fn test_token_to_foreign_currency_walks_graph() {
        let (calculator, _) = setup_calculator(market());

        let rate = calculator
            .calculate_conversion_rate(&RatePair::new(dec!(10), dec!(2)), &mvn(), &Currency::new("BGN"))
            .await
            .unwrap();

        assert_eq!(rate, dec!(3.67) * dec!(0.25) * dec!(1.96) * dec!(5));
    }

    #[tokio::test]
    async fn test_foreign_currency_to_token_divides_rates() {
        let (calculator, _) = setup_calculator(market());

        let rate = calculator
            .calculate_conversion_rate(&RatePair::new(dec!(10), dec!(2)), &Currency::new("BGN"), &mvn())
            .await
            .unwrap();

        let expected = (dec!(1) / dec!(3.67)) * (dec!(1) / dec!(0.25)) * (dec!(1) / dec!(1.96)) * dec!(0.2);
        assert!((rate - expected).abs() < TOLERANCE, "{} != {}", rate, expected);
    }

    #[tokio::test]
    async fn test_base_fiat_to_foreign_currency_ignores_pair() {
        let (calculator, _) = setup_calculator(market());

        let rate = calculator
            .calculate_conversion_rate(&RatePair::new(dec!(10), dec!(2)), &Currency::usd(), &Currency::new("BGN"))
            .await
            .unwrap();

        assert_eq!(rate, dec!(3.67) * dec!(0.25) * dec!(1.96));
    }

    #[tokio::test]
    async fn test_foreign_source_resolves_against_base_fiat() {
        let (calculator, _) = setup_calculator(market());

        // Neither side is the token and `from` is not the base fiat currency,
        // so the search runs backwards from GBP to USD and `to` takes no part.
        let rate = calculator
            .calculate_conversion_rate(&RatePair::new(dec!(10), dec!(2)), &Currency::new("GBP"), &Currency::new("AED"))
            .await
            .unwrap();

        let expected = dec!(1) / dec!(0.89) / dec!(0.25) / dec!(3.67);
        assert!((rate - expected).abs() < TOLERANCE);
    }

    #[tokio::test]
    async fn test_round_trip_within_tolerance() {
        let edges = vec![
            edge("MVN", "USD", dec!(2)),
            edge("USD", "AED", dec!(3.67)),
            edge("USD", "NZD", dec!(1.58)),
            edge("AED", "USD", dec!(0.25)),
            edge("AED", "EUR", dec!(0.25)),
            edge("EUR", "GBP", dec!(0.89)),
            edge("EUR", "BGN", dec!(1.96)),
        ];
        let (calculator, _) = setup_calculator(edges);
        let pair = RatePair::new(dec!(10), dec!(2));
        let amount = dec!(200);

        let forward = calculator
            .calculate_conversion_rate(&pair, &mvn(), &Currency::new("BGN"))
            .await
            .unwrap();
        let converted = amount * forward;

        let backward = calculator
            .calculate_conversion_rate(&pair, &Currency::new("BGN"), &mvn())
            .await
            .unwrap();

        assert!((converted * backward - amount).abs() < TOLERANCE);
    }

    #[tokio::test]
    async fn test_unknown_currency_fails() {
        let (calculator, _) = setup_calculator(market());
        let pair = RatePair::new(dec!(1), dec!(10));

        let to_cad = calculator
            .calculate_conversion_rate(&pair, &mvn(), &Currency::new("CAD"))
            .await;
        let cad_to_try = calculator
            .calculate_conversion_rate(&pair, &Currency::new("CAD"), &Currency::new("TRY"))
            .await;

        assert!(matches!(to_cad, Err(RateError::ConversionRateNotFound { .. })));
        assert!(matches!(cad_to_try, Err(RateError::ConversionRateNotFound { .. })));
    }

    #[tokio::test]
    async fn test_overflowing_market_path_is_rejected() {
        let edges = vec![
            edge("USD", "XAU", dec!(1)),
            edge("XAU", "BTC", dec!(10000000000000000)),
            edge("BTC", "JPY", dec!(10000000000000)),
            edge("USD", "JPY", dec!(150)),
        ];
        let (calculator, _) = setup_calculator(edges);

        let result = calculator
            .calculate_conversion_rate(&RatePair::new(dec!(1), dec!(1)), &mvn(), &Currency::new("JPY"))
            .await;

        assert!(matches!(result, Err(RateError::InvalidRatePair(_))));
    }

    #[tokio::test]
    async fn test_zero_currency_amount_is_rejected() {
        let (calculator, _) = setup_calculator(market());

        let result = calculator
            .calculate_conversion_rate(&RatePair::new(Decimal::ZERO, dec!(10)), &Currency::usd(), &mvn())
            .await;

        assert!(matches!(result, Err(RateError::InvalidRatePair(_))));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let (calculator, providers) = setup_calculator(market());
        providers.fail_with("timeout");

        let result = calculator
            .calculate_conversion_rate(&RatePair::new(dec!(10), dec!(2)), &mvn(), &Currency::eur())
            .await;

        assert!(matches!(result, Err(RateError::Provider(_))));
    }
}
