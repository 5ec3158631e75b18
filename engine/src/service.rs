//! Conversion rate service: the operations the engine exposes.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokenrate_common::{fixed, BurnRuleId, ConditionId, Currency, CustomerId, EarnRuleId, PartnerId};
use tracing::{info, instrument};

use crate::calculator::RateCalculator;
use crate::config::EngineConfig;
use crate::conversion::{AmountConversion, RateQuote, RateRequest, RateSubject};
use crate::error::{RateError, RateResult};
use crate::provider::{CampaignProvider, CurrencyRateProvider, PartnerProvider};
use crate::resolver::{RateSourceResolver, ResolvedRate};

/// Resolves rates for partners, rules and conditions and converts amounts
/// with them.
///
/// Stateless apart from its collaborators; every call re-reads upstream
/// data.
pub struct ConversionRateService {
    resolver: RateSourceResolver,
    calculator: RateCalculator,
}

impl ConversionRateService {
    /// Create a new service from separate collaborators.
    pub fn new(
        config: &EngineConfig,
        campaigns: Arc<dyn CampaignProvider>,
        partners: Arc<dyn PartnerProvider>,
        rates: Arc<dyn CurrencyRateProvider>,
    ) -> Self {
        Self {
            resolver: RateSourceResolver::new(
                campaigns,
                partners,
                rates.clone(),
                config.burn_rule_page_size,
            ),
            calculator: RateCalculator::new(config.anchor.clone(), rates),
        }
    }

    /// Create a new service from one value implementing every collaborator.
    pub fn with_providers<P>(config: &EngineConfig, providers: Arc<P>) -> Self
    where
        P: CampaignProvider + PartnerProvider + CurrencyRateProvider + 'static,
    {
        Self::new(config, providers.clone(), providers.clone(), providers)
    }

    /// Resolve the rate for any subject.
    #[instrument(skip(self, request), fields(
        subject = %request.subject,
        customer_id = %request.customer_id,
        from = %request.from,
        to = %request.to
    ))]
    pub async fn quote(&self, request: &RateRequest) -> RateResult<RateQuote> {
        if request.is_identity() {
            return Ok(RateQuote::identity(request));
        }

        let result = self.resolve_and_calculate(request).await;

        match &result {
            Ok(quote) => info!(
                rate = %quote.rate,
                source = %quote.source,
                "Conversion rate resolved"
            ),
            Err(e) => info!(error = %e, code = e.error_code(), "Conversion rate not resolved"),
        }

        result
    }

    /// Convert `amount` of `request.from` into `request.to`.
    pub async fn convert(&self, request: &RateRequest, amount: Decimal) -> RateResult<AmountConversion> {
        if request.is_identity() {
            return Ok(AmountConversion::from_quote(RateQuote::identity(request), amount));
        }

        let quote = self.quote(request).await?;
        let converted = fixed::mul(amount, quote.rate).ok_or_else(|| {
            RateError::InvalidRatePair(format!("amount {} overflows at rate {}", amount, quote.rate))
        })?;

        Ok(AmountConversion::from_quote(quote, converted))
    }

    pub async fn optimal_rate_by_partner(
        &self,
        partner_id: PartnerId,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
    ) -> RateResult<RateQuote> {
        self.quote(&RateRequest::new(RateSubject::Partner(partner_id), customer_id, from, to))
            .await
    }

    pub async fn rate_by_earn_rule(
        &self,
        earn_rule_id: EarnRuleId,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
    ) -> RateResult<RateQuote> {
        self.quote(&RateRequest::new(RateSubject::EarnRule(earn_rule_id), customer_id, from, to))
            .await
    }

    pub async fn rate_by_spend_rule(
        &self,
        spend_rule_id: BurnRuleId,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
    ) -> RateResult<RateQuote> {
        self.quote(&RateRequest::new(RateSubject::SpendRule(spend_rule_id), customer_id, from, to))
            .await
    }

    pub async fn rate_by_condition(
        &self,
        condition_id: ConditionId,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
    ) -> RateResult<RateQuote> {
        self.quote(&RateRequest::new(RateSubject::Condition(condition_id), customer_id, from, to))
            .await
    }

    pub async fn convert_optimal_by_partner(
        &self,
        partner_id: PartnerId,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        amount: Decimal,
    ) -> RateResult<AmountConversion> {
        let request = RateRequest::new(RateSubject::Partner(partner_id), customer_id, from, to);
        self.convert(&request, amount).await
    }

    pub async fn convert_by_earn_rule(
        &self,
        earn_rule_id: EarnRuleId,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        amount: Decimal,
    ) -> RateResult<AmountConversion> {
        let request = RateRequest::new(RateSubject::EarnRule(earn_rule_id), customer_id, from, to);
        self.convert(&request, amount).await
    }

    pub async fn convert_by_spend_rule(
        &self,
        spend_rule_id: BurnRuleId,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        amount: Decimal,
    ) -> RateResult<AmountConversion> {
        let request = RateRequest::new(RateSubject::SpendRule(spend_rule_id), customer_id, from, to);
        self.convert(&request, amount).await
    }

    pub async fn convert_by_condition(
        &self,
        condition_id: ConditionId,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        amount: Decimal,
    ) -> RateResult<AmountConversion> {
        let request = RateRequest::new(RateSubject::Condition(condition_id), customer_id, from, to);
        self.convert(&request, amount).await
    }

    async fn resolve_and_calculate(&self, request: &RateRequest) -> RateResult<RateQuote> {
        let resolved = self.resolve(request.subject).await?;

        let rate = self
            .calculator
            .calculate_conversion_rate(&resolved.pair, &request.from, &request.to)
            .await?;

        Ok(RateQuote::new(request, rate, resolved.source).with_spend_rule(resolved.burn_rule_id))
    }

    async fn resolve(&self, subject: RateSubject) -> RateResult<ResolvedRate> {
        match subject {
            RateSubject::Partner(id) => self.resolver.resolve_for_partner(id).await,
            RateSubject::EarnRule(id) => self.resolver.resolve_for_earn_rule(id).await,
            RateSubject::SpendRule(id) => self.resolver.resolve_for_burn_rule(id).await,
            RateSubject::Condition(id) => self.resolver.resolve_for_condition(id).await,
        }
    }
}
