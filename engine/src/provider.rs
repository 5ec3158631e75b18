//! Collaborator traits for the upstream data the engine reads.
//!
//! The engine never writes through these and never caches what they return.
//! Implementations own retries, timeouts and transport.

use async_trait::async_trait;
use tokenrate_common::{
    BurnRule, BurnRuleId, BurnRulePage, Condition, ConditionId, CurrencyRateEdge, EarnRule,
    EarnRuleId, PageRequest, Partner, PartnerId, RatePair,
};

use crate::error::RateResult;

/// Campaign service: burn rules, earn rules and their conditions.
#[async_trait]
pub trait CampaignProvider: Send + Sync {
    /// One page of burn rules scoped to a partner.
    async fn burn_rules_for_partner(
        &self,
        partner_id: PartnerId,
        page: PageRequest,
    ) -> RateResult<BurnRulePage>;

    async fn burn_rule(&self, id: BurnRuleId) -> RateResult<Option<BurnRule>>;

    /// Earn rule with its conditions populated.
    async fn earn_rule(&self, id: EarnRuleId) -> RateResult<Option<EarnRule>>;

    async fn condition(&self, id: ConditionId) -> RateResult<Option<Condition>>;
}

/// Partner management service.
#[async_trait]
pub trait PartnerProvider: Send + Sync {
    async fn partner(&self, id: PartnerId) -> RateResult<Option<Partner>>;
}

/// Currency convertor service: the global pair and raw market rates.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// System-wide default pair. Always available.
    async fn global_rate(&self) -> RateResult<RatePair>;

    /// Full, unfiltered snapshot of market edges in provider order.
    async fn currency_rates(&self) -> RateResult<Vec<CurrencyRateEdge>>;
}
