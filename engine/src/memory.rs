//! In-memory collaborators backed by a static data set.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokenrate_common::{
    BurnRule, BurnRuleId, BurnRulePage, Condition, ConditionId, CurrencyRateEdge, EarnRule,
    EarnRuleId, PageRequest, Partner, PartnerId, RatePair,
};
use tracing::debug;

use crate::error::{RateError, RateResult};
use crate::provider::{CampaignProvider, CurrencyRateProvider, PartnerProvider};

/// Implements every collaborator trait over in-memory tables.
///
/// Burn rules keep insertion order, which is the order the "best rule" scan
/// sees them in.
pub struct InMemoryProviders {
    burn_rules: RwLock<Vec<BurnRule>>,
    earn_rules: DashMap<EarnRuleId, EarnRule>,
    conditions: DashMap<ConditionId, Condition>,
    partners: DashMap<PartnerId, Partner>,
    global_rate: RwLock<RatePair>,
    currency_rates: RwLock<Vec<CurrencyRateEdge>>,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl InMemoryProviders {
    /// Create an empty data set with the given global rate.
    pub fn new(global_rate: RatePair) -> Self {
        Self {
            burn_rules: RwLock::new(Vec::new()),
            earn_rules: DashMap::new(),
            conditions: DashMap::new(),
            partners: DashMap::new(),
            global_rate: RwLock::new(global_rate),
            currency_rates: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn add_burn_rule(&self, rule: BurnRule) {
        self.burn_rules.write().push(rule);
    }

    /// Add an earn rule. Its conditions become individually addressable too.
    pub fn add_earn_rule(&self, rule: EarnRule) {
        for condition in &rule.conditions {
            self.conditions.insert(condition.id, condition.clone());
        }
        self.earn_rules.insert(rule.id, rule);
    }

    pub fn add_condition(&self, condition: Condition) {
        self.conditions.insert(condition.id, condition);
    }

    pub fn add_partner(&self, partner: Partner) {
        self.partners.insert(partner.id, partner);
    }

    pub fn set_currency_rates(&self, edges: Vec<CurrencyRateEdge>) {
        *self.currency_rates.write() = edges;
    }

    /// Make every subsequent call fail with [`RateError::Provider`].
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    /// Number of collaborator calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn enter(&self, operation: &str) -> RateResult<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        debug!(operation, "In-memory provider call");
        match self.failure.read().as_ref() {
            Some(message) => Err(RateError::Provider(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CampaignProvider for InMemoryProviders {
    async fn burn_rules_for_partner(
        &self,
        partner_id: PartnerId,
        page: PageRequest,
    ) -> RateResult<BurnRulePage> {
        self.enter("burn_rules_for_partner")?;

        let rules = self.burn_rules.read();
        let scoped: Vec<&BurnRule> = rules
            .iter()
            .filter(|r| r.partner_ids.contains(&partner_id))
            .collect();

        let skip = page.page.saturating_sub(1) as usize * page.size as usize;
        let page_rules = scoped
            .iter()
            .skip(skip)
            .take(page.size as usize)
            .map(|r| (*r).clone())
            .collect();

        Ok(BurnRulePage {
            rules: page_rules,
            total_count: scoped.len(),
        })
    }

    async fn burn_rule(&self, id: BurnRuleId) -> RateResult<Option<BurnRule>> {
        self.enter("burn_rule")?;
        Ok(self.burn_rules.read().iter().find(|r| r.id == id).cloned())
    }

    async fn earn_rule(&self, id: EarnRuleId) -> RateResult<Option<EarnRule>> {
        self.enter("earn_rule")?;
        Ok(self.earn_rules.get(&id).map(|r| r.clone()))
    }

    async fn condition(&self, id: ConditionId) -> RateResult<Option<Condition>> {
        self.enter("condition")?;
        Ok(self.conditions.get(&id).map(|c| c.clone()))
    }
}

#[async_trait]
impl PartnerProvider for InMemoryProviders {
    async fn partner(&self, id: PartnerId) -> RateResult<Option<Partner>> {
        self.enter("partner")?;
        Ok(self.partners.get(&id).map(|p| p.clone()))
    }
}

#[async_trait]
impl CurrencyRateProvider for InMemoryProviders {
    async fn global_rate(&self) -> RateResult<RatePair> {
        self.enter("global_rate")?;
        Ok(*self.global_rate.read())
    }

    async fn currency_rates(&self) -> RateResult<Vec<CurrencyRateEdge>> {
        self.enter("currency_rates")?;
        Ok(self.currency_rates.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_burn_rules_are_paged_in_insertion_order() {
        let providers = InMemoryProviders::new(RatePair::new(dec!(1), dec!(1)));
        let partner = PartnerId::new();

        let ids: Vec<BurnRuleId> = (0..5).map(|_| BurnRuleId::new()).collect();
        for id in &ids {
            let mut rule = BurnRule::with_rate(*id, dec!(1), dec!(1));
            rule.partner_ids = vec![partner];
            providers.add_burn_rule(rule);
        }
        providers.add_burn_rule(BurnRule::with_rate(BurnRuleId::new(), dec!(1), dec!(1)));

        let second = providers
            .burn_rules_for_partner(partner, PageRequest { page: 2, size: 2 })
            .await
            .unwrap();

        assert_eq!(second.total_count, 5);
        let got: Vec<BurnRuleId> = second.rules.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![ids[2], ids[3]]);
    }

    #[tokio::test]
    async fn test_earn_rule_registers_conditions() {
        let providers = InMemoryProviders::new(RatePair::new(dec!(1), dec!(1)));
        let condition = Condition::new(ConditionId::new());
        let rule = EarnRule::new(EarnRuleId::new()).with_condition(condition.clone());

        providers.add_earn_rule(rule);

        assert_eq!(providers.condition(condition.id).await.unwrap(), Some(condition));
    }

    #[tokio::test]
    async fn test_fail_with() {
        let providers = InMemoryProviders::new(RatePair::new(dec!(1), dec!(1)));
        providers.fail_with("campaign service unavailable");

        let result = providers.global_rate().await;

        assert!(matches!(result, Err(RateError::Provider(ref m)) if m == "campaign service unavailable"));
        assert_eq!(providers.calls(), 1);
    }
}
