//! Reward rules, conditions and partner profiles as supplied by upstream
//! services.
//!
//! The engine only reads these. Each entity either carries its own
//! [`RatePair`], delegates to one or more partners, or carries neither and
//! falls through to the global rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BurnRuleId, ConditionId, EarnRuleId, PartnerId, RatePair};

/// How an earn rule or condition rewards the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RewardType {
    #[default]
    Fixed,
    Percentage,
    /// Reward is computed from a currency/token conversion rate.
    ConversionRate,
}

/// A burn (spend) rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRule {
    pub id: BurnRuleId,
    #[serde(default)]
    pub partner_ids: Vec<PartnerId>,
    #[serde(default)]
    pub use_partner_currency_rate: bool,
    #[serde(default)]
    pub amount_in_currency: Option<Decimal>,
    #[serde(default)]
    pub amount_in_tokens: Option<Decimal>,
}

impl BurnRule {
    /// Create a burn rule carrying its own rate.
    pub fn with_rate(id: BurnRuleId, amount_in_currency: Decimal, amount_in_tokens: Decimal) -> Self {
        Self {
            id,
            partner_ids: Vec::new(),
            use_partner_currency_rate: false,
            amount_in_currency: Some(amount_in_currency),
            amount_in_tokens: Some(amount_in_tokens),
        }
    }

    /// Create a burn rule that delegates to the given partners.
    pub fn delegating(id: BurnRuleId, partner_ids: Vec<PartnerId>) -> Self {
        Self {
            id,
            partner_ids,
            use_partner_currency_rate: true,
            amount_in_currency: None,
            amount_in_tokens: None,
        }
    }

    /// The rule's own rate, when both amounts are present.
    pub fn own_rate_pair(&self) -> Option<RatePair> {
        RatePair::from_parts(self.amount_in_currency, self.amount_in_tokens)
    }
}

/// A condition: narrower-scoped rule variant attached to an earn rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    #[serde(default)]
    pub reward_type: RewardType,
    #[serde(default)]
    pub partner_ids: Vec<PartnerId>,
    #[serde(default)]
    pub use_partner_currency_rate: bool,
    #[serde(default)]
    pub amount_in_currency: Option<Decimal>,
    #[serde(default)]
    pub amount_in_tokens: Option<Decimal>,
}

impl Condition {
    /// Create a condition with no rate of its own.
    pub fn new(id: ConditionId) -> Self {
        Self {
            id,
            reward_type: RewardType::Fixed,
            partner_ids: Vec::new(),
            use_partner_currency_rate: false,
            amount_in_currency: None,
            amount_in_tokens: None,
        }
    }

    /// Give the condition its own conversion rate.
    pub fn with_conversion_rate(mut self, amount_in_currency: Decimal, amount_in_tokens: Decimal) -> Self {
        self.reward_type = RewardType::ConversionRate;
        self.amount_in_currency = Some(amount_in_currency);
        self.amount_in_tokens = Some(amount_in_tokens);
        self
    }

    /// Scope the condition to partners.
    pub fn with_partners(mut self, partner_ids: Vec<PartnerId>) -> Self {
        self.partner_ids = partner_ids;
        self
    }

    /// Delegate the rate to the condition's partners.
    pub fn delegating(mut self) -> Self {
        self.use_partner_currency_rate = true;
        self
    }

    /// Own rate; only conversion-rate conditions with both amounts have one.
    pub fn own_rate_pair(&self) -> Option<RatePair> {
        conversion_rate_pair(self.reward_type, self.amount_in_currency, self.amount_in_tokens)
    }
}

/// An earn rule (campaign) together with its conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnRule {
    pub id: EarnRuleId,
    #[serde(default)]
    pub reward_type: RewardType,
    #[serde(default)]
    pub use_partner_currency_rate: bool,
    #[serde(default)]
    pub amount_in_currency: Option<Decimal>,
    #[serde(default)]
    pub amount_in_tokens: Option<Decimal>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl EarnRule {
    /// Create an earn rule with no rate of its own.
    pub fn new(id: EarnRuleId) -> Self {
        Self {
            id,
            reward_type: RewardType::Fixed,
            use_partner_currency_rate: false,
            amount_in_currency: None,
            amount_in_tokens: None,
            conditions: Vec::new(),
        }
    }

    /// Give the rule its own conversion rate.
    pub fn with_conversion_rate(mut self, amount_in_currency: Decimal, amount_in_tokens: Decimal) -> Self {
        self.reward_type = RewardType::ConversionRate;
        self.amount_in_currency = Some(amount_in_currency);
        self.amount_in_tokens = Some(amount_in_tokens);
        self
    }

    /// Attach a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Delegate the rate to the partners named by the conditions.
    pub fn delegating(mut self) -> Self {
        self.use_partner_currency_rate = true;
        self
    }

    /// Own rate; only conversion-rate rules with both amounts have one.
    pub fn own_rate_pair(&self) -> Option<RatePair> {
        conversion_rate_pair(self.reward_type, self.amount_in_currency, self.amount_in_tokens)
    }

    /// Distinct partner ids across all conditions, in first-seen order.
    pub fn condition_partner_ids(&self) -> Vec<PartnerId> {
        let mut ids: Vec<PartnerId> = Vec::new();
        for id in self.conditions.iter().flat_map(|c| c.partner_ids.iter()) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// A partner profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    #[serde(default)]
    pub use_global_currency_rate: bool,
    #[serde(default)]
    pub amount_in_currency: Option<Decimal>,
    #[serde(default)]
    pub amount_in_tokens: Option<Decimal>,
}

impl Partner {
    /// Create a partner carrying its own rate.
    pub fn with_rate(id: PartnerId, amount_in_currency: Decimal, amount_in_tokens: Decimal) -> Self {
        Self {
            id,
            use_global_currency_rate: false,
            amount_in_currency: Some(amount_in_currency),
            amount_in_tokens: Some(amount_in_tokens),
        }
    }

    /// Create a partner that uses the global rate.
    pub fn using_global_rate(id: PartnerId) -> Self {
        Self {
            id,
            use_global_currency_rate: true,
            amount_in_currency: None,
            amount_in_tokens: None,
        }
    }

    /// Own rate. `None` when the partner delegates to the global rate or has
    /// no amounts configured.
    pub fn own_rate_pair(&self) -> Option<RatePair> {
        if self.use_global_currency_rate {
            return None;
        }
        RatePair::from_parts(self.amount_in_currency, self.amount_in_tokens)
    }
}

/// Page selector for paged upstream listings. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// First page of the given size.
    pub fn first(size: u32) -> Self {
        Self { page: 1, size }
    }

    /// The page after this one.
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
        }
    }
}

/// One page of burn rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BurnRulePage {
    pub rules: Vec<BurnRule>,
    /// Number of rules across all pages.
    pub total_count: usize,
}

fn conversion_rate_pair(
    reward_type: RewardType,
    amount_in_currency: Option<Decimal>,
    amount_in_tokens: Option<Decimal>,
) -> Option<RatePair> {
    if reward_type != RewardType::ConversionRate {
        return None;
    }
    RatePair::from_parts(amount_in_currency, amount_in_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_earn_rule_partner_union_is_distinct() {
        let a = PartnerId::new();
        let b = PartnerId::new();

        let rule = EarnRule::new(EarnRuleId::new())
            .with_condition(Condition::new(ConditionId::new()).with_partners(vec![a, b]))
            .with_condition(Condition::new(ConditionId::new()))
            .with_condition(Condition::new(ConditionId::new()).with_partners(vec![b, a, a]));

        assert_eq!(rule.condition_partner_ids(), vec![a, b]);
    }

    #[test]
    fn test_own_rate_requires_conversion_reward_type() {
        let mut rule = EarnRule::new(EarnRuleId::new()).with_conversion_rate(dec!(10), dec!(2));
        assert_eq!(rule.own_rate_pair(), Some(RatePair::new(dec!(10), dec!(2))));

        rule.reward_type = RewardType::Percentage;
        assert_eq!(rule.own_rate_pair(), None);
    }

    #[test]
    fn test_partner_using_global_rate_has_no_pair() {
        let mut partner = Partner::with_rate(PartnerId::new(), dec!(10), dec!(2));
        assert!(partner.own_rate_pair().is_some());

        partner.use_global_currency_rate = true;
        assert!(partner.own_rate_pair().is_none());
    }

    #[test]
    fn test_burn_rule_defaults_from_json() {
        let id = BurnRuleId::new();
        let json = format!(r#"{{"id":"{}","amount_in_currency":"5","amount_in_tokens":"1"}}"#, id);
        let rule: BurnRule = serde_json::from_str(&json).unwrap();

        assert!(!rule.use_partner_currency_rate);
        assert!(rule.partner_ids.is_empty());
        assert_eq!(rule.own_rate_pair(), Some(RatePair::new(dec!(5), dec!(1))));
    }

    #[test]
    fn test_page_request_advances() {
        let page = PageRequest::first(500).next();
        assert_eq!(page, PageRequest { page: 2, size: 500 });
    }
}
