//! Rate source resolution.
//!
//! Decides which entity's [`RatePair`] governs a request, following the
//! chain rule → partner → global. Ambiguity (several candidate partners)
//! is never an error: it falls back to the global rate. Only a missing
//! referenced entity is.

use std::sync::Arc;

use tokenrate_common::{
    BurnRule, BurnRuleId, ConditionId, ConversionSource, EarnRuleId, PageRequest, PartnerId,
    RatePair,
};
use tracing::{debug, instrument};

use crate::error::{RateError, RateResult};
use crate::provider::{CampaignProvider, CurrencyRateProvider, PartnerProvider};

/// A base pair together with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRate {
    pub pair: RatePair,
    pub source: ConversionSource,
    /// Burn rule picked by the partner resolution, if one was.
    pub burn_rule_id: Option<BurnRuleId>,
}

impl ResolvedRate {
    fn new(pair: RatePair, source: ConversionSource) -> Self {
        Self {
            pair,
            source,
            burn_rule_id: None,
        }
    }
}

/// Picks the governing rate pair for partners, rules and conditions.
pub struct RateSourceResolver {
    campaigns: Arc<dyn CampaignProvider>,
    partners: Arc<dyn PartnerProvider>,
    rates: Arc<dyn CurrencyRateProvider>,
    page_size: u32,
}

impl RateSourceResolver {
    /// Create a new resolver.
    pub fn new(
        campaigns: Arc<dyn CampaignProvider>,
        partners: Arc<dyn PartnerProvider>,
        rates: Arc<dyn CurrencyRateProvider>,
        page_size: u32,
    ) -> Self {
        Self {
            campaigns,
            partners,
            rates,
            page_size: page_size.max(1),
        }
    }

    /// Resolve the best rate a partner offers.
    ///
    /// Prefers the partner's non-delegating burn rule with the highest
    /// currency/token ratio, then the partner profile, then the global rate.
    #[instrument(skip(self))]
    pub async fn resolve_for_partner(&self, partner_id: PartnerId) -> RateResult<ResolvedRate> {
        let rules = self.burn_rules_for_partner(partner_id).await?;

        if let Some((rule, pair)) = best_burn_rule(&rules) {
            debug!(burn_rule_id = %rule.id, "Using best burn rule");
            return Ok(ResolvedRate {
                pair,
                source: ConversionSource::BurnRule,
                burn_rule_id: Some(rule.id),
            });
        }

        let partner = self
            .partners
            .partner(partner_id)
            .await?
            .ok_or(RateError::PartnerNotFound(partner_id))?;

        match usable(partner.own_rate_pair()) {
            Some(pair) => {
                debug!("Using partner rate");
                Ok(ResolvedRate::new(pair, ConversionSource::Partner))
            }
            None => self.global().await,
        }
    }

    /// Resolve the rate for an earn rule.
    #[instrument(skip(self))]
    pub async fn resolve_for_earn_rule(&self, earn_rule_id: EarnRuleId) -> RateResult<ResolvedRate> {
        let rule = self
            .campaigns
            .earn_rule(earn_rule_id)
            .await?
            .ok_or(RateError::EarnRuleNotFound(earn_rule_id))?;

        if rule.use_partner_currency_rate {
            return self.delegate_to_partners(&rule.condition_partner_ids()).await;
        }

        match usable(rule.own_rate_pair()) {
            Some(pair) => Ok(ResolvedRate::new(pair, ConversionSource::EarnRule)),
            None => self.global().await,
        }
    }

    /// Resolve the rate for a burn (spend) rule.
    #[instrument(skip(self))]
    pub async fn resolve_for_burn_rule(&self, burn_rule_id: BurnRuleId) -> RateResult<ResolvedRate> {
        let rule = self
            .campaigns
            .burn_rule(burn_rule_id)
            .await?
            .ok_or(RateError::SpendRuleNotFound(burn_rule_id))?;

        if rule.use_partner_currency_rate {
            return self.delegate_to_partners(&rule.partner_ids).await;
        }

        match usable(rule.own_rate_pair()) {
            Some(pair) => Ok(ResolvedRate::new(pair, ConversionSource::BurnRule)),
            None => self.global().await,
        }
    }

    /// Resolve the rate for a condition.
    #[instrument(skip(self))]
    pub async fn resolve_for_condition(&self, condition_id: ConditionId) -> RateResult<ResolvedRate> {
        let condition = self
            .campaigns
            .condition(condition_id)
            .await?
            .ok_or(RateError::ConditionNotFound(condition_id))?;

        if condition.use_partner_currency_rate {
            return self.delegate_to_partners(&condition.partner_ids).await;
        }

        match usable(condition.own_rate_pair()) {
            Some(pair) => Ok(ResolvedRate::new(pair, ConversionSource::Condition)),
            None => self.global().await,
        }
    }

    /// Use the single candidate partner's own rate, or the global rate when
    /// there is no candidate, more than one, or the partner has no rate.
    async fn delegate_to_partners(&self, partner_ids: &[PartnerId]) -> RateResult<ResolvedRate> {
        let mut candidates: Vec<PartnerId> = Vec::with_capacity(partner_ids.len());
        for id in partner_ids {
            if !candidates.contains(id) {
                candidates.push(*id);
            }
        }

        let [partner_id] = candidates.as_slice() else {
            debug!(candidates = candidates.len(), "No single partner to delegate to");
            return self.global().await;
        };

        let pair = self
            .partners
            .partner(*partner_id)
            .await?
            .and_then(|p| usable(p.own_rate_pair()));

        match pair {
            Some(pair) => {
                debug!(partner_id = %partner_id, "Using delegated partner rate");
                Ok(ResolvedRate::new(pair, ConversionSource::Partner))
            }
            None => self.global().await,
        }
    }

    async fn global(&self) -> RateResult<ResolvedRate> {
        let pair = self.rates.global_rate().await?;
        debug!(pair = %pair, "Using global rate");
        Ok(ResolvedRate::new(pair, ConversionSource::Global))
    }

    /// Every burn rule scoped to the partner, across all pages.
    async fn burn_rules_for_partner(&self, partner_id: PartnerId) -> RateResult<Vec<BurnRule>> {
        let mut rules = Vec::new();
        let mut page = PageRequest::first(self.page_size);

        loop {
            let batch = self.campaigns.burn_rules_for_partner(partner_id, page).await?;
            let received = batch.rules.len();
            rules.extend(batch.rules);

            if received == 0 || rules.len() >= batch.total_count {
                break;
            }
            page = page.next();
        }

        Ok(rules)
    }
}

/// The non-delegating rule with the highest currency/token ratio.
///
/// On ties the later rule wins. Rules without a usable pair never qualify.
pub fn best_burn_rule(rules: &[BurnRule]) -> Option<(&BurnRule, RatePair)> {
    let mut best: Option<(&BurnRule, RatePair, rust_decimal::Decimal)> = None;

    for rule in rules.iter().filter(|r| !r.use_partner_currency_rate) {
        let Some(pair) = rule.own_rate_pair() else {
            continue;
        };
        let Some(ratio) = pair.ratio() else {
            continue;
        };

        match best {
            Some((_, _, best_ratio)) if ratio < best_ratio => {}
            _ => best = Some((rule, pair, ratio)),
        }
    }

    best.map(|(rule, pair, _)| (rule, pair))
}

fn usable(pair: Option<RatePair>) -> Option<RatePair> {
    pair.filter(RatePair::is_usable)
}
