//! Rate and amount conversion requests and results.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokenrate_common::{
    BurnRuleId, ConditionId, ConversionSource, Currency, CustomerId, EarnRuleId, PartnerId,
};

/// The entity a rate is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum RateSubject {
    /// Best rate a partner offers.
    Partner(PartnerId),
    EarnRule(EarnRuleId),
    /// Burn rule, addressed by its spend-rule id.
    SpendRule(BurnRuleId),
    Condition(ConditionId),
}

impl RateSubject {
    /// Source reported when no resolution happens at all.
    pub fn default_source(&self) -> ConversionSource {
        match self {
            RateSubject::Partner(_) => ConversionSource::Partner,
            RateSubject::EarnRule(_) => ConversionSource::EarnRule,
            RateSubject::SpendRule(_) => ConversionSource::BurnRule,
            RateSubject::Condition(_) => ConversionSource::Condition,
        }
    }

    /// Spend rule named by the subject itself.
    pub fn spend_rule_id(&self) -> Option<BurnRuleId> {
        match self {
            RateSubject::SpendRule(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for RateSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSubject::Partner(id) => write!(f, "partner:{}", id),
            RateSubject::EarnRule(id) => write!(f, "earn-rule:{}", id),
            RateSubject::SpendRule(id) => write!(f, "spend-rule:{}", id),
            RateSubject::Condition(id) => write!(f, "condition:{}", id),
        }
    }
}

/// Request for a conversion rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    pub subject: RateSubject,
    pub customer_id: CustomerId,
    pub from: Currency,
    pub to: Currency,
}

impl RateRequest {
    /// Create a new rate request.
    pub fn new(
        subject: RateSubject,
        customer_id: CustomerId,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
    ) -> Self {
        Self {
            subject,
            customer_id,
            from: from.into(),
            to: to.into(),
        }
    }

    /// Whether both sides name the same currency.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

/// A resolved conversion rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Units of `to` per unit of `from`.
    pub rate: Decimal,
    pub source: ConversionSource,
    pub subject: RateSubject,
    /// Spend rule the rate came from, when one is known.
    pub spend_rule_id: Option<BurnRuleId>,
    pub customer_id: CustomerId,
    pub from: Currency,
    pub to: Currency,
    pub resolved_at: DateTime<Utc>,
}

impl RateQuote {
    /// Create a new quote.
    pub fn new(request: &RateRequest, rate: Decimal, source: ConversionSource) -> Self {
        Self {
            rate,
            source,
            subject: request.subject,
            spend_rule_id: request.subject.spend_rule_id(),
            customer_id: request.customer_id,
            from: request.from.clone(),
            to: request.to.clone(),
            resolved_at: Utc::now(),
        }
    }

    /// Quote for a request whose currencies are the same.
    pub fn identity(request: &RateRequest) -> Self {
        Self::new(request, Decimal::ONE, request.subject.default_source())
    }

    /// Record the spend rule the rate came from.
    pub fn with_spend_rule(mut self, spend_rule_id: Option<BurnRuleId>) -> Self {
        if spend_rule_id.is_some() {
            self.spend_rule_id = spend_rule_id;
        }
        self
    }
}

/// An amount converted at a resolved rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountConversion {
    /// Converted amount, in `currency`.
    pub amount: Decimal,
    pub currency: Currency,
    pub used_rate: Decimal,
    /// Source of the rate that was applied.
    pub source: ConversionSource,
    pub subject: RateSubject,
    pub spend_rule_id: Option<BurnRuleId>,
    pub customer_id: CustomerId,
    pub resolved_at: DateTime<Utc>,
}

impl AmountConversion {
    /// Attach a converted amount to the quote it was computed from.
    pub fn from_quote(quote: RateQuote, amount: Decimal) -> Self {
        Self {
            amount,
            currency: quote.to,
            used_rate: quote.rate,
            source: quote.source,
            subject: quote.subject,
            spend_rule_id: quote.spend_rule_id,
            customer_id: quote.customer_id,
            resolved_at: quote.resolved_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_identity_request_is_case_insensitive() {
        let request = RateRequest::new(RateSubject::Partner(PartnerId::new()), CustomerId::new(), "usd", "USD");
        assert!(request.is_identity());

        let quote = RateQuote::identity(&request);
        assert_eq!(quote.rate, Decimal::ONE);
        assert_eq!(quote.source, ConversionSource::Partner);
    }

    #[test]
    fn test_spend_rule_subject_is_traced() {
        let id = BurnRuleId::new();
        let request = RateRequest::new(RateSubject::SpendRule(id), CustomerId::new(), "MVN", "USD");

        let quote = RateQuote::new(&request, dec!(2), ConversionSource::Global);

        assert_eq!(quote.spend_rule_id, Some(id));
        assert_eq!(request.subject.default_source(), ConversionSource::BurnRule);
    }

    #[test]
    fn test_amount_conversion_keeps_quote_source() {
        let request = RateRequest::new(RateSubject::EarnRule(EarnRuleId::new()), CustomerId::new(), "USD", "MVN");
        let quote = RateQuote::new(&request, dec!(0.2), ConversionSource::Global);

        let converted = AmountConversion::from_quote(quote, dec!(20));

        assert_eq!(converted.source, ConversionSource::Global);
        assert_eq!(converted.currency, Currency::new("MVN"));
        assert_eq!(converted.used_rate, dec!(0.2));
    }

    #[test]
    fn test_subject_serializes_with_kind() {
        let id = ConditionId::from_uuid(uuid::Uuid::nil());
        let json = serde_json::to_value(RateSubject::Condition(id)).unwrap();

        assert_eq!(json["kind"], "Condition");
        assert_eq!(json["id"], uuid::Uuid::nil().to_string());
    }
}
