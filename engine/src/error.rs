//! Conversion engine error types.

use tokenrate_common::{BurnRuleId, ConditionId, Currency, EarnRuleId, PartnerId};
use thiserror::Error;

/// Errors that can occur while resolving a conversion rate.
///
/// All of them are terminal for the call that produced them.
#[derive(Debug, Error)]
pub enum RateError {
    /// Partner does not exist and no burn rule could stand in for it.
    #[error("Partner with id '{0}' cannot be found")]
    PartnerNotFound(PartnerId),

    /// Earn rule does not exist.
    #[error("Earn rule with id '{0}' cannot be found")]
    EarnRuleNotFound(EarnRuleId),

    /// Burn (spend) rule does not exist.
    #[error("Spend rule with id '{0}' cannot be found")]
    SpendRuleNotFound(BurnRuleId),

    /// Condition does not exist.
    #[error("Condition with id '{0}' cannot be found")]
    ConditionNotFound(ConditionId),

    /// No path through the market-rate graph.
    #[error("Currency rate from '{from}' to '{to}' cannot be found")]
    ConversionRateNotFound { from: Currency, to: Currency },

    /// A rate pair that cannot be used as a divisor, or arithmetic overflow.
    #[error("Invalid rate pair: {0}")]
    InvalidRatePair(String),

    /// An upstream collaborator failed.
    #[error("Rate provider error: {0}")]
    Provider(String),
}

impl RateError {
    /// Error code for the calling layer.
    pub fn error_code(&self) -> &'static str {
        match self {
            RateError::PartnerNotFound(_) => "PARTNER_NOT_FOUND",
            RateError::EarnRuleNotFound(_) => "EARN_RULE_NOT_FOUND",
            RateError::SpendRuleNotFound(_) => "SPEND_RULE_NOT_FOUND",
            RateError::ConditionNotFound(_) => "CONDITION_NOT_FOUND",
            RateError::ConversionRateNotFound { .. } => "CONVERSION_RATE_NOT_FOUND",
            RateError::InvalidRatePair(_) => "INVALID_RATE_PAIR",
            RateError::Provider(_) => "PROVIDER_ERROR",
        }
    }

    /// Whether the referenced entity is missing upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RateError::PartnerNotFound(_)
                | RateError::EarnRuleNotFound(_)
                | RateError::SpendRuleNotFound(_)
                | RateError::ConditionNotFound(_)
        )
    }

    pub(crate) fn rate_not_found(from: &Currency, to: &Currency) -> Self {
        RateError::ConversionRateNotFound {
            from: from.clone(),
            to: to.clone(),
        }
    }
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;
