//! TokenRate Engine
//!
//! Conversion rate resolution for a loyalty-token economy.
//!
//! # Features
//!
//! - Rate source resolution across burn rules, partners, earn rules and
//!   conditions, falling back to the global token rate
//! - Market-rate graph search between fiat currencies
//! - Fixed-point rate arithmetic at token precision
//!
//! # Example
//!
//! ```rust,ignore
//! use tokenrate_engine::{ConversionRateService, EngineConfig, InMemoryProviders};
//! use tokenrate_common::{CustomerId, PartnerId, RatePair};
//!
//! let providers = Arc::new(InMemoryProviders::new(RatePair::new(dec!(1), dec!(10))));
//! let service = ConversionRateService::with_providers(&EngineConfig::default(), providers);
//!
//! let quote = service
//!     .optimal_rate_by_partner(PartnerId::new(), CustomerId::new(), "MVN", "USD")
//!     .await?;
//! ```

pub mod calculator;
pub mod config;
pub mod conversion;
pub mod error;
pub mod graph;
pub mod memory;
pub mod provider;
pub mod resolver;
pub mod service;

pub use calculator::RateCalculator;
pub use config::{AnchorCurrencies, EngineConfig};
pub use conversion::{AmountConversion, RateQuote, RateRequest, RateSubject};
pub use error::{RateError, RateResult};
pub use graph::{Direction, RateGraph};
pub use memory::InMemoryProviders;
pub use provider::{CampaignProvider, CurrencyRateProvider, PartnerProvider};
pub use resolver::{RateSourceResolver, ResolvedRate};
pub use service::ConversionRateService;
