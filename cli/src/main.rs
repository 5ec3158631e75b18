//! TokenRate CLI
//!
//! Resolves conversion rates and converts amounts against a snapshot of
//! upstream campaign, partner and currency-rate data.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use tokenrate_common::{BurnRuleId, ConditionId, Currency, CustomerId, EarnRuleId, PartnerId};
use tokenrate_engine::{ConversionRateService, EngineConfig, RateRequest, RateSubject};

mod snapshot;

use snapshot::Snapshot;

/// TokenRate CLI
#[derive(Parser, Debug)]
#[command(name = "tokenrate")]
#[command(about = "Loyalty token conversion rate resolution")]
struct Cli {
    /// Snapshot of upstream data (JSON)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Token currency code (overrides TOKEN_CURRENCY)
    #[arg(long)]
    token_currency: Option<String>,

    /// Base fiat currency code (overrides BASE_FIAT_CURRENCY)
    #[arg(long)]
    base_fiat_currency: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a conversion rate
    Rate(Target),
    /// Convert an amount
    Convert {
        #[command(flatten)]
        target: Target,

        /// Amount in the source currency
        #[arg(short, long)]
        amount: Decimal,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// Entity the rate is resolved against
    #[arg(short, long, value_enum)]
    kind: Kind,

    /// Id of the partner, rule or condition
    #[arg(long)]
    id: Uuid,

    /// Customer the request is made for
    #[arg(long)]
    customer: Option<Uuid>,

    /// Source currency code
    #[arg(long)]
    from: String,

    /// Target currency code
    #[arg(long)]
    to: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Partner,
    EarnRule,
    SpendRule,
    Condition,
}

impl Target {
    fn request(&self) -> RateRequest {
        let subject = match self.kind {
            Kind::Partner => RateSubject::Partner(PartnerId::from_uuid(self.id)),
            Kind::EarnRule => RateSubject::EarnRule(EarnRuleId::from_uuid(self.id)),
            Kind::SpendRule => RateSubject::SpendRule(BurnRuleId::from_uuid(self.id)),
            Kind::Condition => RateSubject::Condition(ConditionId::from_uuid(self.id)),
        };
        let customer_id = self.customer.map(CustomerId::from_uuid).unwrap_or_default();

        RateRequest::new(subject, customer_id, self.from.as_str(), self.to.as_str())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(token) = &cli.token_currency {
        config.anchor.token_currency = Currency::new(token);
    }
    if let Some(fiat) = &cli.base_fiat_currency {
        config.anchor.base_fiat_currency = Currency::new(fiat);
    }

    init_logging(&config.log_level, cli.json_logs);

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    info!(
        token_currency = %config.anchor.token_currency,
        base_fiat_currency = %config.anchor.base_fiat_currency,
        "Starting TokenRate"
    );

    let providers = Snapshot::load(&cli.snapshot)?.into_providers();
    let service = ConversionRateService::with_providers(&config, providers);

    match &cli.command {
        Command::Rate(target) => {
            let quote = service.quote(&target.request()).await?;
            print_json(&quote)
        }
        Command::Convert { target, amount } => {
            let conversion = service.convert(&target.request(), *amount).await?;
            print_json(&conversion)
        }
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}
