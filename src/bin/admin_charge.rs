use clap::Parser;
use dive_quote::core::charge::prepare_charge;
use dive_quote::domain::model::QuoteInput;
use dive_quote::utils::error::QuoteError;
use dive_quote::utils::money::format_usd;
use dive_quote::utils::{logger, validation::Validate};
use dive_quote::{
    load_catalog, AnodeCatalog, ChargeAmount, ChargeService, PricingEngine, TomlConfig,
};
use rust_decimal::Decimal;
use std::path::PathBuf;

const TOKEN_ENV: &str = "DIVE_QUOTE_ACCESS_TOKEN";

#[derive(Parser)]
#[command(name = "admin-charge")]
#[command(about = "Charge a customer's saved card for a completed job")]
struct Args {
    /// Order id from the checkout
    order_id: String,

    /// Final amount in dollars
    #[arg(long, conflicts_with = "quote_input", required_unless_present = "quote_input")]
    amount: Option<Decimal>,

    /// Price the job from a quote input JSON instead of --amount
    #[arg(long)]
    quote_input: Option<PathBuf>,

    #[arg(long, default_value = "")]
    notes: String,

    /// Staff session token; falls back to $DIVE_QUOTE_ACCESS_TOKEN
    #[arg(long)]
    token: Option<String>,

    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    log_json: bool,

    /// Show the request without charging
    #[arg(long)]
    dry_run: bool,
}

async fn resolve_amount(args: &Args, settings: &TomlConfig) -> Result<ChargeAmount, QuoteError> {
    match (&args.amount, &args.quote_input) {
        (Some(amount), _) => Ok(ChargeAmount::Explicit(*amount)),
        (None, Some(path)) => {
            let input: QuoteInput = serde_json::from_slice(&std::fs::read(path)?)?;
            let catalog = if input.anode_selections.is_empty() {
                AnodeCatalog::default()
            } else {
                load_catalog(settings).await?
            };
            let quote = PricingEngine::new(settings.rate_card()?).calculate(&input, &catalog)?;
            Ok(ChargeAmount::FromQuote(quote))
        }
        (None, None) => Err(QuoteError::validation(
            "amount",
            "pass --amount or --quote-input",
        )),
    }
}

async fn run(args: &Args, settings: &TomlConfig) -> Result<(), QuoteError> {
    let amount = resolve_amount(args, settings).await?;
    let rounding = settings.admin_rounding();

    if args.dry_run {
        let request = prepare_charge(&args.order_id, &amount, &args.notes, rounding)?;
        println!("🔍 DRY RUN: would charge {}", format_usd(request.final_amount));
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let token = args
        .token
        .clone()
        .or_else(|| std::env::var(TOKEN_ENV).ok())
        .ok_or_else(|| QuoteError::MissingConfigError {
            field: TOKEN_ENV.to_string(),
        })?;

    let service = ChargeService::new(settings.supabase_client()?, rounding);
    let receipt = service
        .charge(&args.order_id, &amount, &args.notes, &token)
        .await?;

    println!("✅ Charged {}", format_usd(receipt.amount_charged));
    println!("  Payment intent: {}", receipt.payment_intent_id);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(args.verbose, args.log_json);

    let settings = TomlConfig::load_or_default(args.config.as_deref())?;
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    if let Err(e) = run(&args, &settings).await {
        tracing::error!(
            "❌ Charge failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    Ok(())
}
