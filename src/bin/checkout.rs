use clap::Parser;
use dive_quote::core::checkout::{apply_quote, sanitize_form, validate_estimate};
use dive_quote::domain::model::{CheckoutForm, QuoteInput};
use dive_quote::utils::error::QuoteError;
use dive_quote::utils::money::format_usd;
use dive_quote::utils::{logger, validation::Validate};
use dive_quote::{load_catalog, AnodeCatalog, CheckoutService, PricingEngine, TomlConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "checkout")]
#[command(about = "Submit a customer checkout to the payment function")]
struct Args {
    /// Checkout form JSON (camelCase fields, as the booking page sends them)
    form: PathBuf,

    /// Quote input JSON; when given the estimate is priced here
    #[arg(long)]
    quote_input: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    log_json: bool,

    /// Validate the form without contacting the payment function
    #[arg(long)]
    dry_run: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, QuoteError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn run(args: &Args, settings: &TomlConfig) -> Result<(), QuoteError> {
    let rates = settings.rate_card()?;
    let mut form: CheckoutForm = read_json(&args.form)?;

    if let Some(path) = &args.quote_input {
        let input: QuoteInput = read_json(path)?;
        let catalog = if input.anode_selections.is_empty() {
            AnodeCatalog::default()
        } else {
            load_catalog(settings).await?
        };
        let quote = PricingEngine::new(rates.clone()).calculate(&input, &catalog)?;
        apply_quote(&mut form, &quote, settings.wizard_rounding());
        tracing::info!("Priced {} at {}", quote.service_name, format_usd(form.estimate));
    }

    if args.dry_run {
        sanitize_form(&mut form);
        validate_estimate(&rates, &form)?;
        println!("🔍 DRY RUN: form is valid");
        println!("  Service: {} ({})", form.service, form.service_interval);
        println!("  Estimate: {}", format_usd(form.estimate));
        return Ok(());
    }

    let service = CheckoutService::new(settings.supabase_client()?, rates, settings.rate_limiter());
    let session = service.submit(form).await?;

    println!("✅ Order {} created", session.order_number);
    println!("  Order id: {}", session.order_id);
    println!("  Intent: {:?}", session.intent_type);
    println!("  Client secret: {}", session.client_secret);
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
            "❌ Checkout failed: {} (Category: {:?}, Severity: {:?})",
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
