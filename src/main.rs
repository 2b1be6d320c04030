use clap::Parser;
use dive_quote::config::cli::export_csv;
use dive_quote::config::{AnodeArgs, Command, ListQuotesArgs, QuoteArgs};
use dive_quote::core::quote::{build_record, open_quote};
use dive_quote::domain::model::{QuoteInput, QuoteRecord, QuoteStatus, ServiceKind};
use dive_quote::domain::ports::{CustomerDirectory, QuoteRepository};
use dive_quote::utils::money::{format_usd, RoundingPolicy};
use dive_quote::utils::{logger, validation::Validate};
use dive_quote::{
    load_catalog, AnodeCatalog, CliConfig, LocalStorage, PricingEngine, QuoteError, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init(config.verbose, config.log_json);
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Argument validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let settings = match TomlConfig::load_or_default(config.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    let result = match &config.command {
        Command::Quote(args) => run_quote(&settings, args).await,
        Command::Anodes(args) => run_anodes(&settings, args).await,
        Command::Services => show_services(&settings),
        Command::FindQuote {
            quote_number,
            mark_viewed,
        } => find_quote(&settings, quote_number, *mark_viewed).await,
        Command::SetQuoteStatus {
            quote_number,
            status,
        } => set_quote_status(&settings, quote_number, *status).await,
        Command::ListQuotes(args) => list_quotes(&settings, args).await,
        Command::Customers { term } => search_customers(&settings, term).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
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

fn read_input(args: &QuoteArgs) -> Result<QuoteInput, QuoteError> {
    match &args.input {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            Ok(serde_json::from_slice(&bytes)?)
        }
        None => Ok(args.to_input()),
    }
}

async fn run_quote(settings: &TomlConfig, args: &QuoteArgs) -> Result<(), QuoteError> {
    let input = read_input(args)?;
    let engine = PricingEngine::new(settings.rate_card()?);
    let catalog = if input.anode_selections.is_empty() {
        AnodeCatalog::default()
    } else {
        load_catalog(settings).await?
    };

    let quote = engine.calculate(&input, &catalog)?;
    let rounding = args.rounding(settings.wizard_rounding());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&quote)?);
    } else {
        println!("📋 {}", quote.service_name);
        for line in engine.breakdown_lines(&quote, true) {
            println!("  {}", line);
        }
        let rounded = rounding.apply(quote.total);
        if rounding != RoundingPolicy::None && rounded != quote.total {
            println!("  Rounded: {}", format_usd(rounded));
        }
    }

    if args.save {
        let contact = args
            .contact()
            .ok_or_else(|| QuoteError::validation("customer_name", "required to save a quote"))?;
        let today = chrono::Local::now().date_naive();
        let record = build_record(contact, &input, &quote, today, args.valid_days)?;
        let saved = settings.supabase_client()?.save_quote(&record).await?;
        println!(
            "✅ Saved {} (valid until {})",
            saved.quote_number, saved.expiry_date
        );
    }

    Ok(())
}

async fn run_anodes(settings: &TomlConfig, args: &AnodeArgs) -> Result<(), QuoteError> {
    let catalog = load_catalog(settings).await?;
    let filter = args.filter();

    if let Some(path) = &args.csv {
        let storage = LocalStorage::new(".".to_string());
        let count = export_csv(&storage, &path.to_string_lossy(), &catalog, &filter).await?;
        println!("✅ Wrote {} anodes to {}", count, path.display());
        return Ok(());
    }

    let mut count = 0;
    for anode in catalog.filter(&filter) {
        println!(
            "{:<14} {:>9}  {}",
            anode.id,
            format_usd(anode.list_price),
            dive_quote::core::catalog::simplify_name(&anode.name)
        );
        count += 1;
    }
    println!("📦 {} of {} anodes", count, catalog.len());
    Ok(())
}

fn show_services(settings: &TomlConfig) -> Result<(), QuoteError> {
    let rates = settings.rate_card()?;

    println!("📋 Services:");
    for (key, service) in &rates.services {
        let price = match service.kind {
            ServiceKind::PerFoot => format!("{}/ft", format_usd(service.rate)),
            ServiceKind::Flat => format!("{} flat", format_usd(service.rate)),
        };
        println!("  {:<22} {:<32} {}", key, service.name, price);
    }

    let s = &rates.surcharges;
    println!();
    println!("➕ Surcharges:");
    println!("  Catamaran +{}%, Trimaran +{}%", s.catamaran, s.trimaran);
    println!("  Powerboat +{}%, Twin engines +{}%", s.powerboat, s.twin_engines);
    println!("  Growth bands:");
    for band in &rates.growth_bands {
        println!("    up to {:>3}: {} (+{}%)", band.upto, band.label, band.percent);
    }
    println!();
    println!(
        "  Anode labor {} per unit, minimum charge {}",
        format_usd(rates.anode_labor_per_unit),
        format_usd(rates.minimum_charge)
    );
    Ok(())
}

async fn find_quote(
    settings: &TomlConfig,
    quote_number: &str,
    mark_viewed: bool,
) -> Result<(), QuoteError> {
    let client = settings.supabase_client()?;
    let found = if mark_viewed {
        open_quote(&client, quote_number, chrono::Utc::now()).await?
    } else {
        client.find_quote(quote_number).await?
    };
    match found {
        Some(record) => {
            print_quote(&record);
            println!("  Valid: {} to {}", record.quote_date, record.expiry_date);
            if let Some(viewed_at) = record.viewed_at {
                println!("  Viewed: {}", viewed_at.format("%Y-%m-%d %H:%M UTC"));
            }
            Ok(())
        }
        None => Err(QuoteError::validation(
            "quote_number",
            format!("no quote numbered {}", quote_number),
        )),
    }
}

async fn set_quote_status(
    settings: &TomlConfig,
    quote_number: &str,
    status: QuoteStatus,
) -> Result<(), QuoteError> {
    let record = settings
        .supabase_client()?
        .update_quote_status(quote_number, status)
        .await?;
    println!("✅ {} is now {}", record.quote_number, record.status);
    Ok(())
}

async fn list_quotes(settings: &TomlConfig, args: &ListQuotesArgs) -> Result<(), QuoteError> {
    let quotes = settings.supabase_client()?.list_quotes(&args.filter()).await?;
    if quotes.is_empty() {
        println!("No quotes match");
    }
    for record in &quotes {
        print_quote(record);
    }
    Ok(())
}

fn print_quote(record: &QuoteRecord) {
    let today = chrono::Local::now().date_naive();
    println!(
        "📄 {} ({})",
        record.quote_number,
        record.effective_status(today)
    );
    println!("  Customer: {}", record.customer_name);
    println!("  Service: {}", record.service_name);
    println!("  Total: {}", format_usd(record.total_cost));
}

async fn search_customers(settings: &TomlConfig, term: &str) -> Result<(), QuoteError> {
    let customers = settings.supabase_client()?.search_customers(term).await?;
    if customers.is_empty() {
        println!("No customers match '{}'", term);
    }
    for customer in customers {
        println!(
            "{:<38} {:<24} {}",
            customer.id,
            customer.name.as_deref().unwrap_or("-"),
            customer.email.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
