pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use args::{AnodeArgs, CliConfig, Command, ListQuotesArgs, QuoteArgs};

#[cfg(feature = "cli")]
mod args {
    use crate::core::catalog::{AnodeFilter, ShaftSize};
    use crate::core::quote::{QuoteContact, DEFAULT_VALID_DAYS};
    use crate::domain::model::{
        CleanedAge, CleaningHistory, GrowthInput, GrowthLevel, HullType, PaintAge,
        PaintCondition, QuoteFilter, QuoteInput, QuoteStatus, ServiceKey,
    };
    use crate::utils::error::{QuoteError, Result};
    use crate::utils::money::RoundingPolicy;
    use crate::utils::validation::{validate_range, Validate};
    use chrono::NaiveDate;
    use clap::{Args, Parser, Subcommand};
    use rust_decimal::Decimal;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "dive-quote")]
    #[command(about = "Price hull cleaning and diving jobs, browse anodes, look up quotes")]
    pub struct CliConfig {
        /// Path to TOML configuration file (defaults to ./dive-quote.toml if present)
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        /// Emit logs as JSON lines
        #[arg(long, global = true)]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Price a job and print the breakdown
        Quote(QuoteArgs),
        /// List anodes from the catalog
        Anodes(AnodeArgs),
        /// Show the service rate card
        Services,
        /// Fetch a saved quote by number
        FindQuote {
            quote_number: String,
            /// Stamp the quote as viewed by the customer if it is not yet
            #[arg(long)]
            mark_viewed: bool,
        },
        /// Set a saved quote's status (accepted, rejected, ...)
        SetQuoteStatus {
            quote_number: String,
            status: QuoteStatus,
        },
        /// List saved quotes, newest first
        ListQuotes(ListQuotesArgs),
        /// Search customers by name or email
        Customers { term: String },
    }

    #[derive(Debug, Clone, Args)]
    pub struct QuoteArgs {
        /// Read the whole quote input from a JSON file instead of flags
        #[arg(long)]
        pub input: Option<PathBuf>,

        #[arg(long, default_value = "onetime_cleaning")]
        pub service: ServiceKey,

        /// Boat length in feet
        #[arg(long)]
        pub length: Option<Decimal>,

        #[arg(long, default_value = "monohull")]
        pub hull: HullType,

        #[arg(long)]
        pub powerboat: bool,

        #[arg(long)]
        pub twin_engines: bool,

        #[arg(long, default_value = "good")]
        pub paint: PaintCondition,

        /// Diver's growth slider, 0-100
        #[arg(long, conflicts_with_all = ["growth_level", "last_painted"])]
        pub growth_slider: Option<u8>,

        #[arg(long, conflicts_with = "last_painted")]
        pub growth_level: Option<GrowthLevel>,

        /// e.g. 7-12_months; estimates growth together with --last-cleaned
        #[arg(long, value_parser = parse_wizard_value::<PaintAge>, requires = "last_cleaned")]
        pub last_painted: Option<PaintAge>,

        /// e.g. over_24_months_unsure
        #[arg(long, value_parser = parse_wizard_value::<CleanedAge>, requires = "last_painted")]
        pub last_cleaned: Option<CleanedAge>,

        /// Anode to install, as ID or ID=QTY; repeatable
        #[arg(long = "anode", value_parser = parse_anode_selection)]
        pub anodes: Vec<(String, u32)>,

        /// Units for flat-rate services, e.g. propellers
        #[arg(long, default_value_t = 1)]
        pub units: u32,

        /// Rounding applied to the displayed total (none, nearest_ten)
        #[arg(long)]
        pub round: Option<RoundingPolicy>,

        /// Print the quote as JSON
        #[arg(long)]
        pub json: bool,

        /// Save the quote to Supabase; requires --customer-name
        #[arg(long, requires = "customer_name")]
        pub save: bool,

        #[arg(long)]
        pub customer_name: Option<String>,

        #[arg(long)]
        pub customer_email: Option<String>,

        #[arg(long)]
        pub customer_phone: Option<String>,

        #[arg(long)]
        pub boat_name: Option<String>,

        #[arg(long)]
        pub boat_make: Option<String>,

        #[arg(long)]
        pub marina: Option<String>,

        #[arg(long)]
        pub slip: Option<String>,

        #[arg(long, default_value_t = DEFAULT_VALID_DAYS)]
        pub valid_days: u32,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct AnodeArgs {
        /// shaft, prop, hull, engine or a raw category
        #[arg(long)]
        pub category: Option<String>,

        #[arg(long)]
        pub material: Option<String>,

        #[arg(long)]
        pub shaft_size: Option<ShaftSize>,

        #[arg(long)]
        pub search: Option<String>,

        /// Write the listing as CSV to this path
        #[arg(long)]
        pub csv: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct ListQuotesArgs {
        #[arg(long)]
        pub email: Option<String>,

        #[arg(long)]
        pub status: Option<QuoteStatus>,

        /// Created on or after, YYYY-MM-DD
        #[arg(long)]
        pub from: Option<NaiveDate>,

        /// Created on or before, YYYY-MM-DD
        #[arg(long)]
        pub to: Option<NaiveDate>,
    }

    impl ListQuotesArgs {
        pub fn filter(&self) -> QuoteFilter {
            QuoteFilter {
                customer_email: self.email.clone(),
                status: self.status,
                from_date: self.from,
                to_date: self.to,
            }
        }
    }

    /// Wizard values use their serialized names, e.g. `13-21_months`.
    fn parse_wizard_value<T: serde::de::DeserializeOwned>(
        raw: &str,
    ) -> std::result::Result<T, String> {
        serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
            .map_err(|_| format!("'{}' is not a recognised choice", raw))
    }

    fn parse_anode_selection(raw: &str) -> std::result::Result<(String, u32), String> {
        match raw.split_once('=') {
            Some((id, qty)) => {
                let qty: u32 = qty
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid quantity in '{}'", raw))?;
                if qty == 0 {
                    return Err(format!("quantity must be at least 1 in '{}'", raw));
                }
                Ok((id.trim().to_string(), qty))
            }
            None => Ok((raw.trim().to_string(), 1)),
        }
    }

    impl QuoteArgs {
        fn growth(&self) -> GrowthInput {
            match (
                self.growth_slider,
                self.growth_level,
                self.last_painted,
                self.last_cleaned,
            ) {
                (Some(slider), _, _, _) => GrowthInput::Slider(slider),
                (_, Some(level), _, _) => GrowthInput::Level(level),
                (_, _, Some(last_painted), Some(last_cleaned)) => {
                    GrowthInput::Estimated(CleaningHistory {
                        last_painted,
                        last_cleaned,
                    })
                }
                _ => GrowthInput::default(),
            }
        }

        /// Builds the input from flags. `--input` files are read by the caller.
        pub fn to_input(&self) -> QuoteInput {
            let mut input = QuoteInput::new(self.service)
                .with_hull(self.hull)
                .with_powerboat(self.powerboat)
                .with_twin_engines(self.twin_engines)
                .with_paint(self.paint)
                .with_growth(self.growth())
                .with_units(self.units);
            if let Some(length) = self.length {
                input = input.with_length(length);
            }
            for (id, qty) in &self.anodes {
                input = input.with_anode(id.clone(), *qty);
            }
            input
        }

        /// `--round` wins over the configured wizard rounding.
        pub fn rounding(&self, configured: RoundingPolicy) -> RoundingPolicy {
            self.round.unwrap_or(configured)
        }

        pub fn contact(&self) -> Option<QuoteContact> {
            let name = self.customer_name.clone()?;
            Some(QuoteContact {
                name,
                email: self.customer_email.clone(),
                phone: self.customer_phone.clone(),
                boat_name: self.boat_name.clone(),
                boat_make: self.boat_make.clone(),
                marina: self.marina.clone(),
                slip: self.slip.clone(),
            })
        }
    }

    impl AnodeArgs {
        pub fn filter(&self) -> AnodeFilter {
            AnodeFilter {
                category: self.category.clone(),
                material: self.material.clone(),
                shaft_size: self.shaft_size,
                search: self.search.clone(),
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if let Command::Quote(args) = &self.command {
                if let Some(length) = args.length {
                    if length <= Decimal::ZERO {
                        return Err(QuoteError::validation(
                            "length",
                            "boat length must be positive",
                        ));
                    }
                }
                if let Some(slider) = args.growth_slider {
                    validate_range("growth_slider", slider, 0, 100)?;
                }
                validate_range("valid_days", args.valid_days, 1, 365)?;
            }
            if let Command::ListQuotes(args) = &self.command {
                if let (Some(from), Some(to)) = (args.from, args.to) {
                    if from > to {
                        return Err(QuoteError::validation("from", "--from is after --to"));
                    }
                }
            }
            Ok(())
        }
    }

}
