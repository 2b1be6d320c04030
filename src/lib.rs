pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::SupabaseClient;
pub use config::cli::{load_catalog, FileCatalog, LocalStorage};
pub use config::toml_config::TomlConfig;
pub use core::{
    catalog::{AnodeCatalog, AnodeFilter},
    charge::{ChargeAmount, ChargeService},
    checkout::{CheckoutService, RateLimiter},
    pricing::PricingEngine,
    rates::RateCard,
};
pub use utils::error::{QuoteError, Result};
