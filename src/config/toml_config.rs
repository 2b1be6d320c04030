use crate::adapters::SupabaseClient;
use crate::core::checkout::RateLimiter;
use crate::core::rates::{GrowthBand, RateCard, SurchargeRates};
use crate::domain::model::ServiceKey;
use crate::utils::error::{QuoteError, Result};
use crate::utils::money::RoundingPolicy;
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "dive-quote.toml";

/// Every section is optional; missing sections fall back to the
/// published price list and local-only operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub rates: Option<RatesConfig>,
    pub surcharges: Option<SurchargeRates>,
    pub growth: Option<GrowthConfig>,
    pub anodes: Option<AnodesConfig>,
    pub rounding: Option<RoundingConfig>,
    pub supabase: Option<SupabaseConfig>,
    pub checkout: Option<CheckoutConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatesConfig {
    pub minimum_charge: Option<Decimal>,
    /// Keyed by service key, e.g. `[rates.services.onetime_cleaning]`.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceOverride>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceOverride {
    pub name: Option<String>,
    pub rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrowthConfig {
    #[serde(default)]
    pub bands: Vec<GrowthBand>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnodesConfig {
    pub labor_per_unit: Option<Decimal>,
    /// Local catalog JSON. When unset the catalog is read from Supabase.
    pub catalog_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundingConfig {
    pub wizard: Option<RoundingPolicy>,
    pub admin: Option<RoundingPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub max_requests: Option<u32>,
    pub window_minutes: Option<u64>,
}

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"))
}

fn unresolved(value: &str) -> bool {
    value.trim().is_empty() || value.contains("${")
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| QuoteError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are
    /// left in place so the consumer can report them as missing.
    fn substitute_env_vars(content: &str) -> String {
        env_var_regex()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// Explicit path, else `dive-quote.toml` in the working directory,
    /// else built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                tracing::debug!("No {} found, using built-in rates", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// Built-in rate card with the file's overrides applied.
    pub fn rate_card(&self) -> Result<RateCard> {
        let mut card = RateCard::default();

        if let Some(rates) = &self.rates {
            if let Some(minimum) = rates.minimum_charge {
                card.minimum_charge = minimum;
            }
            for (key, override_) in &rates.services {
                let key: ServiceKey = key.parse()?;
                let service = card.services.get_mut(&key).ok_or_else(|| {
                    QuoteError::UnknownService {
                        key: key.to_string(),
                    }
                })?;
                if let Some(name) = &override_.name {
                    service.name = name.clone();
                }
                if let Some(rate) = override_.rate {
                    service.rate = rate;
                }
            }
        }
        if let Some(surcharges) = &self.surcharges {
            card.surcharges = surcharges.clone();
        }
        if let Some(growth) = &self.growth {
            if !growth.bands.is_empty() {
                card.growth_bands = growth.bands.clone();
            }
        }
        if let Some(labor) = self.anodes.as_ref().and_then(|a| a.labor_per_unit) {
            card.anode_labor_per_unit = labor;
        }

        card.validate()?;
        Ok(card)
    }

    pub fn catalog_path(&self) -> Option<&str> {
        self.anodes.as_ref().and_then(|a| a.catalog_path.as_deref())
    }

    pub fn wizard_rounding(&self) -> RoundingPolicy {
        self.rounding
            .as_ref()
            .and_then(|r| r.wizard)
            .unwrap_or(RoundingPolicy::None)
    }

    pub fn admin_rounding(&self) -> RoundingPolicy {
        self.rounding
            .as_ref()
            .and_then(|r| r.admin)
            .unwrap_or(RoundingPolicy::NearestTen)
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        let checkout = self.checkout.clone().unwrap_or_default();
        RateLimiter::new(
            checkout.max_requests.unwrap_or(5),
            Duration::from_secs(checkout.window_minutes.unwrap_or(15) * 60),
        )
    }

    pub fn supabase_client(&self) -> Result<SupabaseClient> {
        let supabase = self
            .supabase
            .as_ref()
            .ok_or_else(|| QuoteError::MissingConfigError {
                field: "supabase".to_string(),
            })?;
        if unresolved(&supabase.url) {
            return Err(QuoteError::MissingConfigError {
                field: "supabase.url".to_string(),
            });
        }
        if unresolved(&supabase.anon_key) {
            return Err(QuoteError::MissingConfigError {
                field: "supabase.anon_key".to_string(),
            });
        }
        validate_url("supabase.url", &supabase.url)?;

        let client = SupabaseClient::new(&supabase.url, &supabase.anon_key);
        Ok(match supabase.timeout_seconds {
            Some(seconds) => client.with_timeout(seconds),
            None => client,
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.rate_card()?;

        if let Some(path) = self.catalog_path() {
            validate_path("anodes.catalog_path", path)?;
        }
        // Unresolved placeholders are only an error once Supabase is used.
        if let Some(supabase) = &self.supabase {
            if !unresolved(&supabase.url) {
                validate_url("supabase.url", &supabase.url)?;
            }
        }
        if let Some(checkout) = &self.checkout {
            if let Some(max) = checkout.max_requests {
                validate_range("checkout.max_requests", max, 1, 1000)?;
            }
            if let Some(minutes) = checkout.window_minutes {
                validate_range("checkout.window_minutes", minutes, 1, 24 * 60)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        let card = config.rate_card().unwrap();

        assert_eq!(card, RateCard::default());
        assert_eq!(config.wizard_rounding(), RoundingPolicy::None);
        assert_eq!(config.admin_rounding(), RoundingPolicy::NearestTen);
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.supabase_client(),
            Err(QuoteError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_rate_overrides() {
        let config = TomlConfig::from_toml_str(
            r#"
[rates]
minimum_charge = 175

[rates.services.onetime_cleaning]
rate = 6.5

[surcharges]
catamaran = 30

[anodes]
labor_per_unit = 20

[rounding]
admin = "none"
"#,
        )
        .unwrap();
        let card = config.rate_card().unwrap();

        assert_eq!(card.minimum_charge, dec!(175));
        assert_eq!(card.service(ServiceKey::OnetimeCleaning).unwrap().rate, dec!(6.5));
        assert_eq!(card.surcharges.catamaran, dec!(30));
        // Fields missing from a section keep their defaults.
        assert_eq!(card.surcharges.trimaran, dec!(50));
        assert_eq!(card.anode_labor_per_unit, dec!(20));
        assert_eq!(config.admin_rounding(), RoundingPolicy::None);
    }

    #[test]
    fn test_unknown_service_override_fails() {
        let config = TomlConfig::from_toml_str(
            r#"
[rates.services.hull_polish]
rate = 3
"#,
        )
        .unwrap();
        assert!(matches!(
            config.rate_card(),
            Err(QuoteError::UnknownService { .. })
        ));
    }

    #[test]
    fn test_growth_bands_must_cover_slider() {
        let config = TomlConfig::from_toml_str(
            r#"
[[growth.bands]]
upto = 50
label = "Light"
percent = 0

[[growth.bands]]
upto = 90
label = "Heavy"
percent = 50
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DIVE_QUOTE_TEST_SUPABASE_KEY", "anon-key");

        let config = TomlConfig::from_toml_str(
            r#"
[supabase]
url = "https://proj.supabase.co"
anon_key = "${DIVE_QUOTE_TEST_SUPABASE_KEY}"
timeout_seconds = 10
"#,
        )
        .unwrap();
        assert_eq!(config.supabase.as_ref().unwrap().anon_key, "anon-key");
        let client = config.supabase_client().unwrap();
        assert_eq!(client.base_url(), "https://proj.supabase.co");

        std::env::remove_var("DIVE_QUOTE_TEST_SUPABASE_KEY");
    }

    #[test]
    fn test_unset_env_var_is_missing_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[supabase]
url = "https://proj.supabase.co"
anon_key = "${DIVE_QUOTE_TEST_UNSET_VARIABLE}"
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.supabase_client(),
            Err(QuoteError::MissingConfigError { field }) if field == "supabase.anon_key"
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                b"[anodes]\ncatalog_path = \"anodes.json\"\n\n[checkout]\nmax_requests = 3\n",
            )
            .unwrap();

        let config = TomlConfig::load_or_default(Some(temp_file.path())).unwrap();
        assert_eq!(config.catalog_path(), Some("anodes.json"));
        assert!(config.validate().is_ok());
    }
}
