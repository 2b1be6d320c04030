use crate::utils::error::{QuoteError, Result};
use rust_decimal::Decimal;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(QuoteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(QuoteError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(QuoteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(QuoteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(QuoteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_amount(field_name: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(QuoteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be greater than zero".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_negative_amount(field_name: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() {
        return Err(QuoteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be negative".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(QuoteError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_email(field_name: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(QuoteError::validation(
            field_name,
            format!("'{}' is not a valid email address", trimmed),
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(QuoteError::validation(
            field_name,
            format!("Value {} must be between {} and {}", value, min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("supabase.url", "https://example.supabase.co").is_ok());
        assert!(validate_url("supabase.url", "http://localhost:54321").is_ok());
        assert!(validate_url("supabase.url", "").is_err());
        assert!(validate_url("supabase.url", "invalid-url").is_err());
        assert!(validate_url("supabase.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_positive_amount("rates.onetime_cleaning", dec!(6.00)).is_ok());
        assert!(validate_positive_amount("rates.onetime_cleaning", dec!(0)).is_err());
        assert!(validate_non_negative_amount("anodes.labor_per_unit", dec!(0)).is_ok());
        assert!(validate_non_negative_amount("anodes.labor_per_unit", dec!(-1)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("customer_email", "skipper@example.com").is_ok());
        assert!(validate_email("customer_email", "skipper@localhost").is_err());
        assert!(validate_email("customer_email", "@example.com").is_err());
        assert!(validate_email("customer_email", "no-at-sign").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("growth.slider", 50u8, 0, 100).is_ok());
        assert!(validate_range("growth.slider", 101u8, 0, 100).is_err());
    }
}
