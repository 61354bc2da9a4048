//! Shared validation helpers for command line inputs
//!
//! Every command validates its period and URL arguments before touching the
//! network or the filesystem.
//!
//! # Examples
//!
//! ```
//! use eu_state_aids::utils::{validate_year, validate_year_month};
//!
//! assert_eq!(validate_year("2015").unwrap(), 2015);
//! assert!(validate_year("2009").is_err());
//! assert_eq!(validate_year_month("2019_03").unwrap(), (2019, 3));
//! ```

use thiserror::Error;
use url::Url;

pub const MIN_YEAR: i32 = 2010;
pub const MAX_YEAR: i32 = 2050;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid year: {0}. Use a year between 2010 and 2050")]
    Year(String),

    #[error("Invalid year, month value: {0}. Use YYYY or YYYY_MM")]
    YearMonth(String),

    #[error("No source file is published for year {0}")]
    UnsupportedYear(i32),

    #[error("Invalid URL {url}: {reason}")]
    Url { url: String, reason: String },
}

/// Validate a year given as text; accepted range is 2010..=2050
pub fn validate_year(value: &str) -> Result<i32, ValidationError> {
    let year: i32 = value
        .trim()
        .parse()
        .map_err(|_| ValidationError::Year(value.to_string()))?;

    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(ValidationError::Year(value.to_string()))
    }
}

/// Validate a `YYYY_MM` value, returning the year and the month (1-12)
pub fn validate_year_month(value: &str) -> Result<(i32, u32), ValidationError> {
    let invalid = || ValidationError::YearMonth(value.to_string());

    let (year, month) = value.trim().split_once('_').ok_or_else(invalid)?;
    let year = validate_year(year).map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;

    if (1..=12).contains(&month) {
        Ok((year, month))
    } else {
        Err(invalid())
    }
}

/// Validate a remote source URL (absolute, http or https, with a host)
pub fn validate_url(value: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: &str| ValidationError::Url {
        url: value.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(value).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(url)
}
