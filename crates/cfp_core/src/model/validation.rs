//! Field-level validation shared by all catalog records.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NAME_MAX_CHARS: usize = 250;
pub const TYPE_NAME_MAX_CHARS: usize = 100;
pub const ACRONYM_MAX_CHARS: usize = 20;
pub const URL_MAX_CHARS: usize = 200;
pub const THEME_MAX_CHARS: usize = 500;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));
static COUNTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}$").expect("valid country regex"));

/// Validation failure for one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text is empty after trim.
    Blank { field: &'static str },
    /// Text exceeds the column limit.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Non-empty URL is not an absolute http(s) URL.
    InvalidUrl { field: &'static str, value: String },
    /// Country is not an ISO 3166-1 alpha-2 code.
    InvalidCountry(String),
    /// Range end precedes range start.
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "`{field}` must not be blank"),
            Self::TooLong { field, max, actual } => {
                write!(f, "`{field}` is {actual} chars long; at most {max} allowed")
            }
            Self::InvalidUrl { field, value } => {
                write!(f, "`{field}` must be an http(s) URL, got `{value}`")
            }
            Self::InvalidCountry(value) => {
                write!(f, "country must be an ISO 3166-1 alpha-2 code, got `{value}`")
            }
            Self::EndBeforeStart { start, end } => {
                write!(f, "end date {end} is earlier than start date {start}")
            }
        }
    }
}

impl Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Requires non-blank text within `max` chars.
pub fn required_text(field: &'static str, value: &str, max: usize) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    max_len(field, value, max)
}

/// Allows empty text, bounded by `max` chars.
pub fn max_len(field: &'static str, value: &str, max: usize) -> ValidationResult {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Allows empty text; otherwise requires an absolute http(s) URL.
pub fn optional_url(field: &'static str, value: &str) -> ValidationResult {
    if value.is_empty() {
        return Ok(());
    }
    max_len(field, value, URL_MAX_CHARS)?;
    if !URL_RE.is_match(value) {
        return Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Requires an upper-case ISO 3166-1 alpha-2 code.
pub fn country_code(value: &str) -> ValidationResult {
    if COUNTRY_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCountry(value.to_string()))
    }
}

/// Trims and upper-cases a country code before validation.
pub fn normalize_country(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_whitespace() {
        assert_eq!(
            required_text("name", "   ", NAME_MAX_CHARS),
            Err(ValidationError::Blank { field: "name" })
        );
    }

    #[test]
    fn max_len_counts_chars_not_bytes() {
        assert!(max_len("acronym", "ÉÉÉÉÉ", 5).is_ok());
        assert!(matches!(
            max_len("acronym", "ÉÉÉÉÉÉ", 5),
            Err(ValidationError::TooLong { actual: 6, .. })
        ));
    }

    #[test]
    fn optional_url_accepts_empty_and_http() {
        assert!(optional_url("website", "").is_ok());
        assert!(optional_url("website", "https://icse-conferences.org/").is_ok());
        assert!(optional_url("website", "HTTP://example.com/cfp?id=1").is_ok());
        assert!(matches!(
            optional_url("website", "ftp://example.com"),
            Err(ValidationError::InvalidUrl { .. })
        ));
        assert!(matches!(
            optional_url("website", "example.com"),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn country_code_requires_two_upper_letters() {
        assert!(country_code("CH").is_ok());
        assert!(country_code("ch").is_err());
        assert!(country_code("CHE").is_err());
        assert_eq!(normalize_country(" ch "), "CH");
    }
}
