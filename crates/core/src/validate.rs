use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use validator::ValidateUrl;

use crate::domain::field::{FieldDefinition, FieldType, ValidationRules};

pub const REQUIRED_MESSAGE: &str = "This field is required";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%B %e, %Y"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    Accepted { value: String },
    Rejected { message: String },
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected { message: message.into() }
    }
}

/// Validate one submitted value against its field definition.
///
/// Every field is required: blank input fails before any type dispatch.
/// Type-specific checks run first and may canonicalize the value; the
/// generic `validation_rules` run afterwards in a fixed order, and the
/// first failing rule wins.
pub fn validate(field: &FieldDefinition, raw_value: &str) -> Validation {
    let trimmed = raw_value.trim();
    if trimmed.is_empty() {
        return Validation::rejected(REQUIRED_MESSAGE);
    }

    let normalized = match check_type(field, trimmed) {
        Ok(value) => value,
        Err(message) => return Validation::rejected(message),
    };

    if let Some(message) = check_rules(&field.validation_rules, &normalized) {
        return Validation::rejected(message);
    }

    Validation::Accepted { value: normalized }
}

fn check_type(field: &FieldDefinition, trimmed: &str) -> Result<String, String> {
    match field.field_type {
        FieldType::Email => {
            if EMAIL_PATTERN.is_match(trimmed) {
                Ok(trimmed.to_owned())
            } else {
                Err("Please enter a valid email address".to_owned())
            }
        }
        FieldType::Number => match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(format!("{value}")),
            _ => Err("Please enter a valid number".to_owned()),
        },
        FieldType::Select => Ok(match_select_option(field, trimmed)),
        FieldType::Checkbox => {
            let lowered = trimmed.to_ascii_lowercase();
            if matches!(lowered.as_str(), "yes" | "no" | "true" | "false" | "1" | "0") {
                Ok(trimmed.to_owned())
            } else {
                Err("Please answer yes or no".to_owned())
            }
        }
        FieldType::Date => {
            if parses_as_date(trimmed) {
                Ok(trimmed.to_owned())
            } else {
                Err("Please enter a valid date (for example 2026-01-31)".to_owned())
            }
        }
        FieldType::Url => {
            if trimmed.validate_url() {
                Ok(trimmed.to_owned())
            } else {
                Err("Please enter a valid URL".to_owned())
            }
        }
        FieldType::Text | FieldType::Multiselect | FieldType::Boolean => Ok(trimmed.to_owned()),
    }
}

/// Case-insensitive match canonicalizes to the option's stored casing. A
/// value outside the option list is accepted verbatim; the warning lets
/// product owners see how often the catalog is incomplete.
fn match_select_option(field: &FieldDefinition, trimmed: &str) -> String {
    for option in &field.options {
        if option.eq_ignore_ascii_case(trimmed) {
            return option.clone();
        }
    }

    if !field.options.is_empty() {
        warn!(
            field_key = %field.field_key,
            value = %trimmed,
            "select value accepted via free-text fallback"
        );
    }
    trimmed.to_owned()
}

fn parses_as_date(trimmed: &str) -> bool {
    if chrono::DateTime::parse_from_rfc3339(trimmed).is_ok() {
        return true;
    }
    DATE_FORMATS
        .iter()
        .any(|format| chrono::NaiveDate::parse_from_str(trimmed, format).is_ok())
}

fn check_rules(rules: &ValidationRules, value: &str) -> Option<String> {
    let length = value.chars().count();

    if let Some(min_length) = rules.min_length {
        if length < min_length {
            return Some(format!("Must be at least {min_length} characters"));
        }
    }

    if let Some(max_length) = rules.max_length {
        if length > max_length {
            return Some(format!("Must be at most {max_length} characters"));
        }
    }

    if let Some(pattern) = &rules.pattern {
        match Regex::new(pattern) {
            Ok(regex) => {
                if !regex.is_match(value) {
                    return Some(
                        rules.pattern_message.clone().unwrap_or_else(|| "Invalid format".to_owned()),
                    );
                }
            }
            Err(error) => {
                // An operator typo in a stored pattern must not lock users out.
                warn!(pattern = %pattern, error = %error, "skipping unparseable validation pattern");
            }
        }
    }

    None
}
