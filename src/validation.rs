use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use validator::ValidationErrors;

/// Calendar date format accepted for expense dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns the trimmed value when it is present and not blank
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parses an amount as a decimal number.
///
/// Sign and magnitude are not checked: zero and negative amounts are accepted.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Parses a `YYYY-MM-DD` calendar date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Flattens validator output into a single `field: message` line
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
