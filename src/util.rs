// Utility helpers for parsing and basic statistics.
//
// This module centralizes the "dirty" CSV/number/date handling so the rest
// of the code can assume clean, typed values.
use crate::error::ValidationError;
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Date format used by the Victron history export, e.g. `10/12/25`.
pub const DATE_FORMAT: &str = "%m/%d/%y";

/// Returns the trimmed value, or `None` when the field is absent or blank.
pub fn non_blank(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse a mandatory numeric field.
///
/// - Trims whitespace and strips thousands separators like `","`.
/// - Blank or absent values are reported as [`ValidationError::Missing`].
/// - Accepts scientific notation but rejects anything that does not parse
///   to a finite value, so `inf`/`NaN` never make it into the totals.
pub fn parse_f64_field(field: &'static str, s: Option<&str>) -> Result<f64, ValidationError> {
    let s = non_blank(s).ok_or(ValidationError::Missing { field })?;
    let invalid = || ValidationError::InvalidNumber {
        field,
        value: s.to_string(),
    };
    match s.replace(',', "").parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid()),
    }
}

/// Like [`parse_f64_field`] but also rejects negative values.
pub fn parse_non_negative(field: &'static str, s: Option<&str>) -> Result<f64, ValidationError> {
    let v = parse_f64_field(field, s)?;
    if v < 0.0 {
        return Err(ValidationError::Negative { field, value: v });
    }
    Ok(v)
}

pub fn parse_u32_field(field: &'static str, s: Option<&str>) -> Result<u32, ValidationError> {
    let s = non_blank(s).ok_or(ValidationError::Missing { field })?;
    match s.parse::<i64>() {
        Ok(v) if v < 0 => Err(ValidationError::Negative {
            field,
            value: v as f64,
        }),
        Ok(v) => u32::try_from(v).map_err(|_| ValidationError::InvalidNumber {
            field,
            value: s.to_string(),
        }),
        Err(_) => Err(ValidationError::InvalidNumber {
            field,
            value: s.to_string(),
        }),
    }
}

pub fn parse_date_field(s: Option<&str>) -> Result<NaiveDate, ValidationError> {
    let s = non_blank(s).ok_or(ValidationError::Missing { field: "Date" })?;
    parse_date(s).ok_or_else(|| ValidationError::InvalidDate {
        value: s.to_string(),
    })
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

pub fn average(v: &[f64]) -> f64 {
    // Arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with a fixed number of decimal places
    // and thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative();
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts and whole-dollar amounts.
    n.to_formatted_string(&Locale::en)
}
