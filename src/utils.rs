/// Shared utility functions for the Bora analysis pipeline
use chrono::{Datelike, NaiveDate};

/// Outcome of coercing one raw field to a number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Value(f64),
    /// Field was empty or carried a designated missing marker
    Missing,
    /// Field had content that is not a finite number
    Malformed,
}

impl Coerced {
    pub fn value(self) -> Option<f64> {
        match self {
            Coerced::Value(v) => Some(v),
            Coerced::Missing | Coerced::Malformed => None,
        }
    }
}

/// Coerce a raw station field to a number
///
/// Station exports mix decimal points and decimal commas across years, so a
/// comma is read as the decimal separator when the field has no point.
///
/// # Examples
///
/// ```
/// use bora_analysis::utils::{coerce_number, Coerced};
///
/// let markers = vec!["-".to_string()];
/// assert_eq!(coerce_number(Some(" 12.5 "), &markers), Coerced::Value(12.5));
/// assert_eq!(coerce_number(Some("3,25"), &markers), Coerced::Value(3.25));
/// assert_eq!(coerce_number(Some("-"), &markers), Coerced::Missing);
/// assert_eq!(coerce_number(None, &markers), Coerced::Missing);
/// assert_eq!(coerce_number(Some("calm"), &markers), Coerced::Malformed);
/// ```
pub fn coerce_number(raw: Option<&str>, missing_markers: &[String]) -> Coerced {
    let trimmed = match raw {
        Some(s) => s.trim(),
        None => return Coerced::Missing,
    };

    if trimmed.is_empty() || missing_markers.iter().any(|m| m == trimmed) {
        return Coerced::Missing;
    }

    let parsed = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".").parse::<f64>()
    } else {
        trimmed.parse::<f64>()
    };

    match parsed {
        Ok(v) if v.is_finite() => Coerced::Value(v),
        _ => Coerced::Malformed,
    }
}

/// Coerce a raw field that must hold a whole number within `range`
pub fn coerce_integer(
    raw: Option<&str>,
    missing_markers: &[String],
    range: std::ops::RangeInclusive<i64>,
) -> Option<i64> {
    let value = coerce_number(raw, missing_markers).value()?;
    if value.fract() != 0.0 {
        return None;
    }
    let value = value as i64;
    range.contains(&value).then_some(value)
}

/// Day number used for gap arithmetic between calendar dates
pub fn ordinal_day(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
