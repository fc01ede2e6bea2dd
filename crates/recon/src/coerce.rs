//! Per-field coercion with local recovery. Nothing here fails: a value that
//! does not parse becomes `None` and the caller substitutes its default.

use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::CellValue;

/// Half-up rounding to `dp` decimal places.
pub fn round_money(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Coerce a cell into an exact decimal.
///
/// Floats go through their shortest round-trip text form so `10.005` read
/// from a sheet stays `10.005` instead of picking up binary noise. Text
/// tolerates thousands separators, currency symbols and surrounding spaces.
pub fn to_decimal(cell: Option<&CellValue>) -> Option<Decimal> {
    match cell? {
        CellValue::Empty | CellValue::DateTime(_) => None,
        CellValue::Number(n) if !n.is_finite() => None,
        CellValue::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        CellValue::Text(s) => parse_decimal_text(s),
    }
}

fn parse_decimal_text(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '¥' | '￥' | ' '))
        .collect();
    let cleaned = cleaned
        .trim_start_matches("NT")
        .trim_start_matches("US");
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
        return None;
    }
    Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .ok()
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d", "%m/%d/%Y"];

/// Excel's day zero for the 1900 date system (accounts for the 1900 leap bug).
fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Parse a date permissively. Unparseable or missing values yield `None`.
pub fn to_date(cell: Option<&CellValue>) -> Option<NaiveDate> {
    match cell? {
        CellValue::Empty => None,
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(s) => parse_date_text(s),
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Plausible Excel serials only: 1900-01-01 ..= 9999-12-31.
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    excel_epoch()?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    None
}

/// `YYYY-MM-DD`, or empty when the cell holds no recognizable date.
pub fn format_date(cell: Option<&CellValue>) -> String {
    to_date(cell)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// True for values upstream tools leave behind when a null is stringified.
pub fn is_null_text(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan")
}
