//! Display formatting of cell values for labels and legends.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{ColumnType, Value};
use crate::geo::Geography;
use crate::geo::normalize::{full_name, normalize_identifier};
use crate::values::{parse_date, parse_number};

pub const DEFAULT_DATE_PATTERN: &str = "%b %-d, %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NumberFormat {
    /// Shortest exact representation
    #[default]
    Raw,
    /// Thousands separators, up to two decimals
    Comma,
    /// K/M/B/T suffix with at most one decimal
    Compact,
    /// `$` with separators; cents only when non-integral
    Currency,
    /// Fraction shown as a percentage, up to one decimal
    Percent,
    /// Fixed number of decimals
    Fixed(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RegionFormat {
    /// Normalized key, e.g. `CA`
    #[default]
    Code,
    /// Full name, e.g. `California`
    Full,
}

/// Per-column display format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnFormat {
    Number(NumberFormat),
    /// chrono strftime pattern
    Date(String),
    Region(RegionFormat),
    Raw,
}

/// Round to `decimals` places and drop trailing zeros
fn trimmed(n: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, n);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    };
    if s == "-0" { "0".to_string() } else { s }
}

/// Shortest display of a number: integers without a decimal point
pub fn raw_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn group_thousands(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn with_commas(n: f64, decimals: usize, keep_zeros: bool) -> String {
    let s = if keep_zeros {
        format!("{:.*}", decimals, n.abs())
    } else {
        trimmed(n.abs(), decimals)
    };
    let (int_part, frac) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    let mut out = String::new();
    if n < 0.0 && s.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(f) = frac {
        out.push('.');
        out.push_str(f);
    }
    out
}

fn compact(n: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    let abs = n.abs();
    let sign = if n < 0.0 { "-" } else { "" };
    for (i, (unit, suffix)) in UNITS.iter().enumerate() {
        if abs >= *unit {
            let scaled = (abs / unit * 10.0).round() / 10.0;
            // 999_950 rounds to 1000K; promote to the next unit
            if scaled >= 1000.0 && i > 0 {
                let (bigger, bigger_suffix) = UNITS[i - 1];
                return format!("{sign}{}{bigger_suffix}", trimmed(abs / bigger, 1));
            }
            return format!("{sign}{}{suffix}", trimmed(scaled, 1));
        }
    }
    let rounded = trimmed(abs, 1);
    if rounded == "1000" {
        return format!("{sign}1K");
    }
    if rounded == "0" { rounded } else { format!("{sign}{rounded}") }
}

pub fn format_number(n: f64, format: NumberFormat) -> String {
    match format {
        NumberFormat::Raw => raw_number(n),
        NumberFormat::Comma => with_commas(n, 2, false),
        NumberFormat::Compact => compact(n),
        NumberFormat::Currency => {
            let body = if n.fract() == 0.0 {
                with_commas(n.abs(), 0, false)
            } else {
                with_commas(n.abs(), 2, true)
            };
            if n < 0.0 { format!("-${body}") } else { format!("${body}") }
        }
        NumberFormat::Percent => format!("{}%", trimmed(n * 100.0, 1)),
        NumberFormat::Fixed(d) => format!("{:.*}", d as usize, n),
    }
}

pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    // Invalid patterns surface as a fmt error rather than a panic
    match write!(out, "{}", date.format(pattern)) {
        Ok(()) => out,
        Err(_) => date.format("%Y-%m-%d").to_string(),
    }
}

pub fn format_region(raw: &str, format: RegionFormat, geography: Geography) -> String {
    let code = normalize_identifier(raw, geography);
    match format {
        RegionFormat::Code => code,
        RegionFormat::Full => full_name(&code, geography)
            .map(str::to_string)
            .unwrap_or(code),
    }
}

/// Display text for a cell given its column type and optional format.
///
/// A format that does not apply to the value (a number format on text that
/// is not numeric, say) falls back to the raw display.
pub fn format_value(
    value: &Value,
    column_type: ColumnType,
    format: Option<&ColumnFormat>,
    geography: Geography,
) -> String {
    if value.is_blank() {
        return String::new();
    }
    let format = match (format, column_type) {
        (Some(f), _) => f.clone(),
        (None, ColumnType::Number) => ColumnFormat::Number(NumberFormat::Raw),
        (None, ColumnType::Date) => ColumnFormat::Date(DEFAULT_DATE_PATTERN.to_string()),
        (None, ColumnType::RegionCode) => ColumnFormat::Region(RegionFormat::Code),
        (None, _) => ColumnFormat::Raw,
    };
    match format {
        ColumnFormat::Number(nf) => match parse_number(value) {
            Some(n) => format_number(n, nf),
            None => value.to_string(),
        },
        ColumnFormat::Date(pattern) => match parse_date(value) {
            Some(d) => format_date(d, &pattern),
            None => value.to_string(),
        },
        ColumnFormat::Region(rf) => format_region(&value.to_string(), rf, geography),
        ColumnFormat::Raw => value.to_string(),
    }
}
