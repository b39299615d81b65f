//! Value utilities: lenient number and date parsing, unique values and
//! numeric bounds over a column.

use chrono::{DateTime, NaiveDate};

use crate::data::{DataRow, Value};

/// Parse a cell as a number.
///
/// Text is accepted with currency symbols, thousands separators, percent
/// signs and whitespace stripped, plus an optional compact suffix:
/// `"1.5K"` is 1500, `"2M"` two million, `"$3.2B"` and `"1T"` likewise.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::Text(s) => parse_compact(s),
        _ => None,
    }
}

fn parse_compact(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let (digits, multiplier) = match cleaned.chars().last()? {
        'k' | 'K' => (&cleaned[..cleaned.len() - 1], 1e3),
        'm' | 'M' => (&cleaned[..cleaned.len() - 1], 1e6),
        'b' | 'B' => (&cleaned[..cleaned.len() - 1], 1e9),
        't' | 'T' => (&cleaned[..cleaned.len() - 1], 1e12),
        _ => (cleaned.as_str(), 1.0),
    };
    let n: f64 = digits.parse().ok()?;
    let n = n * multiplier;
    n.is_finite().then_some(n)
}

/// Parse a cell as a calendar date.
///
/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY`, `YYYY/MM/DD`, RFC 3339 timestamps
/// and `Month D, YYYY` (full or abbreviated month).
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_text()?.trim();
    for pattern in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, pattern) {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
}

/// Distinct non-blank display values of a column, in first-appearance order
pub fn unique_values<'a>(rows: impl IntoIterator<Item = &'a DataRow>, column: &str) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    for row in rows {
        if let Some(v) = row.get(column).filter(|v| !v.is_blank()) {
            seen.insert(v.to_string().trim().to_string());
        }
    }
    seen.into_iter().collect()
}

/// Minimum and maximum of the numeric values in a column
pub fn numeric_bounds<'a>(rows: impl IntoIterator<Item = &'a DataRow>, column: &str) -> Option<(f64, f64)> {
    rows.into_iter()
        .filter_map(|row| row.get(column).and_then(parse_number))
        .fold(None, |acc, n| match acc {
            None => Some((n, n)),
            Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
        })
}
