use crate::data::{CellValue, SortDirection};
use crate::temporal::{ms_to_date, parse_month_year_key, MS_PER_DAY};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// Joins the parts of a composite label (several fields on one hierarchy level).
pub const LABEL_SEPARATOR: &str = " · ";

/// Group label used when the group value is null or empty.
pub const BLANK_GROUP: &str = "(Blank)";

/// Group/series label used when no group or series role is bound.
pub const DEFAULT_GROUP: &str = "All";

/// Display string for a raw cell.
///
/// Null and blank cells become `"Entry N"`, where N is `fallback_index + 1`.
pub fn format_data_value(raw: &CellValue, fallback_index: usize) -> String {
    format_literal(raw).unwrap_or_else(|| format!("Entry {}", fallback_index + 1))
}

/// Like [`format_data_value`] but blank values map to [`BLANK_GROUP`].
pub fn format_group_value(raw: &CellValue) -> String {
    format_literal(raw).unwrap_or_else(|| BLANK_GROUP.to_string())
}

fn format_literal(raw: &CellValue) -> Option<String> {
    match raw {
        CellValue::Null => None,
        CellValue::Text(s) if s.trim().is_empty() => None,
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Number(n) => Some(format_number(*n)),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::Date(d) => Some(format_date_ms(d.ms)),
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() {
        format!("{}", n)
    } else {
        String::new()
    }
}

/// ISO date for midnight timestamps, RFC 3339 otherwise
pub fn format_date_ms(ms: f64) -> String {
    if ms.rem_euclid(MS_PER_DAY) == 0.0 {
        if let Some(date) = ms_to_date(ms) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_else(|| format_number(ms))
}

pub fn join_labels<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR)
}

// =============================================================================
// Sort keys
// =============================================================================

/// Normalized sortable form of a raw value.
///
/// Numeric and chronological keys order before text keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    pub fn is_numeric(&self) -> bool {
        matches!(self, SortKey::Number(_))
    }

    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        }
    }
}

/// Sort key for any raw value: dates to epoch ms, numbers as-is, booleans to
/// 0/1, strings to a month-year key when they parse as one, else lower-cased.
pub fn sort_key(raw: &CellValue) -> SortKey {
    match raw {
        CellValue::Null => SortKey::Text(String::new()),
        CellValue::Bool(b) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
        CellValue::Number(n) => SortKey::Number(*n),
        CellValue::Date(d) => SortKey::Number(d.ms),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if let Some(key) = parse_month_year_key(trimmed) {
                SortKey::Number(key as f64)
            } else if let Ok(n) = trimmed.parse::<f64>() {
                SortKey::Number(n)
            } else {
                SortKey::Text(trimmed.to_lowercase())
            }
        }
    }
}

/// Compare two per-level key paths, honoring a direction per level.
/// Levels without a direction sort ascending; shorter paths sort first on ties.
pub fn compare_key_paths(a: &[SortKey], b: &[SortKey], directions: &[Option<SortDirection>]) -> Ordering {
    for (level, (ka, kb)) in a.iter().zip(b.iter()).enumerate() {
        let ord = ka.compare(kb);
        let ord = match directions.get(level).copied().flatten() {
            Some(SortDirection::Descending) => ord.reverse(),
            _ => ord,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}
