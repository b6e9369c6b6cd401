//! Date inference for loosely typed cells and columns.
//!
//! Every threshold used to decide "is this a date?" lives here as a named
//! constant. Numbers below the epoch-seconds floor (years, ranks, day-of-month,
//! month and quarter numbers) are never treated as timestamps.

use crate::data::{CategoryColumn, CellValue, ColumnMeta};
use crate::parser::{parse_temporal_fragment, TemporalFragment};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Plausible epoch-second range, normalized to milliseconds (x1000).
pub const EPOCH_SECONDS_MIN: f64 = 1e9;
pub const EPOCH_SECONDS_MAX: f64 = 1e11;

/// Plausible epoch-millisecond range.
pub const EPOCH_MILLIS_MIN: f64 = 1e12;
pub const EPOCH_MILLIS_MAX: f64 = 1e13;

/// Smallest number accepted as milliseconds when the host types the column as temporal.
pub const MIN_PLAUSIBLE_DATE_MS: f64 = 3.17e10;

/// Column-level detection: rows sampled, parse ratio and span required.
pub const DATE_SAMPLE_LIMIT: usize = 500;
pub const DATE_PARSE_RATIO: f64 = 0.85;
pub const MIN_DATE_SPAN_MS: f64 = 28.0 * MS_PER_DAY;

const HOST_TEMPORAL_BONUS: f64 = 0.1;

const GENERIC_DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d-%b-%Y",
];

const GENERIC_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

static FOUR_DIGIT_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());
static DAY_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[^a-z])day([^a-z]|$)").unwrap());
static MONTH_HINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)month").unwrap());
static QUARTER_HINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)quarter|qtr").unwrap());
static YEAR_HINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)year|yr").unwrap());

// =============================================================================
// Single values
// =============================================================================

/// How a value was recognized as a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Native,
    EpochSeconds,
    EpochMillis,
    Pattern,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemporalClass {
    Date { ms: f64, source: DateSource },
    NotTemporal,
}

impl TemporalClass {
    pub fn ms(self) -> Option<f64> {
        match self {
            TemporalClass::Date { ms, .. } => Some(ms),
            TemporalClass::NotTemporal => None,
        }
    }
}

/// Classify a number against the epoch ranges, returning milliseconds.
pub fn classify_epoch_number(n: f64) -> TemporalClass {
    if !n.is_finite() {
        return TemporalClass::NotTemporal;
    }
    if (EPOCH_SECONDS_MIN..EPOCH_SECONDS_MAX).contains(&n) {
        TemporalClass::Date { ms: n * 1000.0, source: DateSource::EpochSeconds }
    } else if (EPOCH_MILLIS_MIN..=EPOCH_MILLIS_MAX).contains(&n) {
        TemporalClass::Date { ms: n, source: DateSource::EpochMillis }
    } else {
        TemporalClass::NotTemporal
    }
}

/// Classify a raw cell as date-like.
///
/// Priority: native dates, epoch-like numbers, month-year / quarter / year
/// labels, then generic parsing of strings that contain a four-digit year.
pub fn classify_temporal_value(raw: &CellValue) -> TemporalClass {
    match raw {
        CellValue::Date(d) if d.ms.is_finite() => {
            TemporalClass::Date { ms: d.ms, source: DateSource::Native }
        }
        CellValue::Number(n) => classify_epoch_number(*n),
        CellValue::Text(s) => classify_text(s),
        _ => TemporalClass::NotTemporal,
    }
}

/// Like [`classify_temporal_value`], but trusts host-typed temporal numbers
/// above [`MIN_PLAUSIBLE_DATE_MS`] as milliseconds.
pub fn classify_with_host_type(raw: &CellValue, host_temporal: bool) -> TemporalClass {
    match (classify_temporal_value(raw), raw) {
        (TemporalClass::NotTemporal, CellValue::Number(n))
            if host_temporal && n.is_finite() && *n >= MIN_PLAUSIBLE_DATE_MS =>
        {
            TemporalClass::Date { ms: *n, source: DateSource::EpochMillis }
        }
        (class, _) => class,
    }
}

pub fn to_date_ms(raw: &CellValue) -> Option<f64> {
    classify_temporal_value(raw).ms()
}

fn classify_text(s: &str) -> TemporalClass {
    let text = s.trim();
    if text.is_empty() {
        return TemporalClass::NotTemporal;
    }

    match parse_temporal_fragment(text) {
        Some(TemporalFragment::MonthYear { year, month }) => {
            return pattern_date(year, month);
        }
        Some(TemporalFragment::Quarter { quarter, year: Some(year) }) => {
            return pattern_date(year, (quarter - 1) * 3 + 1);
        }
        Some(TemporalFragment::Year(year)) if text.len() == 4 => {
            return pattern_date(year, 1);
        }
        _ => {}
    }

    if !FOUR_DIGIT_YEAR.is_match(text) {
        return TemporalClass::NotTemporal;
    }
    match parse_generic_date(text) {
        Some(ms) => TemporalClass::Date { ms, source: DateSource::Generic },
        None => TemporalClass::NotTemporal,
    }
}

fn pattern_date(year: i32, month: u32) -> TemporalClass {
    match ymd_to_ms(year, month, 1) {
        Some(ms) => TemporalClass::Date { ms, source: DateSource::Pattern },
        None => TemporalClass::NotTemporal,
    }
}

fn parse_generic_date(text: &str) -> Option<f64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis() as f64);
    }
    for fmt in GENERIC_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    for fmt in GENERIC_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date_to_ms(date);
        }
    }
    None
}

/// `YYYYMM` key for month-year style labels ("Mar-2024" -> 202403).
/// Quarter labels with a year key on the quarter's first month.
pub fn parse_month_year_key(text: &str) -> Option<i64> {
    match parse_temporal_fragment(text)? {
        TemporalFragment::MonthYear { year, month } => Some(year as i64 * 100 + month as i64),
        TemporalFragment::Quarter { quarter, year: Some(year) } => {
            Some(year as i64 * 100 + ((quarter - 1) * 3 + 1) as i64)
        }
        _ => None,
    }
}

// =============================================================================
// Calendar helpers
// =============================================================================

pub fn date_to_ms(date: NaiveDate) -> Option<f64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
}

pub fn ymd_to_ms(year: i32, month: u32, day: u32) -> Option<f64> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(date_to_ms)
}

pub fn ms_to_date(ms: f64) -> Option<NaiveDate> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms as i64).map(|dt| dt.date_naive())
}

/// Whole number as a year chrono can represent.
fn calendar_year(n: f64) -> Option<i32> {
    let (min, max) = (NaiveDate::MIN.year(), NaiveDate::MAX.year());
    (n >= min as f64 && n <= max as f64).then_some(n as i32)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 { year.checked_add(1).map(|y| (y, 1)) } else { Some((year, month + 1)) };
    next.and_then(|(ny, nm)| NaiveDate::from_ymd_opt(ny, nm, 1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

fn add_months(year: i32, month: u32, months: u32) -> Option<(i32, u32)> {
    let zero_based = month.checked_sub(1)?.checked_add(months)?;
    let year = year.checked_add(i32::try_from(zero_based / 12).ok()?)?;
    Some((year, zero_based % 12 + 1))
}

// =============================================================================
// Column-level date axis detection
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DateAxisCandidate {
    pub column: usize,
    pub score: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl DateAxisCandidate {
    pub fn span_ms(&self) -> f64 {
        self.max_ms - self.min_ms
    }
}

/// Score one column. `None` unless enough sampled values parse as dates and
/// they span at least [`MIN_DATE_SPAN_MS`].
pub fn score_date_column(column: usize, meta: &ColumnMeta, values: &[CellValue]) -> Option<DateAxisCandidate> {
    let host_temporal = meta.is_temporal();
    let mut sampled = 0usize;
    let mut parsed = 0usize;
    let mut min_ms = f64::INFINITY;
    let mut max_ms = f64::NEG_INFINITY;

    for raw in values.iter().filter(|v| !v.is_blank()).take(DATE_SAMPLE_LIMIT) {
        sampled += 1;
        if let Some(ms) = classify_with_host_type(raw, host_temporal).ms() {
            parsed += 1;
            min_ms = min_ms.min(ms);
            max_ms = max_ms.max(ms);
        }
    }

    if sampled == 0 {
        return None;
    }
    let ratio = parsed as f64 / sampled as f64;
    if ratio < DATE_PARSE_RATIO || max_ms - min_ms < MIN_DATE_SPAN_MS {
        return None;
    }

    let bonus = if host_temporal { HOST_TEMPORAL_BONUS } else { 0.0 };
    Some(DateAxisCandidate { column, score: ratio + bonus, min_ms, max_ms })
}

/// Pick the best date axis among category columns. Ties keep the earlier column.
pub fn detect_date_axis(columns: &[CategoryColumn]) -> Option<DateAxisCandidate> {
    let mut best: Option<DateAxisCandidate> = None;
    for (idx, column) in columns.iter().enumerate() {
        let Some(candidate) = score_date_column(idx, &column.source, &column.values) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some(current) => {
                candidate.score > current.score
                    || (candidate.score == current.score && candidate.span_ms() > current.span_ms())
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

// =============================================================================
// Temporal granularity (timeline endpoints)
// =============================================================================

/// Granularity scale, ordered `None < Date < Year < Quarter < Month < Day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TemporalLevel {
    #[default]
    None,
    Date,
    Year,
    Quarter,
    Month,
    Day,
}

/// Level hinted by a column's display or query name, finest match first.
pub fn name_level_hint(meta: &ColumnMeta) -> Option<TemporalLevel> {
    let names = [Some(meta.display_name.as_str()), meta.query_name.as_deref()];
    let hinted = |re: &Regex| names.iter().flatten().any(|n| re.is_match(n));

    if hinted(&DAY_HINT) {
        Some(TemporalLevel::Day)
    } else if hinted(&MONTH_HINT) {
        Some(TemporalLevel::Month)
    } else if hinted(&QUARTER_HINT) {
        Some(TemporalLevel::Quarter)
    } else if hinted(&YEAR_HINT) {
        Some(TemporalLevel::Year)
    } else {
        None
    }
}

/// Level implied by one value's shape alone.
pub fn value_shape_level(raw: &CellValue) -> TemporalLevel {
    match raw {
        CellValue::Date(_) => TemporalLevel::Date,
        CellValue::Number(n) => {
            if classify_epoch_number(*n).ms().is_some() {
                TemporalLevel::Date
            } else if n.fract() == 0.0 && n.abs() <= 9999.0 {
                TemporalLevel::Year
            } else {
                TemporalLevel::None
            }
        }
        CellValue::Text(s) => match parse_temporal_fragment(s) {
            Some(TemporalFragment::MonthYear { .. }) | Some(TemporalFragment::Month(_)) => {
                TemporalLevel::Month
            }
            Some(TemporalFragment::Quarter { .. }) => TemporalLevel::Quarter,
            Some(TemporalFragment::Year(_)) => TemporalLevel::Year,
            None => match classify_text(s) {
                TemporalClass::Date { .. } => TemporalLevel::Date,
                TemporalClass::NotTemporal => TemporalLevel::None,
            },
        },
        _ => TemporalLevel::None,
    }
}

/// Infer a column's granularity from its name, then from the shape of its values.
pub fn infer_column_level(meta: &ColumnMeta, values: &[CellValue]) -> TemporalLevel {
    if let Some(level) = name_level_hint(meta) {
        return level;
    }

    let mut counts = [0usize; 6];
    let mut sampled = 0usize;
    for raw in values.iter().filter(|v| !v.is_blank()).take(DATE_SAMPLE_LIMIT) {
        sampled += 1;
        counts[value_shape_level(raw) as usize] += 1;
    }
    if sampled == 0 {
        return TemporalLevel::None;
    }

    let levels = [
        TemporalLevel::None,
        TemporalLevel::Date,
        TemporalLevel::Year,
        TemporalLevel::Quarter,
        TemporalLevel::Month,
        TemporalLevel::Day,
    ];
    levels
        .into_iter()
        .zip(counts)
        .filter(|(level, _)| *level != TemporalLevel::None)
        .max_by_key(|(_, count)| *count)
        .filter(|(_, count)| *count as f64 / sampled as f64 >= DATE_PARSE_RATIO)
        .map(|(level, _)| level)
        .unwrap_or(TemporalLevel::None)
}

/// Calendar components gathered for one timeline endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DateParts {
    pub year: Option<i32>,
    pub quarter: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    /// Set when the components came from a full date or timestamp.
    pub exact_ms: Option<f64>,
    pub year_borrowed: bool,
}

impl DateParts {
    fn from_ms(ms: f64) -> Self {
        match ms_to_date(ms) {
            Some(date) => DateParts {
                year: Some(date.year()),
                quarter: Some((date.month() - 1) / 3 + 1),
                month: Some(date.month()),
                day: Some(date.day()),
                exact_ms: Some(ms),
                year_borrowed: false,
            },
            None => DateParts::default(),
        }
    }

    /// Read the components a column of the given level contributes.
    pub fn read(level: TemporalLevel, raw: &CellValue) -> Self {
        if raw.is_blank() {
            return DateParts::default();
        }
        if let CellValue::Date(d) = raw {
            return DateParts::from_ms(d.ms);
        }

        let number = raw.as_number().filter(|n| n.fract() == 0.0);
        let fragment = match raw {
            CellValue::Text(s) => parse_temporal_fragment(s),
            _ => None,
        };
        let mut parts = DateParts::default();

        match level {
            TemporalLevel::Year => {
                if let Some(ms) = number.and_then(|n| classify_epoch_number(n).ms()) {
                    return DateParts::from_ms(ms);
                }
                parts.year = number.and_then(calendar_year).or(match fragment {
                    Some(TemporalFragment::Year(y)) => Some(y),
                    Some(TemporalFragment::MonthYear { year, .. }) => Some(year),
                    Some(TemporalFragment::Quarter { year, .. }) => year,
                    _ => None,
                });
            }
            TemporalLevel::Quarter => match fragment {
                Some(TemporalFragment::Quarter { quarter, year }) => {
                    parts.quarter = Some(quarter);
                    parts.year = year;
                }
                _ => parts.quarter = number.map(|n| n as u32).filter(|q| (1..=4).contains(q)),
            },
            TemporalLevel::Month => match fragment {
                Some(TemporalFragment::MonthYear { year, month }) => {
                    parts.year = Some(year);
                    parts.month = Some(month);
                }
                Some(TemporalFragment::Month(month)) => parts.month = Some(month),
                _ => parts.month = number.map(|n| n as u32).filter(|m| (1..=12).contains(m)),
            },
            TemporalLevel::Day => {
                parts.day = number.map(|n| n as u32).filter(|d| (1..=31).contains(d));
            }
            TemporalLevel::Date | TemporalLevel::None => {
                if let Some(ms) = to_date_ms(raw) {
                    return DateParts::from_ms(ms);
                }
                // Unhinted column: fall back to what the value itself looks like
                let shape = value_shape_level(raw);
                if shape != TemporalLevel::None && shape != TemporalLevel::Date {
                    return DateParts::read(shape, raw);
                }
            }
        }
        parts
    }

    /// Fill unset components from `other`. Components already set win.
    pub fn merge(&mut self, other: DateParts) {
        if self.exact_ms.is_some() {
            return;
        }
        if other.exact_ms.is_some() && self.year.is_none() && self.month.is_none() {
            *self = other;
            return;
        }
        self.year = self.year.or(other.year);
        self.quarter = self.quarter.or(other.quarter);
        self.month = self.month.or(other.month);
        self.day = self.day.or(other.day);
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.quarter.is_none() && self.month.is_none() && self.day.is_none()
    }

    /// Take the sibling endpoint's year when this endpoint has none.
    pub fn borrow_year(&mut self, sibling: &DateParts) {
        if self.year.is_none() && sibling.year.is_some() && !self.is_empty() {
            self.year = sibling.year;
            self.year_borrowed = true;
        }
    }

    pub fn level(&self) -> TemporalLevel {
        if self.exact_ms.is_some() {
            TemporalLevel::Date
        } else if self.day.is_some() {
            TemporalLevel::Day
        } else if self.month.is_some() {
            TemporalLevel::Month
        } else if self.quarter.is_some() {
            TemporalLevel::Quarter
        } else if self.year.is_some() {
            TemporalLevel::Year
        } else {
            TemporalLevel::None
        }
    }

    fn start_month(&self) -> u32 {
        self.month
            .or(self.quarter.map(|q| (q - 1) * 3 + 1))
            .unwrap_or(1)
    }

    /// Start of the period these components describe. Requires a year.
    pub fn start_ms(&self) -> Option<f64> {
        if let Some(ms) = self.exact_ms {
            return Some(ms);
        }
        let year = self.year?;
        let month = self.start_month();
        let day = self.day.unwrap_or(1).min(days_in_month(year, month));
        ymd_to_ms(year, month, day)
    }

    /// Exclusive end of the period (start of the following one).
    pub fn period_end_ms(&self) -> Option<f64> {
        if let Some(ms) = self.exact_ms {
            return Some(ms);
        }
        let year = self.year?;
        let month = self.start_month();
        match self.level() {
            TemporalLevel::Day => self.start_ms().map(|ms| ms + MS_PER_DAY),
            TemporalLevel::Month => {
                let (y, m) = add_months(year, month, 1)?;
                ymd_to_ms(y, m, 1)
            }
            TemporalLevel::Quarter => {
                let (y, m) = add_months(year, month, 3)?;
                ymd_to_ms(y, m, 1)
            }
            _ => ymd_to_ms(year.checked_add(1)?, 1, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::just_under_seconds(999_999_999.0, None)]
    #[case::seconds_floor(1_000_000_000.0, Some(1_000_000_000_000.0))]
    #[case::seconds(1_700_000_000.0, Some(1_700_000_000_000.0))]
    #[case::gap(5e11, None)]
    #[case::millis(1_700_000_000_000.0, Some(1_700_000_000_000.0))]
    #[case::beyond_millis(2e13, None)]
    #[case::year(2024.0, None)]
    #[case::rank(3.0, None)]
    #[case::day_of_month(31.0, None)]
    #[case::negative(-1_700_000_000.0, None)]
    #[case::nan(f64::NAN, None)]
    fn test_epoch_thresholds(#[case] n: f64, #[case] expected: Option<f64>) {
        assert_eq!(classify_temporal_value(&CellValue::Number(n)).ms(), expected);
    }

    #[test]
    fn test_epoch_seconds_source() {
        let class = classify_temporal_value(&CellValue::Number(1e9));
        assert_eq!(class, TemporalClass::Date { ms: 1e12, source: DateSource::EpochSeconds });
    }

    #[rstest]
    #[case("Mar-2024", ymd_to_ms(2024, 3, 1))]
    #[case("2024-03", ymd_to_ms(2024, 3, 1))]
    #[case("Q2 2023", ymd_to_ms(2023, 4, 1))]
    #[case("2021", ymd_to_ms(2021, 1, 1))]
    #[case("2024-03-15", ymd_to_ms(2024, 3, 15))]
    #[case("03/15/2024", ymd_to_ms(2024, 3, 15))]
    #[case("15 Mar 2024", ymd_to_ms(2024, 3, 15))]
    #[case("2024-03-15T12:00:00Z", ymd_to_ms(2024, 3, 15).map(|ms| ms + 12.0 * 3_600_000.0))]
    #[case("Q2", None)]
    #[case("March", None)]
    #[case("North 2024 office", None)]
    #[case("12", None)]
    fn test_text_dates(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(to_date_ms(&CellValue::text(input)), expected);
    }

    #[test]
    fn test_native_and_other_cells() {
        assert_eq!(to_date_ms(&CellValue::date_ms(5.0)), Some(5.0));
        assert_eq!(to_date_ms(&CellValue::Null), None);
        assert_eq!(to_date_ms(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_host_typed_millis() {
        let small = CellValue::Number(4.0e10);
        assert_eq!(classify_temporal_value(&small).ms(), None);
        assert_eq!(classify_with_host_type(&small, true).ms(), Some(4.0e10));
        assert_eq!(classify_with_host_type(&CellValue::Number(3.0), true).ms(), None);
    }

    #[test]
    fn test_month_year_key() {
        assert_eq!(parse_month_year_key("Mar-2024"), Some(202403));
        assert_eq!(parse_month_year_key("Jun-2024"), Some(202406));
        assert_eq!(parse_month_year_key("Mar-24"), Some(202403));
        assert_eq!(parse_month_year_key("Q3 2024"), Some(202407));
        assert_eq!(parse_month_year_key("March"), None);
    }

    fn column(name: &str, values: Vec<CellValue>) -> CategoryColumn {
        CategoryColumn { source: ColumnMeta::named(name), values }
    }

    #[test]
    fn test_detect_date_axis_requires_span() {
        let narrow = column(
            "d",
            vec![CellValue::text("2024-03-01"), CellValue::text("2024-03-10")],
        );
        assert_eq!(detect_date_axis(&[narrow]), None);

        let wide = column(
            "d",
            vec![CellValue::text("2024-01-01"), CellValue::text("2024-06-01")],
        );
        let found = detect_date_axis(&[wide]).unwrap();
        assert_eq!(found.column, 0);
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_detect_date_axis_rejects_small_integers() {
        let mut quarter = column("Quarter", (1..=4).map(|q| CellValue::Number(q as f64)).collect());
        quarter.source.value_type = Some(crate::data::ValueType { temporal: true, ..Default::default() });
        assert_eq!(detect_date_axis(&[quarter]), None);
    }

    #[test]
    fn test_detect_date_axis_ratio_and_best() {
        let mut mostly: Vec<CellValue> = (1..=9)
            .map(|m| CellValue::text(format!("2024-0{}-01", m)))
            .collect();
        mostly.push(CellValue::text("unknown"));
        let labels = column("label", vec![CellValue::text("a"), CellValue::text("b")]);
        let partial = column("mostly", mostly);
        let full = column(
            "full",
            vec![CellValue::text("Jan-2020"), CellValue::text("Jan-2022")],
        );

        let found = detect_date_axis(&[labels.clone(), partial.clone(), full]).unwrap();
        assert_eq!(found.column, 2);

        let found = detect_date_axis(&[labels, partial]).unwrap();
        assert_eq!(found.column, 1);
        assert!((found.score - 0.9).abs() < 1e-9);
    }

    #[rstest]
    #[case("Start Year", None, Some(TemporalLevel::Year))]
    #[case("Begin", Some("Calendar.Date Hierarchy.Quarter"), Some(TemporalLevel::Quarter))]
    #[case("Year Month", None, Some(TemporalLevel::Month))]
    #[case("Day", None, Some(TemporalLevel::Day))]
    #[case("Holiday", None, None)]
    #[case("Civilization", None, None)]
    fn test_name_hints(#[case] display: &str, #[case] query: Option<&str>, #[case] expected: Option<TemporalLevel>) {
        let mut meta = ColumnMeta::named(display);
        meta.query_name = query.map(|q| q.to_string());
        assert_eq!(name_level_hint(&meta), expected);
    }

    #[test]
    fn test_level_order() {
        assert!(TemporalLevel::None < TemporalLevel::Date);
        assert!(TemporalLevel::Date < TemporalLevel::Year);
        assert!(TemporalLevel::Quarter < TemporalLevel::Month);
        assert!(TemporalLevel::Month < TemporalLevel::Day);
    }

    #[test]
    fn test_infer_from_values() {
        let meta = ColumnMeta::named("Start");
        let years: Vec<CellValue> = vec![(-3000.0).into(), 1200.0.into(), 2020.0.into()];
        assert_eq!(infer_column_level(&meta, &years), TemporalLevel::Year);

        let months: Vec<CellValue> = vec!["Jan".into(), "Feb".into(), "Mar-2024".into()];
        assert_eq!(infer_column_level(&meta, &months), TemporalLevel::Month);

        let mixed: Vec<CellValue> = vec!["Rome".into(), "Feb".into()];
        assert_eq!(infer_column_level(&meta, &mixed), TemporalLevel::None);
    }

    #[test]
    fn test_parts_merge_and_periods() {
        let mut parts = DateParts::read(TemporalLevel::Year, &CellValue::Number(2024.0));
        parts.merge(DateParts::read(TemporalLevel::Quarter, &CellValue::text("Qtr 2")));
        assert_eq!(parts.level(), TemporalLevel::Quarter);
        assert_eq!(parts.start_ms(), ymd_to_ms(2024, 4, 1));
        assert_eq!(parts.period_end_ms(), ymd_to_ms(2024, 7, 1));

        parts.merge(DateParts::read(TemporalLevel::Month, &CellValue::Number(5.0)));
        assert_eq!(parts.level(), TemporalLevel::Month);
        assert_eq!(parts.start_ms(), ymd_to_ms(2024, 5, 1));
        assert_eq!(parts.period_end_ms(), ymd_to_ms(2024, 6, 1));
    }

    #[test]
    fn test_parts_day_clamped() {
        let parts = DateParts { year: Some(2023), month: Some(2), day: Some(31), ..Default::default() };
        assert_eq!(parts.start_ms(), ymd_to_ms(2023, 2, 28));
    }

    #[test]
    fn test_december_rollover() {
        let parts = DateParts { year: Some(2023), month: Some(12), ..Default::default() };
        assert_eq!(parts.period_end_ms(), ymd_to_ms(2024, 1, 1));
    }

    #[test]
    fn test_borrow_year() {
        let start = DateParts::read(TemporalLevel::Year, &CellValue::Number(2020.0));
        let mut end = DateParts::read(TemporalLevel::Month, &CellValue::text("March"));
        assert_eq!(end.start_ms(), None);
        end.borrow_year(&start);
        assert!(end.year_borrowed);
        assert_eq!(end.start_ms(), ymd_to_ms(2020, 3, 1));

        let mut empty = DateParts::default();
        empty.borrow_year(&start);
        assert_eq!(empty.year, None);
    }

    #[test]
    fn test_bce_years() {
        let parts = DateParts::read(TemporalLevel::Year, &CellValue::text("3000 BC"));
        assert_eq!(parts.year, Some(-3000));
        assert!(parts.start_ms().unwrap() < 0.0);
    }
}
