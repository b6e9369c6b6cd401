//! Timeline transformer.
//!
//! Each row becomes a bar between two endpoints. An endpoint may be spread over
//! several columns of a drill hierarchy (Year, Quarter, Month, Day); the
//! granularity of every column is inferred first, then each row's components
//! are merged into calendar parts and resolved to timestamps.

use super::{distinct, model_base};
use crate::coerce::{format_data_value, format_date_ms, format_group_value, DEFAULT_GROUP};
use crate::data::{CategoricalView, CellValue, ColumnMeta, DataView};
use crate::ir::{DataPoint, TimelineItem, TimelineModel};
use crate::roles::{resolve_roles, Role, RoleBinding};
use crate::settings::{DateCutoff, Settings, TimelineSettings, TimelineSortBy};
use crate::temporal::{infer_column_level, DateParts, TemporalLevel, MS_PER_DAY};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// A column feeding one endpoint, with its inferred granularity.
struct EndpointColumn<'a> {
    level: TemporalLevel,
    values: &'a [CellValue],
}

impl EndpointColumn<'_> {
    fn read(&self, row: usize) -> DateParts {
        self.values
            .get(row)
            .map(|raw| DateParts::read(self.level, raw))
            .unwrap_or_default()
    }
}

fn read_endpoint(columns: &[EndpointColumn], row: usize) -> DateParts {
    let mut parts = DateParts::default();
    for column in columns {
        parts.merge(column.read(row));
    }
    parts
}

fn endpoint_level(columns: &[EndpointColumn]) -> TemporalLevel {
    columns.iter().map(|c| c.level).max().unwrap_or_default()
}

/// Category and value columns seen as one list, so endpoints may come from either.
struct Columns<'a> {
    metas: Vec<&'a ColumnMeta>,
    values: Vec<&'a [CellValue]>,
    category_count: usize,
}

impl<'a> Columns<'a> {
    fn new(view: &'a CategoricalView) -> Self {
        let categories = view.categories.iter().map(|c| (&c.source, c.values.as_slice()));
        let measures = view.values.iter().map(|v| (&v.source, v.values.as_slice()));
        let (metas, values): (Vec<_>, Vec<_>) = categories.chain(measures).unzip();
        Self {
            metas,
            values,
            category_count: view.categories.len(),
        }
    }

    fn endpoint(&self, indices: &[usize]) -> Vec<EndpointColumn<'a>> {
        indices
            .iter()
            .map(|idx| EndpointColumn {
                level: infer_column_level(self.metas[*idx], self.values[*idx]),
                values: self.values[*idx],
            })
            .collect()
    }

    fn value(&self, column: Option<usize>, row: usize) -> Option<&'a CellValue> {
        column
            .and_then(|c| self.values.get(c).copied())
            .and_then(|v| v.get(row))
    }
}

/// Endpoint columns from roles, or positionally: the first two temporal-looking
/// columns no other role claims.
fn endpoint_columns(columns: &Columns, binding: &RoleBinding) -> (Vec<usize>, Vec<usize>) {
    let start = binding.all(Role::StartYear).to_vec();
    let end = binding.all(Role::EndYear).to_vec();
    if !start.is_empty() || !end.is_empty() {
        return (start, end);
    }

    let bound = binding.bound_columns();
    let temporal: Vec<usize> = (0..columns.metas.len())
        .filter(|idx| !bound.contains(idx))
        .filter(|idx| infer_column_level(columns.metas[*idx], columns.values[*idx]) != TemporalLevel::None)
        .take(2)
        .collect();
    debug!(?temporal, "timeline: no startYear/endYear roles, using positional columns");
    match temporal.as_slice() {
        [s, e] => (vec![*s], vec![*e]),
        [s] => (vec![*s], Vec::new()),
        _ => (Vec::new(), Vec::new()),
    }
}

/// Build the timeline model. Unusable payloads give the empty model.
pub fn transform(view: &DataView, settings: &Settings) -> TimelineModel {
    let Some(categorical) = view.categorical_shape() else {
        debug!("timeline: no usable categorical data");
        return TimelineModel::default();
    };

    let columns = Columns::new(categorical);
    let binding = resolve_roles(columns.metas.iter().copied());
    let (start_idx, end_idx) = endpoint_columns(&columns, &binding);
    if start_idx.is_empty() && end_idx.is_empty() {
        warn!("timeline: no temporal columns found");
        return TimelineModel::default();
    }

    let label_col = binding.first(Role::Civilization).or_else(|| {
        // positional fallback: first category column nothing else claims
        let claimed: Vec<usize> = binding
            .bound_columns()
            .into_iter()
            .chain(start_idx.iter().copied())
            .chain(end_idx.iter().copied())
            .collect();
        (0..columns.category_count).find(|idx| !claimed.contains(idx))
    });
    let region_col = binding.first(Role::Region);
    let category_col = binding.first(Role::Category);

    let start_cols = columns.endpoint(&start_idx);
    let end_cols = columns.endpoint(&end_idx);

    let mut items = Vec::new();
    for row in 0..categorical.row_count() {
        let start = read_endpoint(&start_cols, row);
        let end = read_endpoint(&end_cols, row);
        let Some(mut item) = resolve_row(start, end, row, &settings.timeline) else {
            warn!(row, "timeline: neither endpoint resolves, dropping row");
            continue;
        };

        item.label = match columns.value(label_col, row) {
            Some(raw) => format_data_value(raw, row),
            None => format_data_value(&CellValue::Null, row),
        };
        item.region = region_col.map(|_| {
            format_group_value(columns.value(region_col, row).unwrap_or(&CellValue::Null))
        });
        item.category = category_col.map(|_| {
            format_group_value(columns.value(category_col, row).unwrap_or(&CellValue::Null))
        });
        items.push(item);
    }

    sort_items(&mut items, settings.timeline.sort_by);
    for (index, item) in items.iter_mut().enumerate() {
        item.point = DataPoint {
            x_value: format_date_ms(item.start_ms),
            y_value: item.label.clone(),
            value: (item.end_ms - item.start_ms) / MS_PER_DAY,
            group_value: item.region.clone().unwrap_or_else(|| DEFAULT_GROUP.to_string()),
            index,
        };
    }

    let min_ms = items.iter().map(|i| i.start_ms).fold(f64::INFINITY, f64::min);
    let max_ms = items.iter().map(|i| i.end_ms).fold(f64::NEG_INFINITY, f64::max);
    let (min_ms, max_ms) = if items.is_empty() { (0.0, 0.0) } else { (min_ms, max_ms) };

    debug!(items = items.len(), "timeline transform complete");

    TimelineModel {
        base: model_base(items.iter().map(|i| &i.point), None),
        regions: distinct(items.iter().filter_map(|i| i.region.clone())),
        categories: distinct(items.iter().filter_map(|i| i.category.clone())),
        start_level: endpoint_level(&start_cols),
        end_level: endpoint_level(&end_cols),
        min_ms,
        max_ms,
        data_points: items,
    }
}

/// Resolve one row's endpoints. An endpoint that cannot be resolved degrades
/// to its sibling; `None` when neither resolves.
fn resolve_row(mut start: DateParts, mut end: DateParts, row: usize, settings: &TimelineSettings) -> Option<TimelineItem> {
    let (start_ref, end_ref) = (start, end);
    start.borrow_year(&end_ref);
    end.borrow_year(&start_ref);

    let end_ms = |parts: &DateParts| match settings.date_cutoff {
        DateCutoff::PeriodEnd => parts.period_end_ms(),
        DateCutoff::PeriodStart => parts.start_ms(),
    };

    let (start_parts, end_parts, start_ms, end_ms, degraded) =
        match (start.start_ms(), end_ms(&end)) {
            (Some(s), Some(e)) => (start, end, s, e, false),
            (Some(s), None) => (start, start, s, end_ms(&start)?, true),
            (None, Some(_)) => (end, end, end.start_ms()?, end_ms(&end)?, true),
            (None, None) => return None,
        };

    if end_ms < start_ms {
        // usually a borrowed year from an unrelated endpoint
        warn!(row, start_ms, end_ms, "timeline: end precedes start");
    }

    Some(TimelineItem {
        start_ms,
        end_ms,
        start_year: start_parts.year,
        end_year: end_parts.year,
        start_level: start_parts.level(),
        end_level: end_parts.level(),
        degraded,
        source_row: row,
        ..Default::default()
    })
}

fn sort_items(items: &mut [TimelineItem], sort_by: TimelineSortBy) {
    let by_text = |a: &Option<String>, b: &Option<String>| match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    items.sort_by(|a, b| {
        let primary = match sort_by {
            TimelineSortBy::Time => Ordering::Equal,
            TimelineSortBy::Region => by_text(&a.region, &b.region),
            TimelineSortBy::Category => by_text(&a.category, &b.category),
            TimelineSortBy::End => a.end_ms.total_cmp(&b.end_ms),
            TimelineSortBy::Duration => {
                let da = a.end_ms - a.start_ms;
                let db = b.end_ms - b.start_ms;
                db.total_cmp(&da)
            }
        };
        primary
            .then_with(|| a.start_ms.total_cmp(&b.start_ms))
            .then_with(|| a.source_row.cmp(&b.source_row))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ChartModel;
    use crate::temporal::ymd_to_ms;
    use crate::transform::test_support::*;
    use chrono::{Datelike, NaiveDate};
    use pretty_assertions::assert_eq;

    fn ms(y: i32, m: u32, d: u32) -> f64 {
        ymd_to_ms(y, m, d).unwrap()
    }

    #[test]
    fn test_missing_start_degrades_to_end() {
        let dv = view(
            vec![
                category("Start Year", Some("startYear"), vec![CellValue::Null]),
                category("End Year", Some("endYear"), numbers(&[2020.0])),
            ],
            vec![],
        );
        let model = transform(&dv, &Settings::default());

        assert_eq!(model.data_points.len(), 1);
        let item = &model.data_points[0];
        assert_eq!(item.label, "Entry 1");
        assert_eq!(item.start_year, Some(2020));
        assert_eq!(item.end_year, Some(2020));
        assert!(item.degraded);
        assert_eq!(item.start_ms, ms(2020, 1, 1));
        assert_eq!(item.end_ms, ms(2021, 1, 1));
    }

    #[test]
    fn test_year_month_hierarchy() {
        let dv = view(
            vec![
                category("Name", Some("civilization"), texts(&["Launch"])),
                category("Start Year", Some("startYear"), numbers(&[2020.0])),
                category("Start Month", Some("startYear"), texts(&["Mar"])),
                category("End Year", Some("endYear"), numbers(&[2020.0])),
                category("End Month", Some("endYear"), texts(&["May"])),
            ],
            vec![],
        );
        let model = transform(&dv, &Settings::default());
        let item = &model.data_points[0];
        assert_eq!(item.label, "Launch");
        assert_eq!(item.start_ms, ms(2020, 3, 1));
        assert_eq!(item.end_ms, ms(2020, 6, 1));
        assert_eq!(item.start_level, TemporalLevel::Month);
        assert_eq!(model.start_level, TemporalLevel::Month);
        assert_eq!(item.point.value, 92.0);
        assert!(!item.degraded);
    }

    #[test]
    fn test_month_borrows_sibling_year() {
        let dv = view(
            vec![
                category("Start Month", Some("startYear"), texts(&["Nov"])),
                category("End Year", Some("endYear"), numbers(&[2021.0])),
            ],
            vec![],
        );
        let model = transform(&dv, &Settings::default());
        let item = &model.data_points[0];
        assert_eq!(item.start_ms, ms(2021, 11, 1));
        assert_eq!(item.end_ms, ms(2022, 1, 1));
        assert_eq!(item.start_year, Some(2021));
    }

    #[test]
    fn test_period_start_cutoff() {
        let dv = view(
            vec![
                category("Start Year", Some("startYear"), numbers(&[2019.0])),
                category("End Year", Some("endYear"), numbers(&[2021.0])),
            ],
            vec![],
        );
        let mut settings = Settings::default();
        settings.timeline.date_cutoff = DateCutoff::PeriodStart;
        let model = transform(&dv, &settings);
        assert_eq!(model.data_points[0].end_ms, ms(2021, 1, 1));
    }

    #[test]
    fn test_unresolvable_rows_dropped_and_sorted() {
        let dv = view(
            vec![
                category("Name", Some("civilization"), texts(&["Short", "Ghost", "Long"])),
                category("Region", Some("region"), texts(&["West", "East", "East"])),
                category("Start Year", Some("startYear"), vec![2000.0.into(), CellValue::Null, 1990.0.into()]),
                category("End Year", Some("endYear"), vec![2001.0.into(), CellValue::Null, 2010.0.into()]),
            ],
            vec![],
        );
        let mut settings = Settings::default();
        settings.timeline.sort_by = TimelineSortBy::Duration;
        let model = transform(&dv, &settings);

        let labels: Vec<&str> = model.data_points.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Long", "Short"]);
        assert_eq!(model.data_points[0].point.index, 0);
        assert_eq!(model.data_points[0].source_row, 2);
        assert_eq!(model.regions, vec!["East", "West"]);
        assert_eq!(model.base.groups, vec!["East", "West"]);
        assert_eq!(model.min_ms, ms(1990, 1, 1));
        assert_eq!(model.max_ms, ms(2011, 1, 1));
    }

    #[test]
    fn test_native_dates() {
        let dv = view(
            vec![
                category("From", Some("startYear"), vec![CellValue::date_ms(ms(2024, 1, 1))]),
                category("To", Some("endYear"), vec![CellValue::date_ms(ms(2024, 1, 11))]),
            ],
            vec![],
        );
        let model = transform(&dv, &Settings::default());
        let item = &model.data_points[0];
        assert_eq!(item.point.value, 10.0);
        assert_eq!(item.point.x_value, "2024-01-01");
        assert_eq!(item.start_level, TemporalLevel::Date);
    }

    #[test]
    fn test_epoch_seconds_in_year_column() {
        let dv = view(
            vec![
                category("Start Year", Some("startYear"), numbers(&[2000.0])),
                category("End Year", Some("endYear"), numbers(&[1e10])),
            ],
            vec![],
        );
        let model = transform(&dv, &Settings::default());
        let item = &model.data_points[0];
        assert_eq!(item.start_ms, ms(2000, 1, 1));
        assert_eq!(item.end_ms, 1e13);
        assert_eq!(item.end_year, Some(2286));
        assert!(!item.degraded);
    }

    #[test]
    fn test_out_of_range_year_degrades() {
        let dv = view(
            vec![
                category("Start Year", Some("startYear"), numbers(&[2000.0, 5e11])),
                category("End Year", Some("endYear"), numbers(&[5e11, 1e20])),
            ],
            vec![],
        );
        let model = transform(&dv, &Settings::default());

        assert_eq!(model.data_points.len(), 1);
        let item = &model.data_points[0];
        assert_eq!(item.source_row, 0);
        assert_eq!(item.end_year, Some(2000));
        assert_eq!(item.end_ms, ms(2001, 1, 1));
        assert!(item.degraded);
    }

    #[test]
    fn test_last_representable_year_has_no_period_end() {
        let last = NaiveDate::MAX.year();
        let parts = DateParts { year: Some(last), ..Default::default() };
        assert!(parts.start_ms().is_some());
        assert_eq!(parts.period_end_ms(), None);
        let december = DateParts { year: Some(last), month: Some(12), ..Default::default() };
        assert_eq!(december.period_end_ms(), None);
    }

    #[test]
    fn test_empty_view() {
        let model = transform(&DataView::default(), &Settings::default());
        assert!(model.is_empty());
        assert_eq!((model.min_ms, model.max_ms), (0.0, 0.0));
    }
}
