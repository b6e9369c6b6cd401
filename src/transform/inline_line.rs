//! Line chart with inline series labels.
//!
//! The x column is either the bound `xAxis` hierarchy or, failing that, the
//! best date-like category column. Date axes sort chronologically.

use super::{distinct, model_base, AxisCollector, AxisOrder, CategoricalContext};
use crate::aggregate::{Accumulator, CompositeKey};
use crate::coerce::{format_data_value, SortKey};
use crate::data::{CellValue, DataView};
use crate::ir::{DataPoint, LineModel, LinePoint, SeriesLabel};
use crate::roles::Role;
use crate::settings::Settings;
use crate::temporal::{classify_with_host_type, detect_date_axis, score_date_column};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

pub fn transform(view: &DataView, _settings: &Settings) -> LineModel {
    let Some(categorical) = view.categorical_shape() else {
        debug!("inline-line: no usable categorical data");
        return LineModel::default();
    };
    let ctx = CategoricalContext::new(categorical);
    let measures = ctx.measure_columns();
    if measures.is_empty() {
        debug!("inline-line: no measure column");
        return LineModel::default();
    }

    let bound = ctx.categories.all(Role::XAxis);
    let (x_cols, date_col) = match bound {
        [] => match detect_date_axis(&categorical.categories) {
            Some(candidate) => (vec![candidate.column], Some(candidate.column)),
            None => (ctx.axis_columns(Role::XAxis), None),
        },
        [single] => {
            let column = &categorical.categories[*single];
            let is_date = score_date_column(*single, &column.source, &column.values).is_some();
            (vec![*single], is_date.then_some(*single))
        }
        many => (many.to_vec(), None),
    };
    let host_temporal = date_col
        .and_then(|c| categorical.categories.get(c))
        .map(|c| c.source.is_temporal())
        .unwrap_or(false);

    let mut axis = AxisCollector::default();
    let mut x_ms: HashMap<String, f64> = HashMap::new();
    let mut acc = Accumulator::new();
    let mut series_seen = Vec::new();
    let mut groups_seen = Vec::new();

    for row in 0..categorical.row_count() {
        let x = match date_col {
            Some(col) => {
                let raw = categorical.category_value(col, row);
                match classify_with_host_type(raw, host_temporal).ms() {
                    Some(ms) => {
                        let label = axis.observe(vec![format_data_value(raw, row)], vec![SortKey::Number(ms)]);
                        x_ms.insert(label.clone(), ms);
                        label
                    }
                    None => {
                        let (path, keys) = ctx.path(&x_cols, row);
                        axis.observe(path, keys)
                    }
                }
            }
            None if x_cols.is_empty() => {
                let label = format_data_value(&CellValue::Null, row);
                axis.observe(vec![label], vec![SortKey::Number(row as f64)])
            }
            None => {
                let (path, keys) = ctx.path(&x_cols, row);
                axis.observe(path, keys)
            }
        };
        let group = ctx.group_label(row);
        groups_seen.push(group.clone());

        for &measure in &measures {
            let Some(column) = categorical.values.get(measure) else {
                continue;
            };
            let series = ctx.series_label(row, measure, measures.len());
            acc.add(
                CompositeKey::new(group.as_str(), series.as_str(), x.as_str()),
                column.value_at(row),
                column.highlight_at(row),
            );
            series_seen.push((group.clone(), series));
        }
    }

    let order = if date_col.is_some() { AxisOrder::Keys } else { AxisOrder::NumericOnly };
    let x_order: Vec<String> = axis
        .ordered(order, &ctx.directions(&x_cols))
        .into_iter()
        .map(|e| e.label)
        .collect();

    // (group, series) in first-seen order, grouped by group
    let groups = distinct(groups_seen);
    let mut series_by_group: IndexMap<String, Vec<String>> =
        groups.iter().map(|g| (g.clone(), Vec::new())).collect();
    for (group, series) in series_seen {
        let list = series_by_group.entry(group).or_default();
        if !list.contains(&series) {
            list.push(series);
        }
    }

    let mut points: Vec<LinePoint> = Vec::new();
    let mut labels = Vec::new();
    for (group, series_list) in &series_by_group {
        for series in series_list {
            let mut anchor: Option<usize> = None;
            for x in &x_order {
                let key = CompositeKey::new(group.as_str(), series.as_str(), x.as_str());
                let Some(entry) = acc.get(&key) else {
                    continue;
                };
                if entry.value.is_finite() {
                    anchor = Some(points.len());
                }
                points.push(LinePoint {
                    point: DataPoint {
                        x_value: x.clone(),
                        y_value: series.clone(),
                        value: entry.value,
                        group_value: group.clone(),
                        index: points.len(),
                    },
                    x_ms: x_ms.get(x).copied(),
                    highlighted: entry.highlighted,
                });
            }
            let anchor_point = anchor.map(|idx| &points[idx].point);
            labels.push(SeriesLabel {
                series: series.clone(),
                group_value: group.clone(),
                anchor_index: anchor,
                x_value: anchor_point.map(|p| p.x_value.clone()),
                value: anchor_point.map(|p| p.value),
            });
        }
    }

    let mut base = model_base(points.iter().map(|p| &p.point), ctx.primary_measure());
    base.x_values = x_order;
    base.groups = groups;
    debug!(
        points = points.len(),
        series = labels.len(),
        date_axis = date_col.is_some(),
        "inline-line transform complete"
    );

    LineModel {
        base,
        data_points: points,
        series: labels,
        x_is_date: date_col.is_some(),
    }
}
