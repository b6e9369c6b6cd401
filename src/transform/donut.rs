//! Donut transformer: slices with shares and cumulative angles per group.

use super::{distinct, model_base, CategoricalContext};
use crate::aggregate::{Accumulated, Accumulator, CompositeKey};
use crate::coerce::{format_group_value, DEFAULT_GROUP};
use crate::data::DataView;
use crate::ir::{DataPoint, DonutModel, DonutSlice};
use crate::roles::Role;
use crate::settings::{Settings, SliceOrder};
use indexmap::IndexMap;
use tracing::debug;

pub fn transform(view: &DataView, settings: &Settings) -> DonutModel {
    let Some(categorical) = view.categorical_shape() else {
        debug!("donut: no usable categorical data");
        return DonutModel::default();
    };
    let ctx = CategoricalContext::new(categorical);
    let measures = ctx.measure_columns();
    if measures.is_empty() {
        debug!("donut: no measure column");
        return DonutModel::default();
    }

    let slice_col = ctx.categories.first_or(
        Role::Legend,
        ctx.categories.first(Role::Category).or_else(|| ctx.fallback_category()),
    );
    let series_name = ctx
        .primary_measure()
        .map(|m| m.display_name.clone())
        .unwrap_or_else(|| DEFAULT_GROUP.to_string());

    let mut acc = Accumulator::new();
    for row in 0..categorical.row_count() {
        let group = ctx.group_label(row);
        for &measure in &measures {
            let Some(column) = categorical.values.get(measure) else {
                continue;
            };
            // without a slice column, each measure is a slice
            let slice = match slice_col {
                Some(col) => format_group_value(categorical.category_value(col, row)),
                None => ctx.series_label(row, measure, measures.len()),
            };
            acc.add(CompositeKey::new(group.as_str(), slice, ""), column.value_at(row), column.highlight_at(row));
        }
    }

    let mut by_group: IndexMap<String, Vec<(String, Accumulated)>> = IndexMap::new();
    for (key, entry) in acc.into_entries() {
        if !entry.value.is_finite() {
            continue;
        }
        by_group.entry(key.group).or_default().push((key.series, entry));
    }

    let mut points = Vec::new();
    let mut totals = IndexMap::new();
    for (group, mut slices) in by_group {
        if settings.donut.sort_slices == SliceOrder::ValueDescending {
            slices.sort_by(|a, b| b.1.value.total_cmp(&a.1.value));
        }
        let total: f64 = slices.iter().map(|(_, e)| e.value).filter(|v| *v > 0.0).sum();
        let mut cursor = 0.0;
        for (slice, entry) in slices {
            let share = if total > 0.0 && entry.value > 0.0 {
                entry.value / total
            } else {
                0.0
            };
            let start_fraction = cursor;
            cursor += share;
            points.push(DonutSlice {
                point: DataPoint {
                    x_value: slice,
                    y_value: series_name.clone(),
                    value: entry.value,
                    group_value: group.clone(),
                    index: points.len(),
                },
                share,
                start_fraction,
                end_fraction: cursor,
                highlighted: entry.highlighted,
            });
        }
        totals.insert(group, total);
    }

    let mut base = model_base(points.iter().map(|p| &p.point), ctx.primary_measure());
    base.groups = distinct(totals.keys().map(|g| g.as_str()));
    debug!(slices = points.len(), groups = totals.len(), "donut transform complete");

    DonutModel {
        base,
        data_points: points,
        totals,
    }
}
