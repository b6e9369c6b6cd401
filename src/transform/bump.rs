//! Bump chart transformer: per-x ranking of series within each group.

use super::{distinct, model_base, AxisCollector, AxisOrder, CategoricalContext};
use crate::aggregate::{Accumulator, CompositeKey};
use crate::data::DataView;
use crate::ir::{BumpModel, BumpPoint, DataPoint};
use crate::roles::Role;
use crate::settings::Settings;
use std::collections::HashMap;
use tracing::debug;

pub fn transform(view: &DataView, _settings: &Settings) -> BumpModel {
    let Some(categorical) = view.categorical_shape() else {
        debug!("bump: no usable categorical data");
        return BumpModel::default();
    };
    let ctx = CategoricalContext::new(categorical);
    let measures = ctx.measure_columns();
    if measures.is_empty() {
        debug!("bump: no measure column");
        return BumpModel::default();
    }

    let x_cols = ctx.axis_columns(Role::XAxis);
    let secondary_col = ctx.values.first(Role::SecondaryValue);

    let mut axis = AxisCollector::default();
    let mut values = Accumulator::new();
    let mut secondary = Accumulator::new();
    let mut series_seen = Vec::new();
    let mut groups_seen = Vec::new();

    for row in 0..categorical.row_count() {
        let (path, keys) = ctx.path(&x_cols, row);
        let x = axis.observe(path, keys);
        let group = ctx.group_label(row);
        groups_seen.push(group.clone());

        for &measure in &measures {
            let Some(column) = categorical.values.get(measure) else {
                continue;
            };
            let series = ctx.series_label(row, measure, measures.len());
            let key = CompositeKey::new(group.as_str(), series.as_str(), x.as_str());
            values.add(key.clone(), column.value_at(row), column.highlight_at(row));
            if let Some(sec) = secondary_col.and_then(|c| categorical.values.get(c)) {
                secondary.add(key, sec.value_at(row), None);
            }
            series_seen.push(series);
        }
    }

    let series = distinct(series_seen);
    let groups = distinct(groups_seen);
    let x_order: Vec<String> = axis
        .ordered(AxisOrder::Keys, &ctx.directions(&x_cols))
        .into_iter()
        .map(|e| e.label)
        .collect();

    // rank per (group, x): highest value first, ties by series first-seen order
    let mut ranks: HashMap<CompositeKey, usize> = HashMap::new();
    for group in &groups {
        for x in &x_order {
            let mut ranked: Vec<(usize, f64)> = series
                .iter()
                .enumerate()
                .filter_map(|(idx, s)| {
                    let entry = values.get(&CompositeKey::new(group.as_str(), s.as_str(), x.as_str()))?;
                    entry.value.is_finite().then_some((idx, entry.value))
                })
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            for (rank, (idx, _)) in ranked.into_iter().enumerate() {
                ranks.insert(CompositeKey::new(group.as_str(), series[idx].as_str(), x.as_str()), rank + 1);
            }
        }
    }

    let mut points = Vec::new();
    for group in &groups {
        for s in &series {
            for x in &x_order {
                let key = CompositeKey::new(group.as_str(), s.as_str(), x.as_str());
                let (Some(rank), Some(entry)) = (ranks.get(&key), values.get(&key)) else {
                    continue;
                };
                points.push(BumpPoint {
                    point: DataPoint {
                        x_value: x.clone(),
                        y_value: s.clone(),
                        value: entry.value,
                        group_value: group.clone(),
                        index: points.len(),
                    },
                    series: s.clone(),
                    rank: *rank,
                    secondary_value: secondary.get(&key).map(|e| e.value).filter(|v| v.is_finite()),
                    highlighted: entry.highlighted,
                });
            }
        }
    }

    let max_rank = points.iter().map(|p| p.rank).max().unwrap_or(0);
    let mut base = model_base(points.iter().map(|p| &p.point), ctx.primary_measure());
    base.x_values = x_order;
    debug!(points = points.len(), series = series.len(), max_rank, "bump transform complete");

    BumpModel {
        base,
        data_points: points,
        series,
        max_rank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CellValue;
    use crate::ir::ChartModel;
    use crate::transform::test_support::*;
    use pretty_assertions::assert_eq;

    fn ranks_of(model: &BumpModel) -> Vec<(String, String, usize)> {
        model
            .data_points
            .iter()
            .map(|p| (p.series.clone(), p.point.x_value.clone(), p.rank))
            .collect()
    }

    #[test]
    fn test_ranks_per_x() {
        let dv = view(
            vec![
                category("Year", Some("xAxis"), numbers(&[2021.0, 2021.0, 2020.0, 2020.0])),
                category("Team", Some("legend"), texts(&["A", "B", "A", "B"])),
            ],
            vec![measure("Points", &[10.0, 20.0, 30.0, 5.0])],
        );
        let model = transform(&dv, &Settings::default());

        assert_eq!(model.series, vec!["A", "B"]);
        assert_eq!(model.base.x_values, vec!["2020", "2021"]);
        assert_eq!(
            ranks_of(&model),
            vec![
                ("A".to_string(), "2020".to_string(), 1),
                ("A".to_string(), "2021".to_string(), 2),
                ("B".to_string(), "2020".to_string(), 2),
                ("B".to_string(), "2021".to_string(), 1),
            ]
        );
        assert_eq!(model.max_rank, 2);
        let indices: Vec<usize> = model.data_points.iter().map(|p| p.point.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_ties_follow_series_order() {
        let dv = view(
            vec![
                category("Year", Some("xAxis"), numbers(&[2020.0, 2020.0])),
                category("Team", Some("legend"), texts(&["B", "A"])),
            ],
            vec![measure("Points", &[7.0, 7.0])],
        );
        let model = transform(&dv, &Settings::default());
        assert_eq!(
            ranks_of(&model),
            vec![("B".to_string(), "2020".to_string(), 1), ("A".to_string(), "2020".to_string(), 2)]
        );
    }

    #[test]
    fn test_missing_value_gets_no_rank() {
        let mut points = measure("Points", &[1.0, 2.0]);
        points.values[1] = CellValue::Null;
        let dv = view(
            vec![
                category("Year", Some("xAxis"), numbers(&[2020.0, 2020.0])),
                category("Team", Some("legend"), texts(&["A", "B"])),
            ],
            vec![points],
        );
        let model = transform(&dv, &Settings::default());
        assert_eq!(model.data_points.len(), 1);
        assert_eq!(model.data_points[0].series, "A");
        assert_eq!(model.max_rank, 1);
    }

    #[test]
    fn test_secondary_value_and_groups() {
        let mut units = measure("Units", &[3.0, 4.0]);
        units.source.roles.clear();
        units.source = units.source.with_role("secondaryValue");
        let dv = view(
            vec![
                category("Year", Some("xAxis"), numbers(&[2020.0, 2020.0])),
                category("League", Some("group"), texts(&["East", "West"])),
            ],
            vec![measure("Points", &[1.0, 2.0]), units],
        );
        let model = transform(&dv, &Settings::default());
        assert_eq!(model.base.groups, vec!["East", "West"]);
        assert!(model.data_points.iter().all(|p| p.rank == 1));
        assert_eq!(model.data_points[1].secondary_value, Some(4.0));
        assert_eq!(model.series, vec!["All"]);
    }

    #[test]
    fn test_empty_view() {
        assert!(transform(&DataView::default(), &Settings::default()).is_empty());
    }
}
