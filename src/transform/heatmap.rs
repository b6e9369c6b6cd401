//! Heatmap transformer: matrix (or flattened categorical) data to a grid of
//! cells with hierarchical headers and optional totals.

use super::{distinct, CategoricalContext};
use crate::aggregate::{Accumulator, CompositeKey};
use crate::coerce::{compare_key_paths, format_group_value, join_labels, sort_key, SortKey, DEFAULT_GROUP};
use crate::data::{CategoricalView, ColumnMeta, DataView, MatrixHierarchy, MatrixNode, MatrixView, SortDirection, ViewShape};
use crate::hierarchy::{build_axis_hierarchy, encode_path, AxisHierarchy, Edge, TOTAL_KEY};
use crate::ir::{DataPoint, GroupTotals, HeatmapModel, HeatmapPoint, ModelBase};
use crate::roles::{resolve_roles, Role};
use crate::scale::{merge_ranges, ValueRange};
use crate::settings::{ColumnTotalPosition, RowTotalPosition, Settings, TotalsSettings};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// One axis leaf before hierarchy construction.
#[derive(Debug, Clone)]
struct Leaf {
    key: String,
    path: Vec<String>,
    keys: Vec<SortKey>,
    /// Sort direction of the source behind each key.
    directions: Vec<Option<SortDirection>>,
}

/// One label on a matrix axis path, with the sort direction of its source.
type PathPart = (String, SortKey, Option<SortDirection>);

#[derive(Debug, Clone)]
struct RowLeaf {
    group: String,
    leaf: Leaf,
}

#[derive(Debug)]
struct CellInput {
    group: String,
    y_key: String,
    x_key: String,
    base: Option<f64>,
    highlight: Option<f64>,
}

/// Both input shapes reduce to this before aggregation.
#[derive(Debug, Default)]
struct Grid {
    x_leaves: Vec<Leaf>,
    row_leaves: Vec<RowLeaf>,
    cells: Vec<CellInput>,
    measure: Option<ColumnMeta>,
    x_display_name: Option<String>,
    y_display_name: Option<String>,
}

/// Build the heatmap model. Unusable payloads give the empty model.
pub fn transform(view: &DataView, settings: &Settings) -> HeatmapModel {
    let grid = match view.shape() {
        ViewShape::Matrix(matrix) => Some(grid_from_matrix(matrix)),
        ViewShape::Categorical(categorical) => grid_from_categorical(categorical),
        ViewShape::Empty => None,
    };
    match grid {
        Some(grid) => build_model(grid, &settings.totals),
        None => {
            debug!("heatmap: no usable matrix or categorical data");
            HeatmapModel::default()
        }
    }
}

// =============================================================================
// Matrix input
// =============================================================================

/// Labels one node contributes to an axis path, plus any group parts.
struct LevelParts {
    label: Option<PathPart>,
    group: Vec<String>,
}

/// Split a node's level values by role. Only parts whose source carries
/// `axis_role` make up the label; with no role-tagged parts at all, every
/// part does.
fn level_parts(hierarchy: &MatrixHierarchy, node: &MatrixNode, axis_role: Role) -> LevelParts {
    let mut axis = Vec::new();
    let mut group = Vec::new();
    let mut other = Vec::new();

    for lv in &node.level_values {
        let source = hierarchy.source_of(node, lv);
        let has = |role: Role| source.map(|s| s.has_role(role.name())).unwrap_or(false);
        let direction = source.and_then(|s| s.sort);
        if has(axis_role) {
            axis.push((&lv.value, direction));
        } else if has(Role::Group) {
            group.push(format_group_value(&lv.value));
        } else {
            other.push((&lv.value, direction));
        }
    }

    let used = if !axis.is_empty() {
        axis
    } else if group.is_empty() {
        other
    } else {
        Vec::new()
    };
    let label = used.first().map(|(first, _)| {
        let parts: Vec<String> = used.iter().map(|(v, _)| format_group_value(v)).collect();
        let direction = used.iter().find_map(|(_, d)| *d);
        (join_labels(&parts), sort_key(first), direction)
    });
    LevelParts { label, group }
}

fn subtree_leaf_count(node: &MatrixNode) -> usize {
    if node.is_leaf() {
        1
    } else {
        node.children.iter().map(subtree_leaf_count).sum()
    }
}

/// Column leaves with their slot position. Host subtotal columns are skipped
/// but still advance the slot counter.
fn walk_columns(
    hierarchy: &MatrixHierarchy,
    node: &MatrixNode,
    path: &mut Vec<PathPart>,
    slot: &mut usize,
    out: &mut Vec<(usize, Leaf)>,
) {
    for child in &node.children {
        if child.is_subtotal {
            *slot += subtree_leaf_count(child);
            continue;
        }
        let parts = level_parts(hierarchy, child, Role::XAxis);
        let pushed = parts.label.is_some();
        if let Some(label) = parts.label {
            path.push(label);
        }
        if child.is_leaf() {
            out.push((*slot, leaf_from(path)));
            *slot += 1;
        } else {
            walk_columns(hierarchy, child, path, slot, out);
        }
        if pushed {
            path.pop();
        }
    }
}

fn walk_rows<'m>(
    hierarchy: &MatrixHierarchy,
    node: &'m MatrixNode,
    path: &mut Vec<PathPart>,
    groups: &mut Vec<String>,
    out: &mut Vec<(RowLeaf, &'m MatrixNode)>,
) {
    for child in &node.children {
        if child.is_subtotal {
            continue;
        }
        let parts = level_parts(hierarchy, child, Role::YAxis);
        let pushed = parts.label.is_some();
        let group_parts = parts.group.len();
        if let Some(label) = parts.label {
            path.push(label);
        }
        groups.extend(parts.group);

        if child.is_leaf() {
            let group = if groups.is_empty() {
                DEFAULT_GROUP.to_string()
            } else {
                join_labels(groups)
            };
            out.push((RowLeaf { group, leaf: leaf_from(path) }, child));
        } else {
            walk_rows(hierarchy, child, path, groups, out);
        }

        groups.truncate(groups.len() - group_parts);
        if pushed {
            path.pop();
        }
    }
}

fn leaf_from(path: &[PathPart]) -> Leaf {
    let labels: Vec<String> = path.iter().map(|(l, _, _)| l.clone()).collect();
    Leaf {
        key: encode_path(&labels),
        keys: path.iter().map(|(_, k, _)| k.clone()).collect(),
        directions: path.iter().map(|(_, _, d)| *d).collect(),
        path: labels,
    }
}

fn level_display_name(hierarchy: &MatrixHierarchy, role: Role) -> Option<String> {
    let sources: Vec<&ColumnMeta> = hierarchy.levels.iter().flat_map(|l| l.sources.iter()).collect();
    let tagged: Vec<&str> = sources
        .iter()
        .filter(|s| s.has_role(role.name()))
        .map(|s| s.display_name.as_str())
        .collect();
    let names = if tagged.is_empty() {
        sources
            .iter()
            .filter(|s| !s.has_role(Role::Group.name()))
            .map(|s| s.display_name.as_str())
            .collect()
    } else {
        tagged
    };
    if names.is_empty() {
        None
    } else {
        Some(join_labels(&names))
    }
}

fn grid_from_matrix(matrix: &MatrixView) -> Grid {
    let measure_count = matrix.value_sources.len().max(1);
    let measure_idx = resolve_roles(matrix.value_sources.iter())
        .first(Role::Value)
        .unwrap_or(0);
    let measure = matrix.value_sources.get(measure_idx).cloned();

    let mut columns = Vec::new();
    if matrix.columns.root.children.is_empty() {
        // No column grouping: the measure itself is the only column
        let name = measure.as_ref().map(|m| m.display_name.clone()).unwrap_or_default();
        columns.push((0, leaf_from(&[(name.clone(), SortKey::Text(name), None)])));
    } else {
        let mut slot = 0;
        walk_columns(&matrix.columns, &matrix.columns.root, &mut Vec::new(), &mut slot, &mut columns);
    }

    if columns.iter().all(|(_, leaf)| leaf.keys.iter().all(SortKey::is_numeric)) {
        columns.sort_by(|(_, a), (_, b)| compare_key_paths(&a.keys, &b.keys, &a.directions));
    }

    let mut rows = Vec::new();
    walk_rows(&matrix.rows, &matrix.rows.root, &mut Vec::new(), &mut Vec::new(), &mut rows);

    let mut cells = Vec::new();
    for (row, node) in &rows {
        for (col_slot, x_leaf) in &columns {
            let slot = col_slot * measure_count + measure_idx;
            let Some(cell) = node.values.get(&slot) else {
                continue;
            };
            cells.push(CellInput {
                group: row.group.clone(),
                y_key: row.leaf.key.clone(),
                x_key: x_leaf.key.clone(),
                base: cell.value.as_number(),
                highlight: cell.highlight.as_ref().and_then(|h| h.as_number()),
            });
        }
    }

    Grid {
        x_leaves: columns.into_iter().map(|(_, leaf)| leaf).collect(),
        row_leaves: rows.into_iter().map(|(row, _)| row).collect(),
        cells,
        measure,
        x_display_name: level_display_name(&matrix.columns, Role::XAxis),
        y_display_name: level_display_name(&matrix.rows, Role::YAxis),
    }
}

// =============================================================================
// Categorical input
// =============================================================================

fn grid_from_categorical(view: &CategoricalView) -> Option<Grid> {
    let ctx = CategoricalContext::new(view);
    let measure_col = *ctx.measure_columns().first()?;
    let measure = view.values.get(measure_col)?;

    let x_cols = ctx.axis_columns(Role::XAxis);
    let y_cols: Vec<usize> = match ctx.categories.all(Role::YAxis) {
        [] => ctx
            .unbound_categories()
            .into_iter()
            .filter(|c| !x_cols.contains(c))
            .take(1)
            .collect(),
        bound => bound.to_vec(),
    };

    let measure_name = measure.source.display_name.clone();
    let leaf_for = |cols: &[usize], row: usize| -> Leaf {
        let (path, keys) = if cols.is_empty() {
            (vec![measure_name.clone()], vec![SortKey::Text(measure_name.to_lowercase())])
        } else {
            ctx.path(cols, row)
        };
        let directions = if cols.is_empty() { vec![None] } else { ctx.directions(cols) };
        Leaf { key: encode_path(&path), path, keys, directions }
    };

    let mut x_leaves: IndexMap<String, Leaf> = IndexMap::new();
    let mut row_leaves: IndexMap<(String, String), RowLeaf> = IndexMap::new();
    let mut cells = Vec::new();

    for row in 0..view.row_count() {
        let x_leaf = leaf_for(&x_cols, row);
        let y_leaf = leaf_for(&y_cols, row);
        let group = ctx.group_label(row);

        cells.push(CellInput {
            group: group.clone(),
            y_key: y_leaf.key.clone(),
            x_key: x_leaf.key.clone(),
            base: measure.value_at(row),
            highlight: measure.highlight_at(row),
        });
        x_leaves.entry(x_leaf.key.clone()).or_insert(x_leaf);
        row_leaves
            .entry((group.clone(), y_leaf.key.clone()))
            .or_insert(RowLeaf { group, leaf: y_leaf });
    }

    let mut x_leaves: Vec<Leaf> = x_leaves.into_values().collect();
    x_leaves.sort_by(|a, b| compare_key_paths(&a.keys, &b.keys, &a.directions));

    let group_order: HashMap<String, usize> = distinct(row_leaves.values().map(|r| r.group.as_str()))
        .into_iter()
        .enumerate()
        .map(|(i, g)| (g, i))
        .collect();
    let mut row_leaves: Vec<RowLeaf> = row_leaves.into_values().collect();
    row_leaves.sort_by(|a, b| {
        group_order[&a.group]
            .cmp(&group_order[&b.group])
            .then_with(|| compare_key_paths(&a.leaf.keys, &b.leaf.keys, &a.leaf.directions))
    });

    Some(Grid {
        x_leaves,
        row_leaves,
        cells,
        measure: Some(measure.source.clone()),
        x_display_name: ctx.display_name(&x_cols),
        y_display_name: ctx.display_name(&y_cols),
    })
}

// =============================================================================
// Model assembly
// =============================================================================

fn point(x: &str, y: &str, value: f64, group: &str, index: usize) -> DataPoint {
    DataPoint {
        x_value: x.to_string(),
        y_value: y.to_string(),
        value,
        group_value: group.to_string(),
        index,
    }
}

/// `x` and `y` are `(leaf key, label)` pairs.
fn push_total(points: &mut Vec<HeatmapPoint>, x: (&str, &str), y: (&str, &str), value: f64, group: &str) {
    let index = points.len();
    points.push(HeatmapPoint {
        point: point(x.1, y.1, value, group, index),
        x_key: x.0.to_string(),
        y_key: y.0.to_string(),
        highlighted: false,
        is_total: true,
    });
}

fn build_model(grid: Grid, totals_settings: &TotalsSettings) -> HeatmapModel {
    let mut acc = Accumulator::new();
    for cell in grid.cells {
        acc.add(CompositeKey::new(cell.group, cell.y_key, cell.x_key), cell.base, cell.highlight);
    }

    // group -> y leaves in order, deduplicated by key
    let mut rows_by_group: IndexMap<String, IndexMap<String, Vec<String>>> = IndexMap::new();
    for row in grid.row_leaves {
        rows_by_group
            .entry(row.group)
            .or_default()
            .entry(row.leaf.key)
            .or_insert(row.leaf.path);
    }

    let mut points: Vec<HeatmapPoint> = Vec::new();
    let mut totals: IndexMap<String, GroupTotals> = IndexMap::new();
    let mut ranges: Vec<ValueRange> = Vec::new();

    for (group, rows) in &rows_by_group {
        let mut group_totals = GroupTotals::default();
        let mut range = ValueRange::default();
        for (y_key, y_path) in rows {
            let y_label = join_labels(y_path);
            for x in &grid.x_leaves {
                let key = CompositeKey::new(group.as_str(), y_key.as_str(), x.key.as_str());
                let Some(entry) = acc.get(&key) else {
                    continue;
                };
                let finite = if entry.value.is_finite() { entry.value } else { 0.0 };
                *group_totals.row_totals_by_x.entry(x.key.clone()).or_insert(0.0) += finite;
                *group_totals.col_totals_by_y.entry(y_key.clone()).or_insert(0.0) += finite;
                group_totals.grand_total += finite;
                range.include(entry.value);

                points.push(HeatmapPoint {
                    point: point(&join_labels(&x.path), &y_label, entry.value, group, points.len()),
                    x_key: x.key.clone(),
                    y_key: y_key.clone(),
                    highlighted: entry.highlighted,
                    is_total: false,
                });
            }
        }
        totals.insert(group.clone(), group_totals);
        ranges.push(range);
    }

    let x_hierarchy = build_axis_hierarchy(
        grid.x_leaves.iter().map(|l| l.key.clone()).collect(),
        grid.x_leaves.iter().map(|l| l.path.clone()).collect(),
    );
    let mut y_hierarchies: IndexMap<String, AxisHierarchy> = rows_by_group
        .iter()
        .map(|(group, rows)| {
            let hierarchy = build_axis_hierarchy(rows.keys().cloned().collect(), rows.values().cloned().collect());
            (group.clone(), hierarchy)
        })
        .collect();

    let x_hierarchy = append_totals(
        &mut points,
        &totals,
        &grid.x_leaves,
        &rows_by_group,
        x_hierarchy,
        &mut y_hierarchies,
        totals_settings,
    );

    let grand_total: f64 = totals.values().map(|t| t.grand_total).sum();
    let (min_value, max_value) = merge_ranges(&ranges).bounds();
    let measure = grid.measure.as_ref();

    debug!(
        points = points.len(),
        groups = rows_by_group.len(),
        x_leaves = x_hierarchy.leaf_count(),
        "heatmap transform complete"
    );

    HeatmapModel {
        base: ModelBase {
            x_values: x_hierarchy.leaf_paths.iter().map(|p| join_labels(p)).collect(),
            y_values: distinct(
                y_hierarchies
                    .values()
                    .flat_map(|h| h.leaf_paths.iter().map(|p| join_labels(p))),
            ),
            groups: rows_by_group.keys().cloned().collect(),
            max_value,
            min_value,
            value_format_string: measure.and_then(|m| m.format.clone()),
            value_display_name: measure.map(|m| m.display_name.clone()),
        },
        data_points: points,
        x_hierarchy,
        y_hierarchies,
        totals,
        grand_total,
        x_display_name: grid.x_display_name,
        y_display_name: grid.y_display_name,
    }
}

/// Append total points after the regular ones and splice total leaves into
/// the already-built hierarchies. Returns the (possibly extended) x hierarchy.
fn append_totals(
    points: &mut Vec<HeatmapPoint>,
    totals: &IndexMap<String, GroupTotals>,
    x_leaves: &[Leaf],
    rows_by_group: &IndexMap<String, IndexMap<String, Vec<String>>>,
    x_hierarchy: AxisHierarchy,
    y_hierarchies: &mut IndexMap<String, AxisHierarchy>,
    settings: &TotalsSettings,
) -> AxisHierarchy {
    let label = settings.label.as_str();
    let show_rows = settings.show_row_total;
    let show_cols = settings.show_column_total;

    for (group, group_totals) in totals {
        if show_rows {
            for x in x_leaves {
                if let Some(value) = group_totals.row_totals_by_x.get(&x.key) {
                    push_total(points, (&x.key, &join_labels(&x.path)), (TOTAL_KEY, label), *value, group);
                }
            }
        }
        if show_cols {
            let rows = rows_by_group.get(group);
            for (y_key, y_path) in rows.into_iter().flatten() {
                if let Some(value) = group_totals.col_totals_by_y.get(y_key) {
                    push_total(points, (TOTAL_KEY, label), (y_key, &join_labels(y_path)), *value, group);
                }
            }
        }
        if show_rows && show_cols {
            push_total(points, (TOTAL_KEY, label), (TOTAL_KEY, label), group_totals.grand_total, group);
        }
    }

    if show_rows {
        let edge = match settings.row_total_position {
            RowTotalPosition::Top => Edge::Leading,
            RowTotalPosition::Bottom => Edge::Trailing,
        };
        for hierarchy in y_hierarchies.values_mut() {
            *hierarchy = hierarchy.with_total_leaf(label, edge);
        }
    }
    if show_cols {
        let edge = match settings.column_total_position {
            ColumnTotalPosition::Left => Edge::Leading,
            ColumnTotalPosition::Right => Edge::Trailing,
        };
        x_hierarchy.with_total_leaf(label, edge)
    } else {
        x_hierarchy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ChartModel;
    use crate::transform::test_support::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn leaf(level: usize, label: Value, values: Value) -> Value {
        json!({
            "level": level,
            "levelValues": [{ "value": label, "levelSourceIndex": 0 }],
            "values": values
        })
    }

    fn column(level: usize, label: Value) -> Value {
        leaf(level, label, json!({}))
    }

    fn source(name: &str, role: &str) -> Value {
        json!({ "displayName": name, "roles": { role: true } })
    }

    fn matrix_view(rows: Value, row_levels: Value, columns: Value, col_levels: Value) -> DataView {
        DataView::from_json(&json!({
            "matrix": {
                "rows": { "root": { "children": rows }, "levels": row_levels },
                "columns": { "root": { "children": columns }, "levels": col_levels },
                "valueSources": [{ "displayName": "Sales", "format": "#,0", "roles": { "value": true } }]
            }
        }))
        .unwrap()
    }

    fn simple_matrix() -> DataView {
        matrix_view(
            json!([
                leaf(0, json!("North"), json!({ "0": { "value": 5 }, "1": { "value": 3 } })),
                leaf(0, json!("South"), json!({ "0": { "value": 2 }, "1": { "value": 4 } })),
            ]),
            json!([{ "sources": [source("Region", "yAxis")] }]),
            json!([column(0, json!(2025)), column(0, json!(2024))]),
            json!([{ "sources": [source("Year", "xAxis")] }]),
        )
    }

    fn values_of(model: &HeatmapModel) -> Vec<(String, String, f64)> {
        model
            .data_points
            .iter()
            .map(|p| (p.point.x_value.clone(), p.point.y_value.clone(), p.point.value))
            .collect()
    }

    #[test]
    fn test_matrix_numeric_columns_resorted() {
        let model = transform(&simple_matrix(), &Settings::default());

        assert_eq!(model.base.x_values, vec!["2024", "2025"]);
        assert_eq!(model.base.y_values, vec!["North", "South"]);
        assert_eq!(
            values_of(&model),
            vec![
                ("2024".to_string(), "North".to_string(), 3.0),
                ("2025".to_string(), "North".to_string(), 5.0),
                ("2024".to_string(), "South".to_string(), 4.0),
                ("2025".to_string(), "South".to_string(), 2.0),
            ]
        );
        let indices: Vec<usize> = model.data_points.iter().map(|p| p.point.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!((model.base.min_value, model.base.max_value), (2.0, 5.0));
        assert_eq!(model.base.value_format_string.as_deref(), Some("#,0"));
        assert_eq!(model.x_display_name.as_deref(), Some("Year"));
        assert_eq!(model.base.groups, vec!["All"]);
    }

    #[test]
    fn test_column_sort_follows_labelled_level() {
        let mut east = column(0, json!("East"));
        east["children"] = json!([column(1, json!(2024)), column(1, json!(2025))]);
        let view = matrix_view(
            json!([leaf(0, json!("North"), json!({ "0": { "value": 1 }, "1": { "value": 2 } }))]),
            json!([{ "sources": [source("Region", "yAxis")] }]),
            json!([east]),
            json!([
                { "sources": [source("Division", "group")] },
                { "sources": [{ "displayName": "Year", "roles": { "xAxis": true }, "sort": "descending" }] }
            ]),
        );
        let model = transform(&view, &Settings::default());
        assert_eq!(model.base.x_values, vec!["2025", "2024"]);
        assert_eq!(
            values_of(&model),
            vec![
                ("2025".to_string(), "North".to_string(), 2.0),
                ("2024".to_string(), "North".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn test_subtotal_column_skipped_but_counted() {
        let mut subtotal = column(0, json!("Total"));
        subtotal["isSubtotal"] = json!(true);
        let view = matrix_view(
            json!([leaf(0, json!("North"), json!({ "0": { "value": 1 }, "1": { "value": 99 }, "2": { "value": 7 } }))]),
            json!([{ "sources": [source("Region", "yAxis")] }]),
            json!([column(0, json!("Jan")), subtotal, column(0, json!("Feb"))]),
            json!([{ "sources": [source("Month", "xAxis")] }]),
        );
        let model = transform(&view, &Settings::default());
        assert_eq!(
            values_of(&model),
            vec![
                ("Jan".to_string(), "North".to_string(), 1.0),
                ("Feb".to_string(), "North".to_string(), 7.0),
            ]
        );
    }

    #[test]
    fn test_matrix_highlight_overrides() {
        let view = matrix_view(
            json!([leaf(0, json!("North"), json!({ "0": { "value": 10, "highlight": 4 } }))]),
            json!([{ "sources": [source("Region", "yAxis")] }]),
            json!([column(0, json!("Jan"))]),
            json!([{ "sources": [source("Month", "xAxis")] }]),
        );
        let model = transform(&view, &Settings::default());
        assert_eq!(model.data_points[0].point.value, 4.0);
        assert!(model.data_points[0].highlighted);
    }

    #[test]
    fn test_group_level_splits_row_hierarchies() {
        let mut east = column(0, json!("East"));
        east["children"] = json!([
            leaf(1, json!("Store 1"), json!({ "0": { "value": 1 } })),
            leaf(1, json!("Store 2"), json!({ "0": { "value": 2 } })),
        ]);
        let mut west = column(0, json!("West"));
        west["children"] = json!([leaf(1, json!("Store 9"), json!({ "0": { "value": 3 } }))]);

        let view = matrix_view(
            json!([east, west]),
            json!([
                { "sources": [source("Territory", "group")] },
                { "sources": [source("Store", "yAxis")] }
            ]),
            json!([column(0, json!("Jan"))]),
            json!([{ "sources": [source("Month", "xAxis")] }]),
        );
        let model = transform(&view, &Settings::default());

        assert_eq!(model.base.groups, vec!["East", "West"]);
        assert_eq!(model.y_hierarchies["East"].leaf_count(), 2);
        assert_eq!(model.y_hierarchies["West"].leaf_count(), 1);
        assert_eq!(model.y_hierarchies["East"].depth, 1);
        assert_eq!(model.totals["East"].grand_total, 3.0);
        assert_eq!(model.grand_total, 6.0);
    }

    #[test]
    fn test_totals_and_splicing() {
        let mut settings = Settings::default();
        settings.totals.show_row_total = true;
        settings.totals.show_column_total = true;
        settings.totals.row_total_position = RowTotalPosition::Top;

        let model = transform(&simple_matrix(), &settings);
        let totals = &model.totals["All"];
        assert_eq!(totals.grand_total, 14.0);

        let regular: Vec<&HeatmapPoint> = model.data_points.iter().filter(|p| !p.is_total).collect();
        let regular_sum: f64 = regular.iter().map(|p| p.point.value).sum();
        assert_eq!(totals.grand_total, regular_sum);

        let key_2024 = encode_path(&["2024"]);
        let key_north = encode_path(&["North"]);
        assert_eq!(totals.row_totals_by_x[&key_2024], 7.0);
        assert_eq!(totals.col_totals_by_y[&key_north], 8.0);

        // totals come after every regular point
        let first_total = model.data_points.iter().position(|p| p.is_total).unwrap();
        assert_eq!(first_total, 4);
        assert!(model.data_points[first_total..].iter().all(|p| p.is_total));
        assert_eq!(model.data_points.len(), 4 + 2 + 2 + 1);

        let corner = model.data_points.last().unwrap();
        assert_eq!((corner.x_key.as_str(), corner.y_key.as_str()), (TOTAL_KEY, TOTAL_KEY));
        assert_eq!(corner.point.value, 14.0);

        assert_eq!(model.x_hierarchy.leaf_keys.last().unwrap(), TOTAL_KEY);
        assert_eq!(model.y_hierarchies["All"].leaf_keys[0], TOTAL_KEY);
        assert_eq!(model.base.x_values, vec!["2024", "2025", "Total"]);

        // totals stay out of the color range
        assert_eq!(model.base.max_value, 5.0);
    }

    #[test]
    fn test_categorical_flattened_and_sorted() {
        let view = view(
            vec![
                category("Quarter", Some("xAxis"), texts(&["Q2", "Q1", "Q2"])),
                category("Product", Some("yAxis"), texts(&["b", "a", "b"])),
            ],
            vec![measure("Sales", &[1.0, 2.0, 3.0])],
        );
        let model = transform(&view, &Settings::default());
        assert_eq!(model.base.x_values, vec!["Q1", "Q2"]);
        assert_eq!(model.base.y_values, vec!["a", "b"]);
        assert_eq!(
            values_of(&model),
            vec![
                ("Q1".to_string(), "a".to_string(), 2.0),
                ("Q2".to_string(), "b".to_string(), 4.0),
            ]
        );
    }

    #[test]
    fn test_empty_view() {
        let model = transform(&DataView::default(), &Settings::default());
        assert!(model.is_empty());
        assert_eq!(model.x_hierarchy.depth, 0);
        assert_eq!((model.base.min_value, model.base.max_value), (0.0, 0.0));
    }
}
