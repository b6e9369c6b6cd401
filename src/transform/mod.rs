//! One pure transformer per chart family, plus the categorical helpers they share.
//!
//! Every transformer takes `(&DataView, &Settings)` and returns a fresh model.
//! Unusable payloads produce the family's empty model.

pub mod bump;
pub mod donut;
pub mod heatmap;
pub mod inline_line;
pub mod timeline;

use crate::coerce::{
    compare_key_paths, format_data_value, format_group_value, join_labels, sort_key, SortKey,
    DEFAULT_GROUP,
};
use crate::data::{CategoricalView, ColumnMeta, SortDirection};
use crate::ir::{DataPoint, ModelBase};
use crate::roles::{first_unbound, resolve_roles, Role, RoleBinding};
use crate::scale::ValueRange;
use indexmap::{IndexMap, IndexSet};

// =============================================================================
// Categorical context
// =============================================================================

/// A categorical view with roles resolved separately over its category and
/// value columns.
pub(crate) struct CategoricalContext<'a> {
    pub view: &'a CategoricalView,
    pub categories: RoleBinding,
    pub values: RoleBinding,
}

impl<'a> CategoricalContext<'a> {
    pub fn new(view: &'a CategoricalView) -> Self {
        Self {
            view,
            categories: resolve_roles(view.category_sources()),
            values: resolve_roles(view.value_sources()),
        }
    }

    /// Value columns that carry the plotted measure.
    ///
    /// Columns tagged `value` win; otherwise every value column not claimed by
    /// another role (e.g. `secondaryValue`) is a measure.
    pub fn measure_columns(&self) -> Vec<usize> {
        let tagged = self.values.all(Role::Value);
        if !tagged.is_empty() {
            return tagged.to_vec();
        }
        let claimed = self.values.bound_columns();
        (0..self.view.values.len())
            .filter(|idx| !claimed.contains(idx))
            .collect()
    }

    pub fn primary_measure(&self) -> Option<&'a ColumnMeta> {
        let view = self.view;
        self.measure_columns()
            .first()
            .and_then(|idx| view.values.get(*idx))
            .map(|v| &v.source)
    }

    /// Category columns not bound to any role, in source order.
    pub fn unbound_categories(&self) -> Vec<usize> {
        let bound = self.categories.bound_columns();
        (0..self.view.categories.len())
            .filter(|idx| !bound.contains(idx))
            .collect()
    }

    /// First category column no role claims.
    pub fn fallback_category(&self) -> Option<usize> {
        first_unbound(&self.categories, self.view.categories.len())
    }

    /// Columns for a hierarchy role, else the first unbound category column.
    pub fn axis_columns(&self, role: Role) -> Vec<usize> {
        let bound = self.categories.all(role);
        if !bound.is_empty() {
            return bound.to_vec();
        }
        self.fallback_category().into_iter().collect()
    }

    pub fn group_label(&self, row: usize) -> String {
        match self.categories.first(Role::Group) {
            Some(col) => format_group_value(self.view.category_value(col, row)),
            None => DEFAULT_GROUP.to_string(),
        }
    }

    /// Series for one measure column at one row: legend category, else the
    /// column's group name, else its display name when several measures are
    /// plotted, else the default series.
    pub fn series_label(&self, row: usize, measure: usize, measure_count: usize) -> String {
        if let Some(col) = self.categories.first(Role::Legend) {
            return format_group_value(self.view.category_value(col, row));
        }
        let source = self.view.values.get(measure).map(|v| &v.source);
        if let Some(name) = source.and_then(|s| s.group_name.as_ref()) {
            if !name.trim().is_empty() {
                return name.clone();
            }
        }
        match source {
            Some(s) if measure_count > 1 => s.display_name.clone(),
            _ => DEFAULT_GROUP.to_string(),
        }
    }

    /// Display labels and sort keys of a row across several category columns.
    pub fn path(&self, columns: &[usize], row: usize) -> (Vec<String>, Vec<SortKey>) {
        columns
            .iter()
            .map(|col| {
                let raw = self.view.category_value(*col, row);
                (format_data_value(raw, row), sort_key(raw))
            })
            .unzip()
    }

    pub fn directions(&self, columns: &[usize]) -> Vec<Option<SortDirection>> {
        columns
            .iter()
            .map(|col| self.view.categories.get(*col).and_then(|c| c.source.sort))
            .collect()
    }

    pub fn display_name(&self, columns: &[usize]) -> Option<String> {
        let names: Vec<&str> = columns
            .iter()
            .filter_map(|col| self.view.categories.get(*col))
            .map(|c| c.source.display_name.as_str())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(join_labels(&names))
        }
    }
}

// =============================================================================
// Axis ordering
// =============================================================================

/// One distinct axis position, keyed by its joined label.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AxisEntry {
    pub label: String,
    pub path: Vec<String>,
    pub keys: Vec<SortKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AxisOrder {
    /// Sort by per-level keys, whatever their kind
    Keys,
    /// Sort only when every key is numeric or chronological, else first-seen
    NumericOnly,
}

#[derive(Debug, Default)]
pub(crate) struct AxisCollector {
    entries: IndexMap<String, AxisEntry>,
}

impl AxisCollector {
    /// Record a position and return its label.
    pub fn observe(&mut self, path: Vec<String>, keys: Vec<SortKey>) -> String {
        let label = join_labels(&path);
        self.entries
            .entry(label.clone())
            .or_insert_with(|| AxisEntry {
                label: label.clone(),
                path,
                keys,
            });
        label
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn ordered(self, order: AxisOrder, directions: &[Option<SortDirection>]) -> Vec<AxisEntry> {
        let mut entries: Vec<AxisEntry> = self.entries.into_values().collect();
        let sortable = match order {
            AxisOrder::Keys => true,
            AxisOrder::NumericOnly => entries.iter().all(|e| e.keys.iter().all(SortKey::is_numeric)),
        };
        if sortable {
            entries.sort_by(|a, b| compare_key_paths(&a.keys, &b.keys, directions));
        }
        entries
    }
}

// =============================================================================
// Model base
// =============================================================================

pub(crate) fn distinct<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items
        .into_iter()
        .map(Into::into)
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

/// Base fields from the points that feed the value range.
pub(crate) fn model_base<'p, I>(points: I, measure: Option<&ColumnMeta>) -> ModelBase
where
    I: IntoIterator<Item = &'p DataPoint>,
{
    let points: Vec<&DataPoint> = points.into_iter().collect();
    let (min_value, max_value) = ValueRange::from_values(points.iter().map(|p| p.value)).bounds();
    ModelBase {
        x_values: distinct(points.iter().map(|p| p.x_value.as_str())),
        y_values: distinct(points.iter().map(|p| p.y_value.as_str())),
        groups: distinct(points.iter().map(|p| p.group_value.as_str())),
        max_value,
        min_value,
        value_format_string: measure.and_then(|m| m.format.clone()),
        value_display_name: measure.map(|m| m.display_name.clone()),
    }
}
