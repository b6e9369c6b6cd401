use crate::hierarchy::AxisHierarchy;
use crate::temporal::TemporalLevel;
use indexmap::IndexMap;
use serde::Serialize;

// =============================================================================
// Shared model parts
// =============================================================================

/// The atomic render unit shared by every chart family.
///
/// `x_value` and `y_value` are always display strings so they can key maps.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub x_value: String,
    pub y_value: String,
    pub value: f64,
    pub group_value: String,
    pub index: usize,
}

/// Fields every chart model carries, so renderers can treat models uniformly
/// for empty-state detection and min/max-driven color scales.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelBase {
    pub x_values: Vec<String>,
    pub y_values: Vec<String>,
    pub groups: Vec<String>,
    pub max_value: f64,
    pub min_value: f64,
    pub value_format_string: Option<String>,
    pub value_display_name: Option<String>,
}

pub trait ChartModel {
    fn base(&self) -> &ModelBase;

    fn point_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}

// =============================================================================
// Heatmap
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapPoint {
    #[serde(flatten)]
    pub point: DataPoint,
    /// Leaf key in `x_hierarchy`
    pub x_key: String,
    /// Leaf key in the group's y hierarchy
    pub y_key: String,
    pub highlighted: bool,
    pub is_total: bool,
}

/// Totals for one group. Non-finite cells are left out of every sum.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotals {
    pub row_totals_by_x: IndexMap<String, f64>,
    pub col_totals_by_y: IndexMap<String, f64>,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapModel {
    #[serde(flatten)]
    pub base: ModelBase,
    pub data_points: Vec<HeatmapPoint>,
    pub x_hierarchy: AxisHierarchy,
    pub y_hierarchies: IndexMap<String, AxisHierarchy>,
    pub totals: IndexMap<String, GroupTotals>,
    pub grand_total: f64,
    pub x_display_name: Option<String>,
    pub y_display_name: Option<String>,
}

impl ChartModel for HeatmapModel {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn point_count(&self) -> usize {
        self.data_points.len()
    }
}

// =============================================================================
// Timeline
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    /// `value` is the duration in days
    #[serde(flatten)]
    pub point: DataPoint,
    pub label: String,
    pub region: Option<String>,
    pub category: Option<String>,
    pub start_ms: f64,
    pub end_ms: f64,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub start_level: TemporalLevel,
    pub end_level: TemporalLevel,
    /// One endpoint was missing and copied from the other
    pub degraded: bool,
    pub source_row: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineModel {
    #[serde(flatten)]
    pub base: ModelBase,
    pub data_points: Vec<TimelineItem>,
    pub regions: Vec<String>,
    pub categories: Vec<String>,
    pub start_level: TemporalLevel,
    pub end_level: TemporalLevel,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl ChartModel for TimelineModel {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn point_count(&self) -> usize {
        self.data_points.len()
    }
}

// =============================================================================
// Bump
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BumpPoint {
    #[serde(flatten)]
    pub point: DataPoint,
    pub series: String,
    /// 1 = highest value at this x within the group
    pub rank: usize,
    pub secondary_value: Option<f64>,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BumpModel {
    #[serde(flatten)]
    pub base: ModelBase,
    pub data_points: Vec<BumpPoint>,
    pub series: Vec<String>,
    pub max_rank: usize,
}

impl ChartModel for BumpModel {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn point_count(&self) -> usize {
        self.data_points.len()
    }
}

// =============================================================================
// Donut
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonutSlice {
    #[serde(flatten)]
    pub point: DataPoint,
    pub share: f64,
    pub start_fraction: f64,
    pub end_fraction: f64,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonutModel {
    #[serde(flatten)]
    pub base: ModelBase,
    pub data_points: Vec<DonutSlice>,
    pub totals: IndexMap<String, f64>,
}

impl ChartModel for DonutModel {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn point_count(&self) -> usize {
        self.data_points.len()
    }
}

// =============================================================================
// Inline-labels line
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePoint {
    #[serde(flatten)]
    pub point: DataPoint,
    pub x_ms: Option<f64>,
    pub highlighted: bool,
}

/// Where a series' inline label sits: its last point with a finite value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesLabel {
    pub series: String,
    pub group_value: String,
    pub anchor_index: Option<usize>,
    pub x_value: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineModel {
    #[serde(flatten)]
    pub base: ModelBase,
    pub data_points: Vec<LinePoint>,
    pub series: Vec<SeriesLabel>,
    pub x_is_date: bool,
}

impl ChartModel for LineModel {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn point_count(&self) -> usize {
        self.data_points.len()
    }
}

// =============================================================================
// Output
// =============================================================================

/// Any chart model, serialized without a wrapper tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartOutput {
    Heatmap(HeatmapModel),
    Timeline(TimelineModel),
    Bump(BumpModel),
    Donut(DonutModel),
    Line(LineModel),
}

impl ChartOutput {
    fn model(&self) -> &dyn ChartModel {
        match self {
            ChartOutput::Heatmap(m) => m,
            ChartOutput::Timeline(m) => m,
            ChartOutput::Bump(m) => m,
            ChartOutput::Donut(m) => m,
            ChartOutput::Line(m) => m,
        }
    }
}

impl ChartModel for ChartOutput {
    fn base(&self) -> &ModelBase {
        self.model().base()
    }

    fn point_count(&self) -> usize {
        self.model().point_count()
    }
}
