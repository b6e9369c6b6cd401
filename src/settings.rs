// Host-provided transformer settings

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub totals: TotalsSettings,
    pub timeline: TimelineSettings,
    pub donut: DonutSettings,
}

impl Settings {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Malformed settings JSON")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::from_json_str(&text)
    }
}

// =============================================================================
// Totals (heatmap)
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RowTotalPosition {
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnTotalPosition {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TotalsSettings {
    #[serde(default)]
    pub show_row_total: bool,
    #[serde(default)]
    pub row_total_position: RowTotalPosition,
    #[serde(default)]
    pub show_column_total: bool,
    #[serde(default)]
    pub column_total_position: ColumnTotalPosition,
    #[serde(default = "default_total_label")]
    pub label: String,
}

fn default_total_label() -> String {
    "Total".to_string()
}

impl Default for TotalsSettings {
    fn default() -> Self {
        Self {
            show_row_total: false,
            row_total_position: RowTotalPosition::Bottom,
            show_column_total: false,
            column_total_position: ColumnTotalPosition::Right,
            label: default_total_label(),
        }
    }
}

// =============================================================================
// Timeline
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimelineSortBy {
    Region,
    #[default]
    Time,
    Category,
    End,
    Duration,
}

/// How an end endpoint given at period granularity maps to a timestamp.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DateCutoff {
    /// Start of the named period: an end of "2020" is 2020-01-01.
    PeriodStart,
    /// Exclusive end of the named period: an end of "2020" is 2021-01-01.
    #[default]
    PeriodEnd,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineSettings {
    pub sort_by: TimelineSortBy,
    pub date_cutoff: DateCutoff,
}

// =============================================================================
// Donut
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SliceOrder {
    #[default]
    None,
    ValueDescending,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DonutSettings {
    pub sort_slices: SliceOrder,
}
