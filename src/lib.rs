// Library exports for chartmodel

pub mod aggregate;
pub mod coerce;
pub mod data;
pub mod hierarchy;
pub mod ir;
pub mod parser;
pub mod roles;
pub mod scale;
pub mod settings;
pub mod temporal;
pub mod transform;

use data::DataView;
use ir::ChartOutput;
use serde::{Deserialize, Serialize};
use settings::Settings;

/// Chart families with a transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Heatmap,
    Timeline,
    Bump,
    Donut,
    InlineLine,
}

/// Run the transformer for `kind`. Never fails: unusable input yields that
/// family's empty model.
pub fn transform(kind: ChartKind, view: &DataView, settings: &Settings) -> ChartOutput {
    match kind {
        ChartKind::Heatmap => ChartOutput::Heatmap(transform::heatmap::transform(view, settings)),
        ChartKind::Timeline => ChartOutput::Timeline(transform::timeline::transform(view, settings)),
        ChartKind::Bump => ChartOutput::Bump(transform::bump::transform(view, settings)),
        ChartKind::Donut => ChartOutput::Donut(transform::donut::transform(view, settings)),
        ChartKind::InlineLine => ChartOutput::Line(transform::inline_line::transform(view, settings)),
    }
}
