use anyhow::{Context, Result};
use chartmodel::data::DataView;
use chartmodel::ir::ChartModel;
use chartmodel::settings::Settings;
use chartmodel::ChartKind;
use clap::{Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "chartmodel")]
#[command(about = "Transform a host data view into a render-ready chart model", long_about = None)]
struct Args {
    /// Chart family to build
    #[arg(value_enum)]
    chart: ChartKind,

    /// Format of the data view read from stdin
    #[arg(long, value_enum, default_value = "json")]
    input: InputFormat,

    /// JSON settings file (totals, timeline sort and cutoff, donut order)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    // Read the data view from stdin
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read data view from stdin")?;

    let view = match args.input {
        InputFormat::Json => DataView::from_json_str(&input)?,
        InputFormat::Csv => DataView::from_csv(input.as_bytes())?,
    };

    let model = chartmodel::transform(args.chart, &view, &settings);
    debug!(chart = ?args.chart, points = model.point_count(), "model built");

    let json = if args.pretty {
        serde_json::to_string_pretty(&model)
    } else {
        serde_json::to_string(&model)
    }
    .context("Failed to serialize chart model")?;

    // Write JSON to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write model to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
