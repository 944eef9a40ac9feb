mod chart;
mod font;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use syracuse::{
    chart_title, syracuse_sequence, validate_source, ChartRenderer, Metrics, Sequence,
    DEFAULT_SOURCE,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::chart::{ChartKind, HtmlRenderer, PlottersRenderer};

#[derive(Parser, Debug)]
#[command(author, version, about = "Syracuse (Collatz) flight computation CLI", long_about = None)]
struct Cli {
    /// Starting value of the flight (positive integer)
    #[arg(
        env = "SYRACUSE_SOURCE",
        default_value_t = i128::from(DEFAULT_SOURCE),
        allow_negative_numbers = true
    )]
    source: i128,

    /// Output PNG chart path (defaults to `syracuse_<n>.png` when no chart path is given)
    #[arg(long, value_hint = ValueHint::FilePath)]
    png: Option<PathBuf>,

    /// Output SVG chart path
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,

    /// Output interactive HTML chart path
    #[arg(long, value_hint = ValueHint::FilePath)]
    html: Option<PathBuf>,

    /// Disable chart generation
    #[arg(long, action = ArgAction::SetTrue)]
    no_plot: bool,

    /// Write the sequence as `index,value` CSV (`-` for stdout)
    #[arg(long, value_hint = ValueHint::FilePath)]
    csv: Option<PathBuf>,

    /// Metric output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let renderers = build_renderers(&cli);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    run(&cli, &renderers, &mut handle)?;
    Ok(())
}

/// Chart targets requested on the command line, in PNG, SVG, HTML order.
fn build_renderers(cli: &Cli) -> Vec<Box<dyn ChartRenderer>> {
    let mut renderers: Vec<Box<dyn ChartRenderer>> = Vec::new();
    if cli.no_plot {
        return renderers;
    }

    if let Some(path) = cli.png.as_ref() {
        renderers.push(Box::new(PlottersRenderer::new(path, ChartKind::Png)));
    }
    if let Some(path) = cli.svg.as_ref() {
        renderers.push(Box::new(PlottersRenderer::new(path, ChartKind::Svg)));
    }
    if let Some(path) = cli.html.as_ref() {
        renderers.push(Box::new(HtmlRenderer::new(path)));
    }

    if renderers.is_empty() {
        // Invalid sources never reach rendering, so the name only matters when positive.
        let name = format!("syracuse_{}.{}", cli.source, ChartKind::Png.extension());
        renderers.push(Box::new(PlottersRenderer::new(name, ChartKind::Png)));
    }
    renderers
}

fn run<W: Write>(
    cli: &Cli,
    renderers: &[Box<dyn ChartRenderer + '_>],
    out: &mut W,
) -> Result<Metrics> {
    let source = validate_source(cli.source)?;

    let t_compute = Instant::now();
    let sequence = syracuse_sequence(source)?;
    debug!(
        "Compute stage: {:.3} ms ({} values)",
        t_compute.elapsed().as_secs_f64() * 1000.0,
        sequence.len()
    );

    let title = chart_title(source);
    for renderer in renderers {
        if let Err(err) = renderer.display(&sequence, &title) {
            warn!("Skipping chart: {}", err);
        }
    }

    if let Some(path) = cli.csv.as_ref() {
        if path.as_os_str() == "-" {
            write_sequence_csv(&sequence, &mut *out)?;
        } else {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_sequence_csv(&sequence, file)?;
            info!("Wrote sequence CSV: {}", path.display());
        }
    }

    let metrics = sequence.metrics();
    write_metrics(&metrics, cli.format, out)?;
    Ok(metrics)
}

fn write_sequence_csv<W: Write>(sequence: &Sequence, sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(["index", "value"])?;
    for (idx, value) in sequence.iter().enumerate() {
        writer.write_record([idx.to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_metrics<W: Write>(metrics: &Metrics, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "Flight time : {}", metrics.flight_time)?;
            writeln!(out, "Altitude flight time : {}", metrics.altitude_flight_time)?;
            writeln!(out, "Maximum altitude : {}", metrics.max_altitude)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, metrics)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
