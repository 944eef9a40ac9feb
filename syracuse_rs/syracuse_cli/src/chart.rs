//! Chart renderers for the CLI: plotters (PNG/SVG) and a standalone Plotly page.

use std::fs;
use std::panic;
use std::path::PathBuf;

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use serde_json::{json, Value as JsonValue};
use syracuse::chart::{indexed_points, X_LABEL, Y_LABEL};
use syracuse::{ChartError, ChartRenderer, Sequence};
use tracing::info;

use crate::font::FontSafeBackend;

const CHART_SIZE: (u32, u32) = (1280, 760);
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Png,
    Svg,
}

impl ChartKind {
    pub fn extension(self) -> &'static str {
        match self {
            ChartKind::Png => "png",
            ChartKind::Svg => "svg",
        }
    }
}

/// Static line+marker chart drawn with plotters.
#[derive(Clone, Debug)]
pub struct PlottersRenderer {
    path: PathBuf,
    kind: ChartKind,
}

impl PlottersRenderer {
    pub fn new(path: impl Into<PathBuf>, kind: ChartKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl ChartRenderer for PlottersRenderer {
    fn display(&self, sequence: &Sequence, title: &str) -> Result<(), ChartError> {
        let render = || -> Result<()> {
            match self.kind {
                ChartKind::Png => {
                    let backend = BitMapBackend::new(&self.path, CHART_SIZE);
                    let root = FontSafeBackend::new(backend).into_drawing_area();
                    draw_sequence_chart(root, sequence, title)
                }
                ChartKind::Svg => {
                    let backend = SVGBackend::new(&self.path, CHART_SIZE);
                    let root = FontSafeBackend::new(backend).into_drawing_area();
                    draw_sequence_chart(root, sequence, title)
                }
            }
        };

        panic::catch_unwind(panic::AssertUnwindSafe(render))
            .map_err(|_| ChartError::Panicked)?
            .map_err(|err| ChartError::Backend(format!("{err:#}")))?;
        info!("Wrote plot: {}", self.path.display());
        Ok(())
    }
}

fn draw_sequence_chart<DB>(
    area: DrawingArea<DB, plotters::coord::Shift>,
    sequence: &Sequence,
    title: &str,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;

    let points: Vec<(f64, f64)> = indexed_points(sequence)
        .into_iter()
        .map(|(idx, value)| (idx as f64, value as f64))
        .collect();
    let x_max = (sequence.len().saturating_sub(1) as f64).max(1.0);
    let y_max = points.iter().map(|p| p.1).fold(1.0, f64::max) * 1.05;

    let title_font = FontDesc::new(FontFamily::SansSerif, 28.0, FontStyle::Normal);
    let axis_font = FontDesc::new(FontFamily::SansSerif, 20.0, FontStyle::Normal);

    let mut chart = ChartBuilder::on(&area)
        .caption(title, title_font)
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(&BLACK.mix(0.08))
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .label_style(axis_font.clone().color(&BLACK.mix(0.85)))
        .axis_desc_style(axis_font.color(&BLACK))
        .draw()?;

    let line_style = ShapeStyle {
        color: BLUE.to_rgba(),
        filled: false,
        stroke_width: 2,
    };
    chart.draw_series(LineSeries::new(points.iter().copied(), line_style))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
    )?;

    area.present()?;
    Ok(())
}

/// Interactive chart written as a self-contained HTML page backed by Plotly.
#[derive(Clone, Debug)]
pub struct HtmlRenderer {
    path: PathBuf,
}

impl HtmlRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChartRenderer for HtmlRenderer {
    fn display(&self, sequence: &Sequence, title: &str) -> Result<(), ChartError> {
        let page = html_page(&plotly_figure(sequence, title), title)?;
        fs::write(&self.path, page)?;
        info!("Wrote interactive chart: {}", self.path.display());
        Ok(())
    }
}

pub fn plotly_figure(sequence: &Sequence, title: &str) -> JsonValue {
    let x: Vec<usize> = (0..sequence.len()).collect();
    json!({
        "data": [{
            "type": "scatter",
            "mode": "lines+markers",
            "x": x,
            "y": sequence.values(),
            "marker": { "color": "blue" },
            "line": { "color": "blue" },
        }],
        "layout": {
            "title": { "text": title },
            "xaxis": { "title": { "text": X_LABEL } },
            "yaxis": { "title": { "text": Y_LABEL } },
        },
    })
}

fn html_page(figure: &JsonValue, title: &str) -> Result<String, ChartError> {
    let figure_json = serde_json::to_string(figure)
        .map_err(|e| ChartError::Backend(e.to_string()))?
        .replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:90vh;"></div>
<script>
const figure = {figure_json};
Plotly.newPlot("chart", figure.data, figure.layout);
</script>
</body>
</html>
"#,
        title = escape_html(title),
        cdn = PLOTLY_CDN,
    ))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
