//! Chart selection and rendering.
//!
//! The renderer picks the chart kinds that apply to a dataset, draws each
//! one on its own in-memory canvas and returns base64-encoded PNG images.
//! A chart that cannot be drawn becomes an empty string; rendering as a
//! whole never fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_processing::charts::{ChartKind, ChartRenderer};
//! use lens_processing::config::ChartConfig;
//!
//! let charts = ChartRenderer::new(ChartConfig::default()).render_all(&df);
//! let histogram = charts.image(ChartKind::Histogram).unwrap_or_default();
//! ```

mod canvas;
mod draw;

pub use canvas::{Canvas, DATA_URI_PREFIX, encode_png};

use crate::config::ChartConfig;
use crate::profiler::statistics::{Summary, pearson, summarize};
use crate::utils::{numeric_values, partition_columns, value_counts};
use anyhow::Result;
use draw::Column;
use indexmap::IndexMap;
use polars::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{debug, warn};

/// Every chart the renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Histogram,
    Distribution,
    Correlation,
    Scatter,
    Line,
    Kde,
    Area,
    Bar,
    Violin,
    Pie,
    Missing,
}

impl ChartKind {
    /// Charts drawn whenever the dataset has a numeric column.
    pub const NUMERIC: [ChartKind; 9] = [
        ChartKind::Histogram,
        ChartKind::Distribution,
        ChartKind::Correlation,
        ChartKind::Scatter,
        ChartKind::Line,
        ChartKind::Kde,
        ChartKind::Area,
        ChartKind::Bar,
        ChartKind::Violin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::Distribution => "distribution",
            ChartKind::Correlation => "correlation",
            ChartKind::Scatter => "scatter",
            ChartKind::Line => "line",
            ChartKind::Kde => "kde",
            ChartKind::Area => "area",
            ChartKind::Bar => "bar",
            ChartKind::Violin => "violin",
            ChartKind::Pie => "pie",
            ChartKind::Missing => "missing",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of rendering one chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    /// Base64 PNG (or data URI).
    Rendered(String),
    /// The chart does not apply to this dataset.
    Skipped(String),
    /// Drawing or encoding failed.
    Failed(String),
}

impl ChartOutcome {
    /// The encoded image, or an empty string.
    pub fn as_image(&self) -> &str {
        match self {
            ChartOutcome::Rendered(image) => image,
            ChartOutcome::Skipped(_) | ChartOutcome::Failed(_) => "",
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, ChartOutcome::Rendered(_))
    }
}

/// A chart that failed to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFailure {
    pub chart: ChartKind,
    pub reason: String,
}

/// Rendered charts keyed by kind, in selection order.
///
/// Serializes as `{kind: image}` with an empty string for every chart that
/// was skipped or failed, plus a `failures` list when anything failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSet {
    charts: IndexMap<ChartKind, ChartOutcome>,
}

impl ChartSet {
    pub fn insert(&mut self, kind: ChartKind, outcome: ChartOutcome) {
        self.charts.insert(kind, outcome);
    }

    pub fn get(&self, kind: ChartKind) -> Option<&ChartOutcome> {
        self.charts.get(&kind)
    }

    /// The encoded image for `kind`; `Some("")` when it was selected but not
    /// drawn, `None` when it was not selected at all.
    pub fn image(&self, kind: ChartKind) -> Option<&str> {
        self.charts.get(&kind).map(ChartOutcome::as_image)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ChartKind> + '_ {
        self.charts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn rendered_count(&self) -> usize {
        self.charts.values().filter(|o| o.is_rendered()).count()
    }

    pub fn failures(&self) -> Vec<ChartFailure> {
        self.charts
            .iter()
            .filter_map(|(kind, outcome)| match outcome {
                ChartOutcome::Failed(reason) => Some(ChartFailure {
                    chart: *kind,
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

impl Serialize for ChartSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let failures = self.failures();
        let len = self.charts.len() + usize::from(!failures.is_empty());
        let mut map = serializer.serialize_map(Some(len))?;
        for (kind, outcome) in &self.charts {
            map.serialize_entry(kind.as_str(), outcome.as_image())?;
        }
        if !failures.is_empty() {
            map.serialize_entry("failures", &failures)?;
        }
        map.end()
    }
}

/// A numeric column reduced to its finite values.
struct NumericColumn {
    name: String,
    values: Vec<f64>,
    summary: Summary,
}

/// Values extracted once per dataset and shared by every chart.
///
/// Infinite values cannot be placed on an axis, so they are treated like
/// missing ones.
struct ChartData {
    numeric: Vec<NumericColumn>,
    /// Numeric columns with missing entries kept, for pairwise statistics.
    numeric_raw: Vec<Vec<Option<f64>>>,
    /// Value counts of the first text column.
    first_categorical: Option<(String, IndexMap<String, usize>)>,
    /// Columns with at least one missing value.
    missing: Vec<(String, usize)>,
}

impl ChartData {
    fn collect(df: &DataFrame) -> PolarsResult<Self> {
        let (numeric_names, categorical_names) = partition_columns(df);

        let mut numeric = Vec::with_capacity(numeric_names.len());
        let mut numeric_raw = Vec::with_capacity(numeric_names.len());
        for name in numeric_names {
            let raw: Vec<Option<f64>> = numeric_values(df.column(&name)?.as_materialized_series())?
                .into_iter()
                .map(|value| value.filter(|v| v.is_finite()))
                .collect();
            let values: Vec<f64> = raw.iter().flatten().copied().collect();
            let summary = summarize(&Series::new(name.as_str().into(), values.as_slice()))?;
            numeric.push(NumericColumn {
                name,
                values,
                summary,
            });
            numeric_raw.push(raw);
        }

        let first_categorical = match categorical_names.into_iter().next() {
            Some(name) => {
                let counts = value_counts(df.column(&name)?.as_materialized_series())?;
                Some((name, counts))
            }
            None => None,
        };

        let missing = df
            .get_columns()
            .iter()
            .filter(|column| column.null_count() > 0)
            .map(|column| (column.name().to_string(), column.null_count()))
            .collect();

        Ok(Self {
            numeric,
            numeric_raw,
            first_categorical,
            missing,
        })
    }

    fn column(&self, idx: usize) -> Option<Column<'_>> {
        self.numeric.get(idx).map(|column| Column {
            name: column.name.as_str(),
            values: column.values.as_slice(),
            summary: &column.summary,
        })
    }

    fn columns(&self, limit: usize) -> Vec<Column<'_>> {
        (0..self.numeric.len().min(limit))
            .filter_map(|idx| self.column(idx))
            .collect()
    }
}

/// Selects and renders charts for a dataset.
#[derive(Debug, Clone, Default)]
pub struct ChartRenderer {
    config: ChartConfig,
}

impl ChartRenderer {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    /// Render every applicable chart. Never fails.
    pub fn render_all(&self, df: &DataFrame) -> ChartSet {
        let mut charts = ChartSet::default();

        let data = match ChartData::collect(df) {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not prepare chart data: {}", e);
                charts.insert(ChartKind::Missing, ChartOutcome::Failed(e.to_string()));
                return charts;
            }
        };

        if !data.numeric.is_empty() {
            for kind in ChartKind::NUMERIC {
                charts.insert(kind, self.render(kind, &data));
            }
        }

        if let Some((name, counts)) = &data.first_categorical {
            if counts.len() <= self.config.pie_max_categories {
                charts.insert(ChartKind::Pie, self.render(ChartKind::Pie, &data));
            } else {
                debug!(
                    "Skipping pie chart for '{}' ({} categories)",
                    name,
                    counts.len()
                );
            }
        }

        charts.insert(ChartKind::Missing, self.render(ChartKind::Missing, &data));

        debug!(
            "Rendered {} of {} charts",
            charts.rendered_count(),
            charts.len()
        );
        charts
    }

    fn render(&self, kind: ChartKind, data: &ChartData) -> ChartOutcome {
        match self.try_render(kind, data) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to render {} chart: {}", kind, e);
                ChartOutcome::Failed(e.to_string())
            }
        }
    }

    /// Draw `draw` on a fresh canvas and encode it.
    fn paint<F>(&self, draw: F) -> Result<ChartOutcome>
    where
        F: FnOnce(&canvas::Area<'_>) -> Result<()>,
    {
        let mut canvas = Canvas::new(self.config.width, self.config.height);
        canvas.draw(draw)?;
        let png = canvas.into_png()?;
        Ok(ChartOutcome::Rendered(encode_png(
            &png,
            self.config.data_uri_prefix,
        )))
    }

    fn try_render(&self, kind: ChartKind, data: &ChartData) -> Result<ChartOutcome> {
        let skipped =
            |reason: &str| -> Result<ChartOutcome> { Ok(ChartOutcome::Skipped(reason.to_string())) };

        match kind {
            ChartKind::Histogram => match data.column(0) {
                Some(column) => self.paint(|area| {
                    draw::histogram(area, &column, self.config.histogram_bins)
                }),
                None => skipped("no numeric column"),
            },
            ChartKind::Distribution => {
                let columns = data.columns(usize::MAX);
                self.paint(|area| draw::distribution(area, &columns))
            }
            ChartKind::Correlation => {
                if data.numeric.len() < 2 {
                    return skipped("needs at least two numeric columns");
                }
                let names: Vec<&str> = data.numeric.iter().map(|c| c.name.as_str()).collect();
                let matrix: Vec<Vec<Option<f64>>> = data
                    .numeric_raw
                    .iter()
                    .map(|x| data.numeric_raw.iter().map(|y| pearson(x, y)).collect())
                    .collect();
                self.paint(|area| draw::correlation(area, &names, &matrix))
            }
            ChartKind::Scatter => {
                let (Some(x), Some(y)) = (data.numeric.first(), data.numeric.get(1)) else {
                    return skipped("needs at least two numeric columns");
                };
                let (x_name, y_name) = (x.name.as_str(), y.name.as_str());
                let points: Vec<(f64, f64)> = data.numeric_raw[0]
                    .iter()
                    .zip(&data.numeric_raw[1])
                    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                    .collect();
                self.paint(|area| draw::scatter(area, x_name, y_name, &points))
            }
            ChartKind::Line => match data.column(0) {
                Some(column) => self.paint(|area| draw::line(area, &column)),
                None => skipped("no numeric column"),
            },
            ChartKind::Kde => match data.column(0) {
                Some(column) => self.paint(|area| draw::kde(area, &column)),
                None => skipped("no numeric column"),
            },
            ChartKind::Area => match data.column(0) {
                Some(column) => self.paint(|area| draw::area_chart(area, &column)),
                None => skipped("no numeric column"),
            },
            ChartKind::Bar => {
                let means: Vec<(&str, f64)> = data
                    .columns(self.config.bar_max_columns)
                    .into_iter()
                    .filter_map(|column| Some((column.name, column.summary.mean?)))
                    .collect();
                self.paint(|area| draw::bar(area, &means))
            }
            ChartKind::Violin => {
                let columns = data.columns(self.config.violin_max_columns);
                self.paint(|area| draw::violin(area, &columns))
            }
            ChartKind::Pie => match &data.first_categorical {
                Some((name, counts)) => {
                    let slices: Vec<(&str, usize)> =
                        counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
                    self.paint(|area| draw::pie(area, name, &slices))
                }
                None => skipped("no text column"),
            },
            ChartKind::Missing => {
                if data.missing.is_empty() {
                    return skipped("no missing values");
                }
                let counts: Vec<(&str, usize)> = data
                    .missing
                    .iter()
                    .map(|(name, count)| (name.as_str(), *count))
                    .collect();
                self.paint(|area| draw::missing(area, &counts))
            }
        }
    }
}
