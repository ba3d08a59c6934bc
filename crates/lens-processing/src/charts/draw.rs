//! Drawing routines, one per chart kind.
//!
//! Every routine receives a blank drawing area and the already extracted
//! values. Ranges are padded so that constant or single-point inputs still
//! produce a non-degenerate coordinate system; a range whose padded bounds
//! are not finite is an error.

use super::canvas::Area;
use crate::profiler::statistics::{Summary, build_histogram, gaussian_kde};
use anyhow::{Result, bail, ensure};
use plotters::element::Pie;
use plotters::prelude::*;
use std::ops::Range;

const TITLE_FONT: (&str, u32) = ("sans-serif", 28);
const LABEL_FONT: (&str, u32) = ("sans-serif", 16);
const KDE_POINTS: usize = 200;

/// A named column of finite, non-missing values.
pub(crate) struct Column<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
    pub summary: &'a Summary,
}

fn bounds(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widen `[min, max]` by 5% on each side; a single point gets a unit window.
fn padded(min: f64, max: f64) -> Result<Range<f64>> {
    let pad = if min == max {
        if min == 0.0 { 1.0 } else { min.abs() * 0.1 }
    } else {
        (max - min) * 0.05
    };
    let range = (min - pad)..(max + pad);
    ensure!(
        pad.is_finite() && range.start.is_finite() && range.end.is_finite(),
        "value range {:e}..{:e} is too wide to plot",
        min,
        max
    );
    Ok(range)
}

fn value_range(values: impl IntoIterator<Item = f64>) -> Result<Range<f64>> {
    match bounds(values) {
        Some((min, max)) => padded(min, max),
        None => bail!("no finite values to plot"),
    }
}

/// Blue-white-red diverging scale for values in `[-1, 1]`.
fn coolwarm(value: f64) -> RGBColor {
    const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = value.clamp(-1.0, 1.0);
    let (from, to, w) = if t < 0.0 {
        (NEUTRAL, COOL, -t)
    } else {
        (NEUTRAL, WARM, t)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * w).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn palette(idx: usize) -> RGBColor {
    let (r, g, b) = Palette99::pick(idx).rgb();
    RGBColor(r, g, b)
}

pub(crate) fn histogram(area: &Area<'_>, column: &Column<'_>, bins: usize) -> Result<()> {
    let histogram = build_histogram(column.values, bins);
    let (Some(first), Some(last)) = (histogram.first(), histogram.last()) else {
        bail!("column '{}' has no finite range to bin", column.name);
    };
    ensure!(
        first.start < last.end,
        "column '{}' is too large to bin",
        column.name
    );
    let tallest = histogram.iter().map(|bin| bin.count).max().unwrap_or(0) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Distribution of {}", column.name), TITLE_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(first.start..last.end, 0f64..(tallest * 1.1).max(1.0))?;
    chart
        .configure_mesh()
        .x_desc(column.name)
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(histogram.iter().map(|bin| {
        Rectangle::new(
            [(bin.start, 0.0), (bin.end, bin.count as f64)],
            BLUE.mix(0.7).filled(),
        )
    }))?;
    Ok(())
}

/// Box plots side by side, whiskers at 1.5 IQR.
pub(crate) fn distribution(area: &Area<'_>, columns: &[Column<'_>]) -> Result<()> {
    let columns: Vec<&Column<'_>> = columns.iter().filter(|c| !c.values.is_empty()).collect();
    ensure!(!columns.is_empty(), "no numeric values to plot");

    let y_range = value_range(columns.iter().flat_map(|c| c.values.iter().copied()))?;
    let label_y = y_range.end;
    let mut chart = ChartBuilder::on(area)
        .caption("Box Plot of Numeric Columns", TITLE_FONT)
        .margin(15)
        .x_label_area_size(20)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..columns.len() as f64, y_range)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .draw()?;

    for (idx, column) in columns.iter().enumerate() {
        let summary = column.summary;
        let (Some(q1), Some(median), Some(q3)) = (summary.q1, summary.median, summary.q3) else {
            continue;
        };
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
        let low = bounds(column.values.iter().copied().filter(|v| *v >= low_fence))
            .map_or(q1, |(lo, _)| lo);
        let high = bounds(column.values.iter().copied().filter(|v| *v <= high_fence))
            .map_or(q3, |(_, hi)| hi);

        let x = idx as f64;
        let centre = x + 0.5;
        let color = palette(idx);

        chart.draw_series(std::iter::once(Rectangle::new(
            [(x + 0.25, q1), (x + 0.75, q3)],
            color.mix(0.5).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x + 0.25, q1), (x + 0.75, q3)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series(
            [
                vec![(x + 0.25, median), (x + 0.75, median)],
                vec![(centre, q3), (centre, high)],
                vec![(centre, q1), (centre, low)],
                vec![(x + 0.4, high), (x + 0.6, high)],
                vec![(x + 0.4, low), (x + 0.6, low)],
            ]
            .into_iter()
            .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
        )?;
        chart.draw_series(
            column
                .values
                .iter()
                .filter(|v| **v < low_fence || **v > high_fence)
                .map(|v| Circle::new((centre, *v), 3, BLACK.filled())),
        )?;
        chart.draw_series(std::iter::once(Text::new(
            column.name.to_string(),
            (x + 0.3, label_y),
            LABEL_FONT,
        )))?;
    }
    Ok(())
}

/// Annotated heatmap of a square correlation matrix.
pub(crate) fn correlation(
    area: &Area<'_>,
    names: &[&str],
    matrix: &[Vec<Option<f64>>],
) -> Result<()> {
    ensure!(names.len() >= 2, "need at least two numeric columns");
    let n = names.len() as f64;

    // one extra row and column hold the labels
    let mut chart = ChartBuilder::on(area)
        .caption("Correlation Heatmap", TITLE_FONT)
        .margin(15)
        .build_cartesian_2d(-1.5f64..n, 0f64..n + 1.0)?;

    for (i, row) in matrix.iter().enumerate() {
        let y = n - 1.0 - i as f64;
        for (j, value) in row.iter().enumerate() {
            let x = j as f64;
            let fill = match value {
                Some(r) => coolwarm(*r),
                None => RGBColor(200, 200, 200),
            };
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x, y), (x + 1.0, y + 1.0)],
                fill.filled(),
            )))?;
            let text = value.map_or_else(|| "n/a".to_string(), |r| format!("{:.2}", r));
            chart.draw_series(std::iter::once(Text::new(
                text,
                (x + 0.3, y + 0.6),
                LABEL_FONT,
            )))?;
        }
    }

    for (idx, name) in names.iter().enumerate() {
        chart.draw_series(std::iter::once(Text::new(
            name.to_string(),
            (-1.4, n - 0.4 - idx as f64),
            LABEL_FONT,
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            name.to_string(),
            (idx as f64 + 0.1, n + 0.6),
            LABEL_FONT,
        )))?;
    }
    Ok(())
}

pub(crate) fn scatter(
    area: &Area<'_>,
    x_name: &str,
    y_name: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    ensure!(!points.is_empty(), "no complete pairs to plot");
    let x_range = value_range(points.iter().map(|(x, _)| *x))?;
    let y_range = value_range(points.iter().map(|(_, y)| *y))?;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{} vs {}", y_name, x_name), TITLE_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;
    chart.configure_mesh().x_desc(x_name).y_desc(y_name).draw()?;
    chart.draw_series(
        points
            .iter()
            .map(|point| Circle::new(*point, 4, BLUE.mix(0.6).filled())),
    )?;
    Ok(())
}

fn indexed(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(idx, v)| (idx as f64, *v))
        .collect()
}

pub(crate) fn line(area: &Area<'_>, column: &Column<'_>) -> Result<()> {
    ensure!(!column.values.is_empty(), "column '{}' has no values", column.name);
    let y_range = value_range(column.values.iter().copied())?;
    let x_range = padded(0.0, (column.values.len() - 1) as f64)?;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Line Plot of {}", column.name), TITLE_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc("Row")
        .y_desc(column.name)
        .draw()?;
    chart.draw_series(LineSeries::new(indexed(column.values), BLUE.stroke_width(2)))?;
    Ok(())
}

pub(crate) fn kde(area: &Area<'_>, column: &Column<'_>) -> Result<()> {
    let Some(curve) = gaussian_kde(column.values, KDE_POINTS) else {
        bail!(
            "cannot estimate a density for '{}' (needs two distinct values)",
            column.name
        );
    };
    let x_range = value_range(curve.iter().map(|(x, _)| *x))?;
    let peak = curve.iter().map(|(_, d)| *d).fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Density of {}", column.name), TITLE_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0f64..(peak * 1.1).max(f64::EPSILON))?;
    chart
        .configure_mesh()
        .x_desc(column.name)
        .y_desc("Density")
        .draw()?;
    chart.draw_series(
        AreaSeries::new(curve.iter().copied(), 0.0, BLUE.mix(0.2))
            .border_style(BLUE.stroke_width(2)),
    )?;
    Ok(())
}

pub(crate) fn area_chart(area: &Area<'_>, column: &Column<'_>) -> Result<()> {
    ensure!(!column.values.is_empty(), "column '{}' has no values", column.name);
    let (min, max) = match bounds(column.values.iter().copied()) {
        Some(b) => b,
        None => bail!("column '{}' has no finite values", column.name),
    };
    let y_range = padded(min.min(0.0), max.max(0.0))?;
    let x_range = padded(0.0, (column.values.len() - 1) as f64)?;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Area Plot of {}", column.name), TITLE_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc("Row")
        .y_desc(column.name)
        .draw()?;
    chart.draw_series(
        AreaSeries::new(indexed(column.values), 0.0, GREEN.mix(0.3))
            .border_style(GREEN.stroke_width(2)),
    )?;
    Ok(())
}

/// Bars of the column means.
pub(crate) fn bar(area: &Area<'_>, means: &[(&str, f64)]) -> Result<()> {
    ensure!(!means.is_empty(), "no column means to plot");
    let (min, max) = match bounds(means.iter().map(|(_, m)| *m)) {
        Some(b) => b,
        None => bail!("column means are not finite"),
    };
    let y_range = padded(min.min(0.0), max.max(0.0))?;
    let label_y = y_range.end;

    let mut chart = ChartBuilder::on(area)
        .caption("Mean of Numeric Columns", TITLE_FONT)
        .margin(15)
        .x_label_area_size(20)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..means.len() as f64, y_range)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .y_desc("Mean")
        .draw()?;

    chart.draw_series(means.iter().enumerate().map(|(idx, (_, mean))| {
        let x = idx as f64;
        Rectangle::new([(x + 0.15, 0.0), (x + 0.85, *mean)], palette(idx).filled())
    }))?;
    chart.draw_series(means.iter().enumerate().map(|(idx, (name, _))| {
        Text::new(name.to_string(), (idx as f64 + 0.2, label_y), LABEL_FONT)
    }))?;
    Ok(())
}

/// Mirrored density outlines, one per column.
pub(crate) fn violin(area: &Area<'_>, columns: &[Column<'_>]) -> Result<()> {
    ensure!(!columns.is_empty(), "no numeric columns to plot");
    let curves: Vec<Option<Vec<(f64, f64)>>> = columns
        .iter()
        .map(|column| gaussian_kde(column.values, KDE_POINTS))
        .collect();

    let y_range = value_range(
        columns
            .iter()
            .flat_map(|c| c.values.iter().copied())
            .chain(curves.iter().flatten().flat_map(|curve| curve.iter().map(|(y, _)| *y))),
    )?;
    let label_y = y_range.end;

    let mut chart = ChartBuilder::on(area)
        .caption("Violin Plot of Numeric Columns", TITLE_FONT)
        .margin(15)
        .x_label_area_size(20)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..columns.len() as f64, y_range)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .draw()?;

    for (idx, (column, curve)) in columns.iter().zip(&curves).enumerate() {
        let centre = idx as f64 + 0.5;
        let color = palette(idx);
        match curve {
            Some(curve) => {
                let peak = curve.iter().map(|(_, d)| *d).fold(0.0, f64::max);
                let scale = if peak > 0.0 { 0.4 / peak } else { 0.0 };
                let outline: Vec<(f64, f64)> = curve
                    .iter()
                    .map(|(y, d)| (centre + d * scale, *y))
                    .chain(curve.iter().rev().map(|(y, d)| (centre - d * scale, *y)))
                    .collect();
                chart.draw_series(std::iter::once(Polygon::new(
                    outline,
                    color.mix(0.5).filled(),
                )))?;
            }
            None => {
                // constant column: a flat bar at its single value
                if let Some(value) = column.values.first() {
                    chart.draw_series(std::iter::once(PathElement::new(
                        vec![(centre - 0.3, *value), (centre + 0.3, *value)],
                        color.stroke_width(3),
                    )))?;
                }
            }
        }

        if let Some(median) = column.summary.median {
            chart.draw_series(std::iter::once(Circle::new(
                (centre, median),
                4,
                WHITE.filled(),
            )))?;
        }
        chart.draw_series(std::iter::once(Text::new(
            column.name.to_string(),
            (idx as f64 + 0.3, label_y),
            LABEL_FONT,
        )))?;
    }
    Ok(())
}

pub(crate) fn pie(area: &Area<'_>, name: &str, counts: &[(&str, usize)]) -> Result<()> {
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    ensure!(total > 0, "column '{}' has no values", name);

    let area = area.titled(&format!("Distribution of {}", name), TITLE_FONT)?;
    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let sizes: Vec<f64> = counts.iter().map(|(_, c)| *c as f64).collect();
    let colors: Vec<RGBColor> = (0..counts.len()).map(palette).collect();
    let labels: Vec<String> = counts.iter().map(|(label, _)| label.to_string()).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(LABEL_FONT);
    pie.percentages(LABEL_FONT);
    area.draw(&pie)?;
    Ok(())
}

/// Horizontal bars of missing-value counts.
pub(crate) fn missing(area: &Area<'_>, counts: &[(&str, usize)]) -> Result<()> {
    ensure!(!counts.is_empty(), "no missing values");
    let widest = counts.iter().map(|(_, c)| *c).max().unwrap_or(0) as f64;
    let n = counts.len() as f64;

    let mut chart = ChartBuilder::on(area)
        .caption("Missing Values by Column", TITLE_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(0f64..(widest * 1.1).max(1.0), 0f64..n)?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_label_formatter(&|_| String::new())
        .x_desc("Missing values")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(idx, (_, count))| {
        let y = n - 1.0 - idx as f64;
        Rectangle::new([(0.0, y + 0.15), (*count as f64, y + 0.85)], RED.mix(0.7).filled())
    }))?;
    chart.draw_series(counts.iter().enumerate().map(|(idx, (name, count))| {
        let y = n - 1.0 - idx as f64;
        Text::new(format!("{} ({})", name, count), (0.0, y + 0.95), LABEL_FONT)
    }))?;
    Ok(())
}
