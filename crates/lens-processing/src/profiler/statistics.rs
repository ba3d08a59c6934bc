//! Statistical functions shared by the cleaner, the tables and the charts.
//!
//! Column summaries come from polars aggregations. Pairwise correlation,
//! histogram binning and density estimation work on plain `f64` slices
//! that contain no missing values. Statistics over zero values, and
//! statistics that are not finite, are `None`.

use polars::prelude::*;

/// Count, moments and quartiles of a set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

#[inline]
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Summarize the non-missing values of a numeric Series.
///
/// `std` is the sample standard deviation and quartiles interpolate
/// linearly between the two closest ranks.
pub fn summarize(series: &Series) -> PolarsResult<Summary> {
    let values = series.cast(&DataType::Float64)?.drop_nulls();
    let quantile = |q: f64| -> PolarsResult<Option<f64>> {
        let scalar = values.quantile_reduce(q, QuantileMethod::Linear)?;
        Ok(finite(scalar.value().extract::<f64>()))
    };

    Ok(Summary {
        count: values.len(),
        mean: finite(values.mean()),
        std: finite(values.std(1)),
        min: finite(values.min::<f64>()?),
        q1: quantile(0.25)?,
        median: finite(values.median()),
        q3: quantile(0.75)?,
        max: finite(values.max::<f64>()?),
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (one delta degree of freedom).
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}

/// Pearson correlation over the pairs where both sides are present.
///
/// `None` when fewer than two complete pairs exist, either side is
/// constant, or the coefficient overflows.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = covariance / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Equal-width histogram bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Split the value range into `bins` equal-width bins.
///
/// The last bin is closed on the right. A constant column gets a single
/// unit-wide bin centred on its value. Non-finite values are not counted,
/// and a range too wide to represent yields no bins.
pub fn build_histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max - min).is_finite() {
        return Vec::new();
    }

    if min == max {
        return vec![Bin {
            start: min - 0.5,
            end: max + 0.5,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut histogram: Vec<Bin> = (0..bins)
        .map(|idx| Bin {
            start: min + width * idx as f64,
            end: min + width * (idx + 1) as f64,
            count: 0,
        })
        .collect();

    for value in &values {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        histogram[idx].count += 1;
    }
    histogram
}

/// Gaussian kernel density estimate with Scott's bandwidth, evaluated at
/// `points` evenly spaced positions spanning three bandwidths past the data.
///
/// `None` for fewer than two values or a zero-variance column.
pub fn gaussian_kde(values: &[f64], points: usize) -> Option<Vec<(f64, f64)>> {
    let std = sample_std(values)?;
    if std == 0.0 || !std.is_finite() || points < 2 {
        return None;
    }

    let n = values.len() as f64;
    let bandwidth = std * n.powf(-0.2);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min) - 3.0 * bandwidth;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 3.0 * bandwidth;
    let step = (max - min) / (points - 1) as f64;
    if !step.is_finite() {
        return None;
    }
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    Some(
        (0..points)
            .map(|idx| {
                let x = min + step * idx as f64;
                let density = values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum::<f64>()
                    * norm;
                (x, density)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== summary tests ====================

    fn series(values: &[f64]) -> Series {
        Series::new("v".into(), values)
    }

    #[test]
    fn test_summarize_basic() {
        let summary = summarize(&series(&[4.0, 1.0, 3.0, 2.0, 5.0])).unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, Some(3.0));
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.q1, Some(2.0));
        assert_eq!(summary.median, Some(3.0));
        assert_eq!(summary.q3, Some(4.0));
        assert_eq!(summary.max, Some(5.0));
        // Variance = 10 / 4 = 2.5
        assert!((summary.std.unwrap() - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_skips_missing_and_casts_integers() {
        let ints = Series::new("n".into(), &[Some(35i64), None, Some(30)]);
        let summary = summarize(&ints).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.median, Some(32.5));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&series(&[])).unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.median, None);
        assert_eq!(summary.q1, None);
        assert_eq!(summary.std, None);
    }

    #[test]
    fn test_summarize_single_value_has_no_std() {
        let summary = summarize(&series(&[7.0])).unwrap();
        assert_eq!(summary.std, None);
        assert_eq!(summary.median, Some(7.0));
    }

    #[test]
    fn test_summarize_infinite_moments_are_none() {
        let summary = summarize(&series(&[1.0, f64::INFINITY, f64::NEG_INFINITY, 5.0])).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.std, None);
        assert_eq!(summary.min, None);
        assert_eq!(summary.max, None);
    }

    #[test]
    fn test_quartiles_interpolate() {
        let summary = summarize(&series(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        assert_eq!(summary.q1, Some(1.75));
        assert_eq!(summary.median, Some(2.5));
        assert_eq!(summary.q3, Some(3.25));
    }

    #[test]
    fn test_std_needs_two_values() {
        assert_eq!(sample_std(&[7.0]), None);
        assert_eq!(sample_std(&[7.0, 7.0]), Some(0.0));
    }

    // ==================== correlation tests ====================

    #[test]
    fn test_pearson_perfect() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);

        let inverted = [Some(3.0), Some(2.0), Some(1.0)];
        assert!((pearson(&x, &inverted).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_pairwise_complete() {
        let x = [Some(1.0), None, Some(2.0), Some(3.0)];
        let y = [Some(1.0), Some(100.0), Some(2.0), Some(3.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_overflow_is_undefined() {
        let x = [Some(1e308), Some(-1e308), Some(0.0)];
        let y = [Some(-1e308), Some(1e308), Some(0.0)];
        assert_eq!(pearson(&x, &y), None);
    }

    #[test]
    fn test_pearson_undefined() {
        let constant = [Some(1.0), Some(1.0), Some(1.0)];
        let varying = [Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&constant, &varying), None);
        assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), None);
    }

    // ==================== histogram tests ====================

    #[test]
    fn test_histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let bins = build_histogram(&values, 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 100);
        assert!((bins[29].end - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_constant_column() {
        let bins = build_histogram(&[2.0, 2.0, 2.0], 30);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
        assert!(bins[0].start < bins[0].end);
    }

    #[test]
    fn test_histogram_ignores_non_finite() {
        let bins = build_histogram(&[1.0, f64::INFINITY, f64::NEG_INFINITY, 5.0], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(bins[0].start, 1.0);
        assert_eq!(bins[3].end, 5.0);
    }

    #[test]
    fn test_histogram_unrepresentable_range_is_empty() {
        assert!(build_histogram(&[1e308, -1e308, 0.0], 30).is_empty());
    }

    // ==================== kde tests ====================

    #[test]
    fn test_kde_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.0, 6.0];
        let curve = gaussian_kde(&values, 200).unwrap();
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_kde_zero_variance() {
        assert!(gaussian_kde(&[3.0, 3.0, 3.0], 100).is_none());
        assert!(gaussian_kde(&[3.0], 100).is_none());
    }

    #[test]
    fn test_kde_overflowing_spread() {
        assert!(gaussian_kde(&[1e308, -1e308, 0.0], 100).is_none());
    }
}
