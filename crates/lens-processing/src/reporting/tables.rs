//! Comparison tables derived from a cleaned dataset.
//!
//! Every table is computed independently. A table whose precondition does
//! not hold is absent; a table whose computation fails is absent and listed
//! in [`TableSet::failures`].

use crate::profiler::statistics::{pearson, summarize};
use crate::utils::{
    count_duplicates, dtype_name, memory_usage_mb, numeric_values, partition_columns, round2,
    total_missing, value_counts,
};
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// `describe()`-style statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Column-oriented listing of names, types and null counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTypesTable {
    pub column_name: Vec<String>,
    pub data_type: Vec<String>,
    pub non_null_count: Vec<usize>,
    pub null_count: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericComparison {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalComparison {
    pub unique_count: usize,
    pub most_common_value: Option<String>,
    /// Value counts, most frequent first.
    pub value_distribution: IndexMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValues {
    pub missing_count: usize,
    pub missing_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateAnalysis {
    pub total_duplicates: usize,
    pub duplicate_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub total_missing_values: usize,
    pub memory_usage_mb: f64,
}

/// A table that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFailure {
    pub table: String,
    pub reason: String,
}

/// Correlation coefficients; `None` where undefined.
pub type CorrelationMatrix = IndexMap<String, IndexMap<String, Option<f64>>>;

/// All comparison tables for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptive_statistics: Option<IndexMap<String, DescriptiveStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_types: Option<DataTypesTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_comparison: Option<IndexMap<String, NumericComparison>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical_comparison: Option<IndexMap<String, CategoricalComparison>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_values: Option<IndexMap<String, MissingValues>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_matrix: Option<CorrelationMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_analysis: Option<DuplicateAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TableFailure>,
}

impl TableSet {
    /// Names of the tables present, in serialization order.
    pub fn table_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.descriptive_statistics.is_some() {
            names.push("descriptive_statistics");
        }
        if self.data_types.is_some() {
            names.push("data_types");
        }
        if self.numeric_comparison.is_some() {
            names.push("numeric_comparison");
        }
        if self.categorical_comparison.is_some() {
            names.push("categorical_comparison");
        }
        if self.missing_values.is_some() {
            names.push("missing_values");
        }
        if self.correlation_matrix.is_some() {
            names.push("correlation_matrix");
        }
        if self.duplicate_analysis.is_some() {
            names.push("duplicate_analysis");
        }
        if self.summary.is_some() {
            names.push("summary");
        }
        names
    }
}

/// Builds the comparison tables.
pub struct TableGenerator;

impl TableGenerator {
    /// Compute every applicable table. Never fails.
    pub fn build_tables(df: &DataFrame) -> TableSet {
        let (numeric, categorical) = partition_columns(df);
        let mut failures = Vec::new();

        let tables = TableSet {
            descriptive_statistics: attempt(&mut failures, "descriptive_statistics", || {
                descriptive_statistics(df, &numeric)
            }),
            data_types: attempt(&mut failures, "data_types", || data_types(df).map(Some)),
            numeric_comparison: attempt(&mut failures, "numeric_comparison", || {
                numeric_comparison(df, &numeric)
            }),
            categorical_comparison: attempt(&mut failures, "categorical_comparison", || {
                categorical_comparison(df, &categorical)
            }),
            missing_values: attempt(&mut failures, "missing_values", || {
                Ok(Some(missing_values(df)))
            }),
            correlation_matrix: attempt(&mut failures, "correlation_matrix", || {
                correlation_matrix(df, &numeric)
            }),
            duplicate_analysis: attempt(&mut failures, "duplicate_analysis", || {
                duplicate_analysis(df).map(Some)
            }),
            summary: attempt(&mut failures, "summary", || {
                Ok(Some(summary(df, numeric.len(), categorical.len())))
            }),
            failures: Vec::new(),
        };

        debug!("Built {} tables", tables.table_names().len());
        TableSet { failures, ..tables }
    }
}

/// Run one table builder, recording a failure instead of propagating it.
fn attempt<T>(
    failures: &mut Vec<TableFailure>,
    table: &str,
    build: impl FnOnce() -> PolarsResult<Option<T>>,
) -> Option<T> {
    match build() {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to build table '{}': {}", table, e);
            failures.push(TableFailure {
                table: table.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn column_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    numeric_values(df.column(name)?.as_materialized_series())
}

fn descriptive_statistics(
    df: &DataFrame,
    numeric: &[String],
) -> PolarsResult<Option<IndexMap<String, DescriptiveStats>>> {
    if numeric.is_empty() {
        return Ok(None);
    }
    let mut table = IndexMap::new();
    for name in numeric {
        let stats = summarize(df.column(name)?.as_materialized_series())?;
        table.insert(
            name.clone(),
            DescriptiveStats {
                count: stats.count,
                mean: stats.mean,
                std: stats.std,
                min: stats.min,
                p25: stats.q1,
                p50: stats.median,
                p75: stats.q3,
                max: stats.max,
            },
        );
    }
    Ok(Some(table))
}

fn data_types(df: &DataFrame) -> PolarsResult<DataTypesTable> {
    let mut table = DataTypesTable::default();
    for column in df.get_columns() {
        let nulls = column.null_count();
        table.column_name.push(column.name().to_string());
        table.data_type.push(dtype_name(column.dtype()));
        table.non_null_count.push(column.len() - nulls);
        table.null_count.push(nulls);
    }
    Ok(table)
}

fn numeric_comparison(
    df: &DataFrame,
    numeric: &[String],
) -> PolarsResult<Option<IndexMap<String, NumericComparison>>> {
    if numeric.is_empty() {
        return Ok(None);
    }
    let mut table = IndexMap::new();
    for name in numeric {
        let stats = summarize(df.column(name)?.as_materialized_series())?;
        table.insert(
            name.clone(),
            NumericComparison {
                count: stats.count,
                mean: stats.mean,
                std: stats.std,
                min: stats.min,
                max: stats.max,
                q1: stats.q1,
                median: stats.median,
                q3: stats.q3,
            },
        );
    }
    Ok(Some(table))
}

fn categorical_comparison(
    df: &DataFrame,
    categorical: &[String],
) -> PolarsResult<Option<IndexMap<String, CategoricalComparison>>> {
    if categorical.is_empty() {
        return Ok(None);
    }
    let mut table = IndexMap::new();
    for name in categorical {
        let counts = value_counts(df.column(name)?.as_materialized_series())?;
        table.insert(
            name.clone(),
            CategoricalComparison {
                unique_count: counts.len(),
                most_common_value: counts.keys().next().cloned(),
                value_distribution: counts,
            },
        );
    }
    Ok(Some(table))
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

fn missing_values(df: &DataFrame) -> IndexMap<String, MissingValues> {
    df.get_columns()
        .iter()
        .filter(|column| column.null_count() > 0)
        .map(|column| {
            (
                column.name().to_string(),
                MissingValues {
                    missing_count: column.null_count(),
                    missing_percentage: percentage(column.null_count(), df.height()),
                },
            )
        })
        .collect()
}

fn correlation_matrix(
    df: &DataFrame,
    numeric: &[String],
) -> PolarsResult<Option<CorrelationMatrix>> {
    if numeric.len() < 2 {
        return Ok(None);
    }
    let columns = numeric
        .iter()
        .map(|name| column_values(df, name))
        .collect::<PolarsResult<Vec<_>>>()?;

    let matrix = numeric
        .iter()
        .zip(&columns)
        .map(|(row_name, row_values)| {
            let row = numeric
                .iter()
                .zip(&columns)
                .map(|(col_name, col_values)| (col_name.clone(), pearson(row_values, col_values)))
                .collect();
            (row_name.clone(), row)
        })
        .collect();
    Ok(Some(matrix))
}

fn duplicate_analysis(df: &DataFrame) -> PolarsResult<DuplicateAnalysis> {
    let total_duplicates = count_duplicates(df)?;
    Ok(DuplicateAnalysis {
        total_duplicates,
        duplicate_percentage: percentage(total_duplicates, df.height()),
    })
}

fn summary(df: &DataFrame, numeric: usize, categorical: usize) -> SummaryTable {
    SummaryTable {
        total_rows: df.height(),
        total_columns: df.width(),
        numeric_columns: numeric,
        categorical_columns: categorical,
        total_missing_values: total_missing(df),
        memory_usage_mb: memory_usage_mb(df),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df![
            "age" => [Some(30.0), Some(32.5), Some(35.0), None],
            "income" => [Some(100i64), Some(200), Some(300), Some(300)],
            "city" => [Some("A"), Some("B"), Some("A"), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_all_tables_for_mixed_frame() {
        let tables = TableGenerator::build_tables(&sample());
        assert_eq!(
            tables.table_names(),
            vec![
                "descriptive_statistics",
                "data_types",
                "numeric_comparison",
                "categorical_comparison",
                "missing_values",
                "correlation_matrix",
                "duplicate_analysis",
                "summary",
            ]
        );
        assert!(tables.failures.is_empty());
    }

    #[test]
    fn test_descriptive_statistics_values() {
        let tables = TableGenerator::build_tables(&sample());
        let stats = &tables.descriptive_statistics.unwrap()["age"];
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, Some(32.5));
        assert_eq!(stats.min, Some(30.0));
        assert_eq!(stats.p25, Some(31.25));
        assert_eq!(stats.p50, Some(32.5));
        assert_eq!(stats.p75, Some(33.75));
        assert_eq!(stats.max, Some(35.0));
        assert_eq!(stats.std, Some(2.5));
    }

    #[test]
    fn test_descriptive_statistics_serializes_percentile_keys() {
        let tables = TableGenerator::build_tables(&sample());
        let json = serde_json::to_value(&tables).unwrap();
        let age = &json["descriptive_statistics"]["age"];
        assert_eq!(age["50%"], serde_json::json!(32.5));
        assert!(age.get("25%").is_some());
        assert!(age.get("75%").is_some());
    }

    #[test]
    fn test_categorical_comparison() {
        let tables = TableGenerator::build_tables(&sample());
        let city = &tables.categorical_comparison.unwrap()["city"];
        assert_eq!(city.unique_count, 2);
        assert_eq!(city.most_common_value.as_deref(), Some("A"));
        let distribution: Vec<(&str, usize)> = city
            .value_distribution
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        assert_eq!(distribution, vec![("A", 2), ("B", 1)]);
    }

    #[test]
    fn test_missing_values_only_lists_incomplete_columns() {
        let tables = TableGenerator::build_tables(&sample());
        let missing = tables.missing_values.unwrap();
        assert_eq!(missing.keys().collect::<Vec<_>>(), vec!["age", "city"]);
        assert_eq!(missing["age"].missing_count, 1);
        assert_eq!(missing["age"].missing_percentage, 25.0);
    }

    #[test]
    fn test_missing_values_present_but_empty_for_complete_frame() {
        let df = df!["x" => [1i64, 2]].unwrap();
        let tables = TableGenerator::build_tables(&df);
        assert_eq!(tables.missing_values, Some(IndexMap::new()));
    }

    #[test]
    fn test_correlation_matrix_is_symmetric() {
        let tables = TableGenerator::build_tables(&sample());
        let matrix = tables.correlation_matrix.unwrap();
        let ab = matrix["age"]["income"].unwrap();
        let ba = matrix["income"]["age"].unwrap();
        assert!((ab - ba).abs() < 1e-12);
        assert!((matrix["age"]["age"].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_correlation_is_null() {
        let df = df![
            "flat" => [1.0, 1.0, 1.0],
            "rising" => [1.0, 2.0, 3.0],
        ]
        .unwrap();
        let matrix = TableGenerator::build_tables(&df).correlation_matrix.unwrap();
        assert_eq!(matrix["flat"]["rising"], None);
        assert_eq!(matrix["flat"]["flat"], None);
    }

    #[test]
    fn test_single_numeric_column_has_no_correlation() {
        let df = df!["x" => [1.0, 2.0], "label" => ["a", "b"]].unwrap();
        let tables = TableGenerator::build_tables(&df);
        assert!(tables.correlation_matrix.is_none());
        assert!(tables.descriptive_statistics.is_some());
    }

    #[test]
    fn test_text_only_frame() {
        let df = df!["label" => ["a", "b", "a"]].unwrap();
        let tables = TableGenerator::build_tables(&df);
        assert!(tables.descriptive_statistics.is_none());
        assert!(tables.numeric_comparison.is_none());
        assert!(tables.correlation_matrix.is_none());
        assert_eq!(tables.duplicate_analysis.unwrap().total_duplicates, 1);
        assert_eq!(tables.summary.unwrap().categorical_columns, 1);
    }

    #[test]
    fn test_duplicate_percentage_rounded() {
        let df = df!["k" => ["a", "a", "b"]].unwrap();
        let analysis = TableGenerator::build_tables(&df).duplicate_analysis.unwrap();
        assert_eq!(analysis.duplicate_percentage, 33.33);
    }

    #[test]
    fn test_data_types_table_is_columnar() {
        let tables = TableGenerator::build_tables(&sample());
        let types = tables.data_types.unwrap();
        assert_eq!(types.column_name, vec!["age", "income", "city"]);
        assert_eq!(types.data_type, vec!["float64", "int64", "string"]);
        assert_eq!(types.non_null_count, vec![3, 4, 3]);
        assert_eq!(types.null_count, vec![1, 0, 1]);
    }
}
