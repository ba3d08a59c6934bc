//! Dataset analysis module.
//!
//! This module derives dataset-level metadata from a cleaned DataFrame:
//! - Shape and column names
//! - Stable type names and the numeric/categorical partition
//! - Missing and duplicate counts
//! - Estimated memory footprint

pub mod statistics;

use crate::error::{PipelineError, Result};
use crate::types::AnalysisResult;
use crate::utils::{
    count_duplicates, dtype_name, memory_usage_mb, partition_columns, total_missing,
};
use polars::prelude::*;
use tracing::debug;

/// Read-only analyzer for datasets.
pub struct DataProfiler;

impl DataProfiler {
    /// Describe a dataset.
    pub fn analyze(df: &DataFrame) -> Result<AnalysisResult> {
        let (numeric_columns, categorical_columns) = partition_columns(df);
        let duplicate_rows = count_duplicates(df)
            .map_err(|e| PipelineError::AnalysisFailed(e.to_string()))?;

        let result = AnalysisResult {
            rows: df.height(),
            columns: df.width(),
            columns_names: df
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            data_types: df
                .get_columns()
                .iter()
                .map(|column| (column.name().to_string(), dtype_name(column.dtype())))
                .collect(),
            numeric_columns,
            categorical_columns,
            missing_count: total_missing(df),
            duplicate_rows,
            memory_usage_mb: memory_usage_mb(df),
        };

        debug!(
            "Analyzed {} columns ({} numeric, {} categorical)",
            result.columns,
            result.numeric_columns.len(),
            result.categorical_columns.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_analyze_mixed_frame() {
        let df = df![
            "name" => ["a", "b", "b"],
            "score" => [Some(1.5), None, Some(2.5)],
            "count" => [1i64, 2, 2],
            "active" => [true, false, false],
        ]
        .unwrap();

        let result = DataProfiler::analyze(&df).unwrap();

        assert_eq!(result.rows, 3);
        assert_eq!(result.columns, 4);
        assert_eq!(result.columns_names, vec!["name", "score", "count", "active"]);
        assert_eq!(result.numeric_columns, vec!["score", "count"]);
        assert_eq!(result.categorical_columns, vec!["name"]);
        assert_eq!(result.data_types["score"], "float64");
        assert_eq!(result.data_types["active"], "bool");
        assert_eq!(result.missing_count, 1);
        assert_eq!(result.duplicate_rows, 0);
        assert!(result.memory_usage_mb >= 0.0);
    }

    #[test]
    fn test_analyze_counts_duplicates() {
        let df = df!["k" => ["x", "x", "y"]].unwrap();
        let result = DataProfiler::analyze(&df).unwrap();
        assert_eq!(result.duplicate_rows, 1);
    }

    #[test]
    fn test_analysis_serializes_in_column_order() {
        let df = df!["z" => [1i64], "a" => ["q"]].unwrap();
        let json = serde_json::to_string(&DataProfiler::analyze(&df).unwrap()).unwrap();
        assert!(json.contains(r#""data_types":{"z":"int64","a":"string"}"#));
    }
}
