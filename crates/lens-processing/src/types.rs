use crate::charts::ChartSet;
use crate::format::FileFormat;
use crate::reporting::TableSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Shape and quality of the dataset before cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalStats {
    pub rows: usize,
    pub columns: usize,
    /// Missing cells per column, in column order.
    pub missing_values: IndexMap<String, usize>,
    pub duplicate_rows: usize,
}

/// Shape of the dataset after cleaning and what it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedStats {
    pub rows: usize,
    pub columns: usize,
    pub rows_removed: usize,
    /// Sum of the per-column missing counts before cleaning.
    ///
    /// Counts cells that may later have been removed with their row rather
    /// than filled; see `values_imputed` and `rows_dropped_unresolved`.
    pub missing_values_filled: usize,
    pub duplicate_rows_removed: usize,
    /// Cells actually filled with a median, mode or placeholder.
    pub values_imputed: usize,
    /// Rows removed because a value could not be imputed.
    pub rows_dropped_unresolved: usize,
}

/// Before/after summary produced by the cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub original: OriginalStats,
    pub cleaned: CleanedStats,
}

/// Dataset-level metadata produced by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub rows: usize,
    pub columns: usize,
    pub columns_names: Vec<String>,
    /// Column name to stable type name (`int64`, `float64`, `string`, ...).
    pub data_types: IndexMap<String, String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub missing_count: usize,
    pub duplicate_rows: usize,
    pub memory_usage_mb: f64,
}

/// Everything a single upload produces.
///
/// Serializes with the analysis fields at the top level, next to the
/// cleaning report, the comparison tables and the rendered charts.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub cleaning_report: CleaningReport,
    pub file_format: FileFormat,
    /// Encoding that decoded a text upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub tables: TableSet,
    pub graphs: ChartSet,
}

/// Metadata persisted for every successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub filename: String,
    pub row_count: usize,
    pub column_count: usize,
    /// RFC 3339 timestamp in UTC.
    pub timestamp: String,
}

impl UploadRecord {
    /// Build a record stamped with the current time.
    pub fn now(filename: impl Into<String>, row_count: usize, column_count: usize) -> Self {
        Self {
            filename: filename.into(),
            row_count,
            column_count,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
