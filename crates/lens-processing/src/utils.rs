//! Shared utilities for the pipeline.
//!
//! This module contains helpers used by the cleaner, the profiler, the table
//! generator and the chart renderer, so that every stage agrees on column
//! typing, missing-value counting and duplicate detection.

use indexmap::IndexMap;
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Structural partition of a column, evaluated on its current dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// Text-like values (string, categorical, enum)
    Categorical,
    /// Anything else (boolean, temporal, nested)
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType holds text-like values.
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::String | DataType::Categorical(_, _) | DataType::Enum(_, _)
    )
}

/// Get the kind of a DataType.
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else if is_categorical_dtype(dtype) {
        ColumnKind::Categorical
    } else {
        ColumnKind::Other
    }
}

/// Split the column names of a DataFrame into numeric and categorical,
/// preserving column order. Columns of other kinds appear in neither list.
pub fn partition_columns(df: &DataFrame) -> (Vec<String>, Vec<String>) {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    for column in df.get_columns() {
        match column_kind(column.dtype()) {
            ColumnKind::Numeric => numeric.push(column.name().to_string()),
            ColumnKind::Categorical => categorical.push(column.name().to_string()),
            ColumnKind::Other => {}
        }
    }
    (numeric, categorical)
}

/// Stable lower-case name for a dtype.
pub fn dtype_name(dtype: &DataType) -> String {
    let name = match dtype {
        DataType::Int8 => "int8",
        DataType::Int16 => "int16",
        DataType::Int32 => "int32",
        DataType::Int64 => "int64",
        DataType::UInt8 => "uint8",
        DataType::UInt16 => "uint16",
        DataType::UInt32 => "uint32",
        DataType::UInt64 => "uint64",
        DataType::Float32 => "float32",
        DataType::Float64 => "float64",
        DataType::Boolean => "bool",
        DataType::String => "string",
        DataType::Date => "date",
        DataType::Datetime(_, _) => "datetime",
        DataType::Duration(_) => "duration",
        DataType::Time => "time",
        DataType::Categorical(_, _) | DataType::Enum(_, _) => "category",
        DataType::Null => "null",
        other => return other.to_string(),
    };
    name.to_string()
}

// =============================================================================
// Value Extraction Utilities
// =============================================================================

/// Values of a numeric Series as `f64`, missing entries as `None`.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Values of a Series rendered as strings, missing entries as `None`.
pub fn text_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Count occurrences of each non-missing value.
///
/// The result is ordered by descending count; equal counts keep the order in
/// which the values were first encountered.
pub fn value_counts(series: &Series) -> PolarsResult<IndexMap<String, usize>> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for value in text_values(series)?.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts.sort_by(|_, a, _, b| b.cmp(a));
    Ok(counts)
}

/// Calculate the mode (most frequent value) of a Series as a string.
///
/// Ties go to the value encountered first. Returns `None` when the Series has
/// no non-missing values.
pub fn string_mode(series: &Series) -> Option<String> {
    value_counts(series)
        .ok()
        .and_then(|counts| counts.into_iter().next().map(|(value, _)| value))
}

/// Round to two decimal places.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Estimated in-memory size of a DataFrame in megabytes, two decimals.
pub fn memory_usage_mb(df: &DataFrame) -> f64 {
    round2(df.estimated_size() as f64 / 1024.0 / 1024.0)
}

/// Number of missing cells per column, in column order.
pub fn missing_counts(df: &DataFrame) -> IndexMap<String, usize> {
    df.get_columns()
        .iter()
        .map(|column| (column.name().to_string(), column.null_count()))
        .collect()
}

/// Total number of missing cells.
pub fn total_missing(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|column| column.null_count()).sum()
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always `Float64`.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let filled: Vec<f64> = numeric_values(series)?
        .into_iter()
        .map(|value| value.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a text Series with a specific value.
///
/// The result is always `String`.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let filled: Vec<String> = text_values(series)?
        .into_iter()
        .map(|value| value.unwrap_or_else(|| fill_value.to_string()))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Drop every row that contains at least one missing value.
pub fn drop_incomplete_rows(df: &DataFrame) -> PolarsResult<DataFrame> {
    if df.get_columns().iter().all(|column| column.null_count() == 0) {
        return Ok(df.clone());
    }
    df.drop_nulls::<String>(None)
}

// =============================================================================
// Duplicate Detection Utilities
// =============================================================================

const ROW_INDEX: &str = "__lens_row_index";

/// Copy of `df` whose float columns have `-0.0` folded into `0.0`, so that
/// row hashing compares floats by value.
fn duplicate_keys(df: &DataFrame) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            if !column.dtype().is_float() {
                return Ok(column.clone());
            }
            let folded = column
                .as_materialized_series()
                .cast(&DataType::Float64)?
                .f64()?
                .apply_values(|value| value + 0.0)
                .into_series();
            Ok(folded.into_column())
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}

/// Remove repeated rows, keeping the first occurrence and the original order.
///
/// Text compares exactly (case-sensitive) and missing values are equal to
/// each other.
pub fn drop_duplicates(df: &DataFrame) -> PolarsResult<DataFrame> {
    if df.width() == 0 || df.height() < 2 {
        return Ok(df.clone());
    }

    let subset: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(str::to_string)
        .collect();
    let first_rows = duplicate_keys(df)?
        .with_row_index(PlSmallStr::from_static(ROW_INDEX), None)?
        .unique_stable(Some(&subset), UniqueKeepStrategy::First, None)?;

    if first_rows.height() == df.height() {
        return Ok(df.clone());
    }
    let indices = first_rows.column(ROW_INDEX)?.as_materialized_series().idx()?.clone();
    df.take(&indices)
}

/// Number of rows that repeat an earlier row.
pub fn count_duplicates(df: &DataFrame) -> PolarsResult<usize> {
    Ok(df.height() - drop_duplicates(df)?.height())
}

// =============================================================================
// Tests
// =============================================================================
