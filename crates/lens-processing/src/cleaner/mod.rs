//! Data cleaning module.
//!
//! This module provides functionality for:
//! - Removing exact duplicate rows
//! - Imputing missing values per column (median or mode)
//! - Dropping rows that could not be imputed
//! - Reporting the dataset before and after cleaning

mod imputer;

pub use imputer::{Imputation, StatisticalImputer};

use crate::error::{PipelineError, Result};
use crate::types::{CleanedStats, CleaningReport, OriginalStats};
use crate::utils::{count_duplicates, drop_duplicates, drop_incomplete_rows, missing_counts};
use polars::prelude::*;
use tracing::{debug, info};

/// Deterministic cleaner for uploaded datasets.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    imputer: StatisticalImputer,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_UNKNOWN_PLACEHOLDER)
    }
}

impl DataCleaner {
    /// Create a cleaner that fills mode-less text columns with `placeholder`.
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            imputer: StatisticalImputer::new(placeholder),
        }
    }

    /// Clean a dataset.
    ///
    /// 1. Remove duplicate rows (first occurrence wins)
    /// 2. Fill missing numeric values with the median, text values with the
    ///    mode
    /// 3. Drop rows that still contain a missing value
    /// 4. Remove duplicate rows again
    ///
    /// Never fails because of the shape of the data; errors only come from
    /// the underlying frame operations.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningReport)> {
        info!("Cleaning dataset ({} rows x {} columns)", df.height(), df.width());

        let original = OriginalStats {
            rows: df.height(),
            columns: df.width(),
            missing_values: missing_counts(&df),
            duplicate_rows: count_duplicates(&df).map_err(cleaning_failed)?,
        };

        let mut df = drop_duplicates(&df).map_err(cleaning_failed)?;
        let first_pass_removed = original.rows - df.height();
        if first_pass_removed > 0 {
            debug!("Removed {} duplicate rows", first_pass_removed);
        }

        let mut values_imputed = 0;
        let incomplete: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|column| column.null_count() > 0)
            .map(|column| column.name().to_string())
            .collect();
        for name in incomplete {
            let imputation = self
                .imputer
                .impute_column(&mut df, &name)
                .map_err(cleaning_failed)?;
            values_imputed += imputation.filled();
        }

        let before_drop = df.height();
        df = drop_incomplete_rows(&df).map_err(cleaning_failed)?;
        let rows_dropped_unresolved = before_drop - df.height();
        if rows_dropped_unresolved > 0 {
            debug!(
                "Dropped {} rows with values that could not be imputed",
                rows_dropped_unresolved
            );
        }

        let before_second_pass = df.height();
        df = drop_duplicates(&df).map_err(cleaning_failed)?;
        let second_pass_removed = before_second_pass - df.height();

        let cleaned = CleanedStats {
            rows: df.height(),
            columns: df.width(),
            rows_removed: original.rows - df.height(),
            missing_values_filled: original.missing_values.values().sum(),
            duplicate_rows_removed: first_pass_removed + second_pass_removed,
            values_imputed,
            rows_dropped_unresolved,
        };

        info!(
            "Cleaning complete: {} rows removed, {} values imputed",
            cleaned.rows_removed, cleaned.values_imputed
        );

        Ok((df, CleaningReport { original, cleaned }))
    }
}

fn cleaning_failed(error: PolarsError) -> PipelineError {
    PipelineError::CleaningFailed(error.to_string())
}
