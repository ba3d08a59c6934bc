//! Statistical imputation.
//!
//! Numeric columns are filled with their median, text columns with their
//! mode or a placeholder when no value is present at all.

use crate::utils::{
    ColumnKind, column_kind, fill_numeric_nulls, fill_string_nulls, string_mode,
};
use polars::prelude::*;
use tracing::debug;

/// What happened to a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Imputation {
    /// Filled `filled` cells with the column median.
    Median { value: f64, filled: usize },
    /// Filled `filled` cells with the most frequent value.
    Mode { value: String, filled: usize },
    /// No value was present; filled every cell with the placeholder.
    Placeholder { value: String, filled: usize },
    /// The column was left as-is.
    Skipped,
}

impl Imputation {
    /// Number of cells that received a value.
    pub fn filled(&self) -> usize {
        match self {
            Self::Median { filled, .. }
            | Self::Mode { filled, .. }
            | Self::Placeholder { filled, .. } => *filled,
            Self::Skipped => 0,
        }
    }
}

/// Median/mode imputer for missing values.
#[derive(Debug, Clone)]
pub struct StatisticalImputer {
    placeholder: String,
}

impl StatisticalImputer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    /// Fill the missing values of one column in place.
    ///
    /// Filling a numeric column widens it to `Float64`; filling a text
    /// column turns it into `String`.
    pub fn impute_column(&self, df: &mut DataFrame, col_name: &str) -> PolarsResult<Imputation> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing == 0 {
            return Ok(Imputation::Skipped);
        }

        let imputation = match column_kind(series.dtype()) {
            ColumnKind::Numeric => match series.median() {
                Some(value) => {
                    df.replace(col_name, fill_numeric_nulls(&series, value)?)?;
                    Imputation::Median {
                        value,
                        filled: missing,
                    }
                }
                None => Imputation::Skipped,
            },
            ColumnKind::Categorical => match string_mode(&series) {
                Some(value) => {
                    df.replace(col_name, fill_string_nulls(&series, &value)?)?;
                    Imputation::Mode {
                        value,
                        filled: missing,
                    }
                }
                None => {
                    df.replace(col_name, fill_string_nulls(&series, &self.placeholder)?)?;
                    Imputation::Placeholder {
                        value: self.placeholder.clone(),
                        filled: missing,
                    }
                }
            },
            ColumnKind::Other => Imputation::Skipped,
        };

        match &imputation {
            Imputation::Median { value, filled } => {
                debug!("Filled {} values in '{}' with median {}", filled, col_name, value)
            }
            Imputation::Mode { value, filled } => {
                debug!("Filled {} values in '{}' with mode '{}'", filled, col_name, value)
            }
            Imputation::Placeholder { value, filled } => {
                debug!("Filled {} values in '{}' with placeholder '{}'", filled, col_name, value)
            }
            Imputation::Skipped => debug!(
                "Left {} missing values in '{}' ({})",
                missing,
                col_name,
                series.dtype()
            ),
        }

        Ok(imputation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imputer() -> StatisticalImputer {
        StatisticalImputer::new("Unknown")
    }

    #[test]
    fn test_median_uses_present_values_only() {
        let mut df = df!["x" => [Some(1i64), None, Some(4), Some(10)]].unwrap();
        let result = imputer().impute_column(&mut df, "x").unwrap();

        assert_eq!(result, Imputation::Median { value: 4.0, filled: 1 });
        assert_eq!(df.column("x").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("x").unwrap().null_count(), 0);
    }

    #[test]
    fn test_mode_tie_breaks_on_first_occurrence() {
        let mut df = df!["c" => [Some("b"), Some("a"), None, Some("a"), Some("b")]].unwrap();
        let result = imputer().impute_column(&mut df, "c").unwrap();
        assert_eq!(
            result,
            Imputation::Mode {
                value: "b".to_string(),
                filled: 1
            }
        );
    }

    #[test]
    fn test_all_missing_numeric_is_skipped() {
        let mut df = df!["x" => [None::<f64>, None]].unwrap();
        let result = imputer().impute_column(&mut df, "x").unwrap();
        assert_eq!(result, Imputation::Skipped);
        assert_eq!(df.column("x").unwrap().null_count(), 2);
    }

    #[test]
    fn test_boolean_is_skipped() {
        let mut df = df!["b" => [Some(true), None]].unwrap();
        assert_eq!(imputer().impute_column(&mut df, "b").unwrap(), Imputation::Skipped);
    }

    #[test]
    fn test_complete_column_is_untouched() {
        let mut df = df!["x" => [1i64, 2]].unwrap();
        assert_eq!(imputer().impute_column(&mut df, "x").unwrap(), Imputation::Skipped);
        assert_eq!(df.column("x").unwrap().dtype(), &DataType::Int64);
    }
}
