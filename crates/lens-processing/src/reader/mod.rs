//! Resilient reader: raw bytes plus a format tag to a DataFrame.
//!
//! Text formats (csv, tsv, txt) are decoded through an ordered list of
//! candidate encodings before parsing, with lossy UTF-8 as the last resort.
//! Binary and structured formats are parsed directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_processing::{DataReader, FileFormat, PipelineConfig};
//!
//! let reader = DataReader::from_config(&PipelineConfig::default());
//! let outcome = reader.read(&bytes, FileFormat::Csv)?;
//! println!("decoded as {:?}", outcome.encoding);
//! ```

mod encoding;
mod excel;
mod structured;
mod text;

pub use encoding::{DecodedText, decode_with_fallback, resolve_encoding};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::format::FileFormat;
use excel::WorkbookKind;
use polars::prelude::*;
use text::TextOptions;
use tracing::{debug, info};

/// A decoded table and how it was decoded.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub data: DataFrame,
    /// Encoding label that decoded a text format; `None` for binary formats.
    pub encoding: Option<String>,
    /// Set when the text was decoded with replacement characters.
    pub lossy: bool,
}

/// Reads uploaded bytes into a DataFrame.
#[derive(Debug, Clone)]
pub struct DataReader {
    encodings: Vec<String>,
    text_options: TextOptions,
}

impl Default for DataReader {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl DataReader {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            encodings: config.encodings.clone(),
            text_options: TextOptions {
                na_values: config.na_values.clone(),
                infer_schema_length: config.infer_schema_length,
            },
        }
    }

    /// Parse `bytes` as `format`.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::UnsupportedFormat`] for [`FileFormat::Unknown`]
    /// * [`PipelineError::Read`] when the bytes cannot be parsed
    /// * [`PipelineError::EmptyDataset`] when the table has no rows
    pub fn read(&self, bytes: &[u8], format: FileFormat) -> Result<ReadOutcome> {
        let (data, encoding, lossy) = match format {
            FileFormat::Csv | FileFormat::Tsv | FileFormat::Txt => {
                let (data, decoded_with, lossy) = self.read_text(bytes, format)?;
                (data, Some(decoded_with), lossy)
            }
            FileFormat::Json => (
                structured::read_json(bytes, self.text_options.infer_schema_length)
                    .map_err(|e| PipelineError::read("json", e))?,
                None,
                false,
            ),
            FileFormat::Xlsx => (
                excel::read_workbook(bytes, WorkbookKind::Xlsx)
                    .map_err(|e| PipelineError::read("xlsx", e))?,
                None,
                false,
            ),
            FileFormat::Xls => (
                excel::read_workbook(bytes, WorkbookKind::Xls)
                    .map_err(|e| PipelineError::read("xls", e))?,
                None,
                false,
            ),
            FileFormat::Parquet => (
                structured::read_parquet(bytes).map_err(|e| PipelineError::read("parquet", e))?,
                None,
                false,
            ),
            FileFormat::Feather => (
                structured::read_feather(bytes).map_err(|e| PipelineError::read("feather", e))?,
                None,
                false,
            ),
            FileFormat::Hdf5 => (
                structured::read_hdf5(bytes).map_err(|e| PipelineError::read("hdf5", e))?,
                None,
                false,
            ),
            FileFormat::Unknown => {
                return Err(PipelineError::UnsupportedFormat {
                    filename: None,
                    supported: crate::format::supported_extensions(),
                });
            }
        };

        if data.height() == 0 {
            return Err(PipelineError::EmptyDataset);
        }

        let data = nan_to_null(data).map_err(|e| PipelineError::read(format.as_str(), e))?;
        info!(
            "Read {} data: {} rows x {} columns",
            format,
            data.height(),
            data.width()
        );

        Ok(ReadOutcome {
            data,
            encoding,
            lossy,
        })
    }

    fn read_text(&self, bytes: &[u8], format: FileFormat) -> Result<(DataFrame, String, bool)> {
        let decoded = decode_with_fallback(bytes, &self.encodings);

        let (text, separator) = match format {
            FileFormat::Tsv => (decoded.text, b'\t'),
            FileFormat::Txt if text::first_line_has_tab(bytes) => (decoded.text, b'\t'),
            FileFormat::Txt => {
                debug!("No tab on the first line; splitting on whitespace runs");
                (text::whitespace_to_tabs(&decoded.text), b'\t')
            }
            _ => (decoded.text, b','),
        };

        let data = text::parse_delimited(text, separator, &self.text_options)
            .map_err(|e| PipelineError::read(format.as_str(), e))?;
        Ok((data, decoded.encoding, decoded.lossy))
    }
}

/// Replace floating point NaN with missing values.
fn nan_to_null(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let float_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| column.dtype().is_float())
        .map(|column| column.name().to_string())
        .collect();

    for name in float_columns {
        let series = df.column(&name)?.as_materialized_series().clone();
        let values = crate::utils::numeric_values(&series)?;
        if !values.iter().flatten().any(|v| v.is_nan()) {
            continue;
        }
        let cleaned: Vec<Option<f64>> = values
            .into_iter()
            .map(|value| value.filter(|v| !v.is_nan()))
            .collect();
        df.replace(&name, Series::new(series.name().clone(), cleaned))?;
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_reports_encoding() {
        let outcome = DataReader::default()
            .read(b"name,score\nann,1\nbob,2\n", FileFormat::Csv)
            .unwrap();
        assert_eq!(outcome.data.shape(), (2, 2));
        assert_eq!(outcome.encoding.as_deref(), Some("utf-8"));
        assert!(!outcome.lossy);
    }

    #[test]
    fn test_read_latin1_csv() {
        let outcome = DataReader::default()
            .read(b"city,pop\nS\xe3o Paulo,12\n", FileFormat::Csv)
            .unwrap();
        assert_eq!(outcome.encoding.as_deref(), Some("latin-1"));
        let city = outcome.data.column("city").unwrap().as_materialized_series().clone();
        assert_eq!(city.str().unwrap().get(0), Some("São Paulo"));
    }

    #[test]
    fn test_read_txt_with_whitespace() {
        let outcome = DataReader::default()
            .read(b"a   b\n1  2\n3     4\n", FileFormat::Txt)
            .unwrap();
        assert_eq!(outcome.data.shape(), (2, 2));
    }

    #[test]
    fn test_read_txt_with_tabs() {
        let outcome = DataReader::default()
            .read(b"first name\tage\nAnn Lee\t31\n", FileFormat::Txt)
            .unwrap();
        assert_eq!(outcome.data.shape(), (1, 2));
        assert_eq!(outcome.data.get_column_names_str(), vec!["first name", "age"]);
    }

    #[test]
    fn test_header_only_is_empty() {
        let result = DataReader::default().read(b"a,b\n", FileFormat::Csv);
        assert!(matches!(result, Err(PipelineError::EmptyDataset)));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = DataReader::default()
            .read(b"whatever", FileFormat::Unknown)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnsupportedFormat { filename: None, .. }
        ));
        let message = err.to_string();
        assert!(message.starts_with("Unsupported file format. Supported formats: csv"));
        assert!(!message.contains("''"));
    }

    #[test]
    fn test_json_schema_uses_configured_inference_length() {
        let mut json = String::from("[");
        for i in 0..150 {
            if i > 0 {
                json.push(',');
            }
            if i < 120 {
                json.push_str(&format!(r#"{{"a": {}, "b": null}}"#, i));
            } else {
                json.push_str(&format!(r#"{{"a": {}, "b": "v{}"}}"#, i, i));
            }
        }
        json.push(']');

        let outcome = DataReader::default()
            .read(json.as_bytes(), FileFormat::Json)
            .unwrap();
        assert_eq!(outcome.data.shape(), (150, 2));
        assert_eq!(outcome.data.column("b").unwrap().null_count(), 120);
    }

    #[test]
    fn test_malformed_json_is_read_error() {
        let result = DataReader::default().read(b"[{\"a\": 1,", FileFormat::Json);
        match result {
            Err(PipelineError::Read { format, .. }) => assert_eq!(format, "json"),
            other => panic!("expected read error, got {:?}", other.map(|o| o.data.shape())),
        }
    }

    #[test]
    fn test_nan_becomes_missing() {
        let df = df!["x" => [1.0, f64::NAN, 3.0]].unwrap();
        let cleaned = nan_to_null(df).unwrap();
        assert_eq!(cleaned.column("x").unwrap().null_count(), 1);
    }
}
