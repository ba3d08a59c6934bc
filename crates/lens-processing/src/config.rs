//! Configuration types for the ingestion and analysis pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::reader::resolve_encoding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Candidate text encodings, tried in order for csv/tsv/txt input.
pub const DEFAULT_ENCODINGS: [&str; 5] =
    ["utf-8", "latin-1", "windows-1252", "iso-8859-1", "cp1252"];

/// Cell values read as missing in text input (the pandas default set).
pub const DEFAULT_NA_VALUES: [&str; 19] = [
    "", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "n/a", "<NA>", "-NaN", "-nan",
    "#NA", "1.#IND", "1.#QNAN", "-1.#IND", "-1.#QNAN", "#N/A N/A",
];

/// Literal used to fill a text column that has no mode.
pub const DEFAULT_UNKNOWN_PLACEHOLDER: &str = "Unknown";

/// Rendering options for the chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Canvas width in pixels.
    /// Default: 1000
    pub width: u32,

    /// Canvas height in pixels.
    /// Default: 600
    pub height: u32,

    /// Number of histogram bins.
    /// Default: 30
    pub histogram_bins: usize,

    /// A pie chart is drawn only when the first text column has at most
    /// this many distinct values.
    /// Default: 10
    pub pie_max_categories: usize,

    /// Number of numeric columns shown in the bar chart of means.
    /// Default: 5
    pub bar_max_columns: usize,

    /// Number of numeric columns shown in the violin plot.
    /// Default: 4
    pub violin_max_columns: usize,

    /// Prefix every image with `data:image/png;base64,`.
    /// Default: false
    pub data_uri_prefix: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            histogram_bins: 30,
            pie_max_categories: 10,
            bar_max_columns: 5,
            violin_max_columns: 4,
            data_uri_prefix: false,
        }
    }
}

/// Configuration for the pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lens_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .generate_charts(false)
///     .encodings(["utf-8", "windows-1252"])
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ordered encoding labels tried when decoding text formats.
    /// Default: utf-8, latin-1, windows-1252, iso-8859-1, cp1252
    pub encodings: Vec<String>,

    /// Cell values read as missing in text formats.
    pub na_values: Vec<String>,

    /// Rows (or JSON records) scanned for schema inference. `None` scans
    /// the full file.
    /// Default: None
    pub infer_schema_length: Option<usize>,

    /// Fill value for text columns without a mode.
    /// Default: "Unknown"
    pub unknown_placeholder: String,

    /// Whether to build the comparison tables.
    /// Default: true
    pub generate_tables: bool,

    /// Whether to render charts.
    /// Default: true
    pub generate_charts: bool,

    /// Chart rendering options.
    pub charts: ChartConfig,

    /// Output directory for report files.
    /// Default: "outputs"
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            encodings: DEFAULT_ENCODINGS.iter().map(|e| e.to_string()).collect(),
            na_values: DEFAULT_NA_VALUES.iter().map(|v| v.to_string()).collect(),
            infer_schema_length: None,
            unknown_placeholder: DEFAULT_UNKNOWN_PLACEHOLDER.to_string(),
            generate_tables: true,
            generate_charts: true,
            charts: ChartConfig::default(),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.encodings.is_empty() {
            return Err(ConfigValidationError::NoEncodings);
        }

        if let Some(label) = self
            .encodings
            .iter()
            .find(|label| resolve_encoding(label).is_none())
        {
            return Err(ConfigValidationError::UnknownEncoding(label.clone()));
        }

        if self.charts.width == 0 || self.charts.height == 0 {
            return Err(ConfigValidationError::InvalidCanvas {
                width: self.charts.width,
                height: self.charts.height,
            });
        }

        if self.charts.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidBins(self.charts.histogram_bins));
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::InvalidSchemaLength);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one candidate encoding is required")]
    NoEncodings,

    #[error("Unknown encoding label: '{0}'")]
    UnknownEncoding(String),

    #[error("Invalid canvas size {width}x{height} (both sides must be at least 1)")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("Invalid histogram bins: {0} (must be at least 1)")]
    InvalidBins(usize),

    #[error("Schema inference length must be at least 1 row (use None for a full scan)")]
    InvalidSchemaLength,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    encodings: Option<Vec<String>>,
    na_values: Option<Vec<String>>,
    infer_schema_length: Option<usize>,
    unknown_placeholder: Option<String>,
    generate_tables: Option<bool>,
    generate_charts: Option<bool>,
    charts: Option<ChartConfig>,
    output_dir: Option<PathBuf>,
}

impl PipelineConfigBuilder {
    /// Set the ordered list of candidate encodings for text formats.
    pub fn encodings<I, S>(mut self, encodings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encodings = Some(encodings.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the set of cell values treated as missing.
    pub fn na_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.na_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Limit schema inference to the first `rows` rows or records.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the fill value for text columns that have no mode.
    pub fn unknown_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.unknown_placeholder = Some(placeholder.into());
        self
    }

    /// Enable or disable comparison table generation.
    pub fn generate_tables(mut self, generate: bool) -> Self {
        self.generate_tables = Some(generate);
        self
    }

    /// Enable or disable chart rendering.
    pub fn generate_charts(mut self, generate: bool) -> Self {
        self.generate_charts = Some(generate);
        self
    }

    /// Set the chart rendering options.
    pub fn charts(mut self, charts: ChartConfig) -> Self {
        self.charts = Some(charts);
        self
    }

    /// Set the output directory for report files.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            encodings: self.encodings.unwrap_or(defaults.encodings),
            na_values: self.na_values.unwrap_or(defaults.na_values),
            infer_schema_length: self.infer_schema_length,
            unknown_placeholder: self
                .unknown_placeholder
                .unwrap_or(defaults.unknown_placeholder),
            generate_tables: self.generate_tables.unwrap_or(true),
            generate_charts: self.generate_charts.unwrap_or(true),
            charts: self.charts.unwrap_or_default(),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.encodings[0], "utf-8");
        assert_eq!(config.encodings.len(), 5);
        assert_eq!(config.unknown_placeholder, "Unknown");
        assert_eq!(config.charts.histogram_bins, 30);
        assert_eq!(config.charts.pie_max_categories, 10);
        assert!(config.generate_tables);
        assert!(config.generate_charts);
        assert!(!config.charts.data_uri_prefix);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .encodings(["windows-1252"])
            .generate_charts(false)
            .unknown_placeholder("n/a")
            .infer_schema_length(500)
            .build()
            .unwrap();

        assert_eq!(config.encodings, vec!["windows-1252".to_string()]);
        assert!(!config.generate_charts);
        assert_eq!(config.unknown_placeholder, "n/a");
        assert_eq!(config.infer_schema_length, Some(500));
    }

    #[test]
    fn test_validation_rejects_unknown_encoding() {
        let result = PipelineConfig::builder().encodings(["klingon-8"]).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::UnknownEncoding(label) if label == "klingon-8"
        ));
    }

    #[test]
    fn test_validation_rejects_empty_encodings() {
        let result = PipelineConfig::builder()
            .encodings(Vec::<String>::new())
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::NoEncodings
        ));
    }

    #[test]
    fn test_validation_rejects_zero_canvas() {
        let charts = ChartConfig {
            width: 0,
            ..ChartConfig::default()
        };
        let result = PipelineConfig::builder().charts(charts).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCanvas { width: 0, .. }
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.encodings, deserialized.encodings);
        assert_eq!(config.charts, deserialized.charts);
    }
}
