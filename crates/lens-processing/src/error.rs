//! Custom error types for the ingestion and analysis pipeline.
//!
//! Errors are serializable so they can be handed to a caller (an HTTP layer,
//! a desktop frontend, the CLI) as a `{code, message}` pair.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The file extension does not map to a supported format.
    ///
    /// `filename` is `None` when the format was handed to the reader
    /// directly rather than detected from a name.
    #[error("{}", unsupported_message(.filename.as_deref(), .supported))]
    UnsupportedFormat {
        filename: Option<String>,
        supported: Vec<String>,
    },

    /// The bytes could not be decoded as the detected format.
    #[error("Failed to read {format} data: {reason}")]
    Read { format: String, reason: String },

    /// The decoded table has no rows.
    #[error("Uploaded file is empty")]
    EmptyDataset,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data cleaning failed.
    #[error("Failed to clean data: {0}")]
    CleaningFailed(String),

    /// Dataset analysis failed.
    #[error("Failed to analyze dataset: {0}")]
    AnalysisFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

fn unsupported_message(filename: Option<&str>, supported: &[String]) -> String {
    match filename {
        Some(name) => format!(
            "Unsupported file format for '{}'. Supported formats: {}",
            name,
            supported.join(", ")
        ),
        None => format!("Unsupported file format. Supported formats: {}", supported.join(", ")),
    }
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build a read error for the given format.
    pub fn read(format: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PipelineError::Read {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// Get a stable error code for callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Self::Read { .. } => "READ_ERROR",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::AnalysisFailed(_) => "ANALYSIS_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the uploaded input rather than
    /// by the pipeline itself.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::UnsupportedFormat { .. } | Self::Read { .. } | Self::EmptyDataset => true,
            Self::WithContext { source, .. } => source.is_client_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(PipelineError::EmptyDataset.error_code(), "EMPTY_DATASET");
        assert_eq!(
            PipelineError::read("csv", "bad quoting").error_code(),
            "READ_ERROR"
        );
    }

    #[test]
    fn test_unsupported_format_lists_extensions() {
        let error = PipelineError::UnsupportedFormat {
            filename: Some("notes.docx".to_string()),
            supported: vec!["csv".to_string(), "json".to_string()],
        };
        let message = error.to_string();
        assert!(message.contains("notes.docx"));
        assert!(message.contains("csv, json"));
    }

    #[test]
    fn test_is_client_error() {
        assert!(PipelineError::EmptyDataset.is_client_error());
        assert!(PipelineError::read("json", "eof").is_client_error());
        assert!(!PipelineError::CleaningFailed("boom".to_string()).is_client_error());
        assert!(
            PipelineError::EmptyDataset
                .with_context("While reading upload")
                .is_client_error()
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = PipelineError::read("parquet", "invalid magic bytes");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("READ_ERROR"));
        assert!(json.contains("invalid magic bytes"));
    }

    #[test]
    fn test_with_context() {
        let error = PipelineError::EmptyDataset.with_context("Processing sales.csv");
        assert!(error.to_string().contains("Processing sales.csv"));
        assert_eq!(error.error_code(), "EMPTY_DATASET");
    }
}
