//! Error types for report rendering.

use thiserror::Error;

/// The main error type for lens-export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The format exists but no backend for it was compiled in.
    #[error("{format} export is not available: {hint}")]
    CapabilityUnavailable { format: String, hint: String },

    /// A backend was available but could not produce the document.
    #[error("Failed to render {format} report: {reason}")]
    RenderFailed { format: String, reason: String },

    /// The requested format name is not recognized.
    #[error("Unknown export format '{0}'. Supported formats: csv, json, xlsx, pdf, pptx, docx")]
    UnknownFormat(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("Excel writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl ExportError {
    pub fn render_failed(format: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::RenderFailed {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable error code for callers that map errors to responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CapabilityUnavailable { .. } => "CAPABILITY_UNAVAILABLE",
            Self::RenderFailed { .. } => "RENDER_FAILED",
            Self::UnknownFormat(_) => "UNKNOWN_FORMAT",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "xlsx")]
            Self::Xlsx(_) => "XLSX_ERROR",
        }
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_message_includes_hint() {
        let err = ExportError::CapabilityUnavailable {
            format: "pdf".to_string(),
            hint: "no PDF backend is compiled into this build".to_string(),
        };
        assert_eq!(err.error_code(), "CAPABILITY_UNAVAILABLE");
        assert!(err.to_string().contains("no PDF backend"));
    }

    #[test]
    fn test_render_failed_is_distinct() {
        let err = ExportError::render_failed("csv", "broken pipe");
        assert_eq!(err.error_code(), "RENDER_FAILED");
        assert_eq!(err.to_string(), "Failed to render csv report: broken pipe");
    }
}
