//! Tabular Data Ingestion and Exploration Library
//!
//! Turns an uploaded file into a cleaned dataset plus an exploratory
//! analysis, built on Polars and Plotters.
//!
//! # Overview
//!
//! A single call to [`Pipeline::process`] runs:
//!
//! - **Format Detection**: filename extension to [`FileFormat`]
//! - **Resilient Reading**: csv, tsv, txt, json, xlsx, xls, parquet, feather
//!   and (with the `hdf5` feature) hdf5, with an encoding fallback chain for
//!   text formats
//! - **Cleaning**: duplicate removal, median/mode imputation, and a
//!   before/after [`CleaningReport`]
//! - **Analysis**: shape, types, numeric/categorical split, memory usage
//! - **Tables**: descriptive statistics, comparisons, correlations
//! - **Charts**: base64 PNG charts picked from the data
//! - **Upload Log**: an [`UploadRecord`] per successful upload
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lens_processing::{JsonLinesUploadLog, Pipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! let bytes = std::fs::read("sales.csv")?;
//!
//! let (result, cleaned) = Pipeline::builder()
//!     .config(PipelineConfig::builder().output_dir("outputs").build()?)
//!     .upload_sink(Arc::new(JsonLinesUploadLog::new("outputs/uploads.jsonl")))
//!     .build()?
//!     .process(&bytes, "sales.csv")?;
//!
//! println!("{} rows after cleaning", result.analysis.rows);
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```
//!
//! # Errors
//!
//! Every failure is a [`PipelineError`] with a stable
//! [`error_code`](PipelineError::error_code). Unsupported formats, unreadable
//! bytes and empty tables are client errors; individual tables and charts
//! that cannot be produced are reported inside the result instead.

pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod format;
pub mod persistence;
pub mod pipeline;
pub mod profiler;
pub mod reader;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::{ChartFailure, ChartKind, ChartOutcome, ChartRenderer, ChartSet};
pub use cleaner::{DataCleaner, Imputation, StatisticalImputer};
pub use config::{ChartConfig, ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{PipelineError, Result, ResultExt};
pub use format::{FileFormat, SUPPORTED_EXTENSIONS, detect_file_format, supported_extensions};
pub use persistence::{JsonLinesUploadLog, MemoryUploadLog, SinkError, UploadSink};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use profiler::DataProfiler;
pub use reader::{DataReader, ReadOutcome};
pub use reporting::{AnalysisReport, ReportGenerator, TableGenerator, TableSet};
pub use types::{
    AnalysisResult, CleanedStats, CleaningReport, OriginalStats, ProcessingResult, UploadRecord,
};
