//! Main ingestion pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating a single upload: detect, read, clean, analyze, tabulate,
//! chart and record.

use crate::charts::{ChartRenderer, ChartSet};
use crate::cleaner::DataCleaner;
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::format::{FileFormat, detect_file_format, supported_extensions};
use crate::persistence::UploadSink;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::profiler::DataProfiler;
use crate::reader::DataReader;
use crate::reporting::{TableGenerator, TableSet};
use crate::types::{ProcessingResult, UploadRecord};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The main ingestion pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lens_processing::{MemoryUploadLog, Pipeline, PipelineConfig};
/// use std::sync::Arc;
///
/// let uploads = Arc::new(MemoryUploadLog::new());
/// let (result, cleaned) = Pipeline::builder()
///     .config(PipelineConfig::builder().generate_charts(false).build()?)
///     .upload_sink(uploads.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(&bytes, "sales.csv")?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    reader: DataReader,
    cleaner: DataCleaner,
    renderer: ChartRenderer,
    upload_sink: Option<Arc<dyn UploadSink>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Shared between request handlers; every run owns its own frame and canvas.
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process an uploaded file.
    ///
    /// Returns the serializable result together with the cleaned frame, so
    /// callers can export it without cleaning again.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::UnsupportedFormat`] when the extension is unknown
    /// - [`PipelineError::Read`] when the bytes cannot be parsed
    /// - [`PipelineError::EmptyDataset`] when the table has no rows
    ///
    /// Table, chart and upload-log failures never fail the run.
    pub fn process(&self, bytes: &[u8], filename: &str) -> Result<(ProcessingResult, DataFrame)> {
        match self.process_internal(bytes, filename) {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error for '{}': {}", filename, e);
                Err(e)
            }
        }
    }

    /// Read a file from disk and process it under its file name.
    pub fn process_path(&self, path: impl AsRef<Path>) -> Result<(ProcessingResult, DataFrame)> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let bytes = std::fs::read(path).map_err(|e| {
            PipelineError::from(e).with_context(format!("Failed to open {}", path.display()))
        })?;
        self.process(&bytes, &filename)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<(ProcessingResult, DataFrame)> {
        let start_time = Instant::now();
        info!("Processing '{}' ({} bytes)", filename, bytes.len());

        // Step 1: Detect the format
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Detecting,
            format!("Detecting format of {}", filename),
        ));
        let format = detect_file_format(filename);
        if format == FileFormat::Unknown {
            return Err(PipelineError::UnsupportedFormat {
                filename: Some(filename.to_string()),
                supported: supported_extensions(),
            });
        }
        debug!("Detected format: {}", format.description());

        // Step 2: Read
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Reading,
            format!("Reading {} data", format),
        ));
        // Zero-row tables are rejected by the reader.
        let outcome = self.reader.read(bytes, format)?;
        if outcome.lossy {
            warn!(
                "'{}' was decoded with replacement characters; some text may be garbled",
                filename
            );
        }

        // Step 3: Clean
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Cleaning,
            "Removing duplicates and imputing missing values",
        ));
        let (cleaned, cleaning_report) = self.cleaner.clean(outcome.data)?;

        // Step 4: Analyze
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Analyzing,
            "Analyzing cleaned dataset",
        ));
        let analysis = DataProfiler::analyze(&cleaned)?;

        // Step 5: Tables
        let tables = if self.config.generate_tables {
            self.report_progress(ProgressUpdate::new(
                PipelineStage::GeneratingTables,
                "Building comparison tables",
            ));
            TableGenerator::build_tables(&cleaned)
        } else {
            debug!("Table generation disabled");
            TableSet::default()
        };

        // Step 6: Charts
        let graphs = if self.config.generate_charts {
            self.report_progress(ProgressUpdate::new(
                PipelineStage::RenderingCharts,
                "Rendering charts",
            ));
            self.renderer.render_all(&cleaned)
        } else {
            debug!("Chart rendering disabled");
            ChartSet::default()
        };

        // Step 7: Record the upload
        self.record_upload(filename, &cleaned);

        info!(
            "Processed '{}' in {:.2?}: {} rows x {} columns, {} tables, {} charts",
            filename,
            start_time.elapsed(),
            analysis.rows,
            analysis.columns,
            tables.table_names().len(),
            graphs.rendered_count()
        );

        let result = ProcessingResult {
            analysis,
            cleaning_report,
            file_format: format,
            encoding: outcome.encoding,
            tables,
            graphs,
        };
        Ok((result, cleaned))
    }

    fn record_upload(&self, filename: &str, cleaned: &DataFrame) {
        let Some(sink) = &self.upload_sink else {
            return;
        };

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Recording,
            "Recording upload",
        ));
        let record = UploadRecord::now(filename, cleaned.height(), cleaned.width());
        if let Err(e) = sink.record(&record) {
            warn!("Failed to record upload of '{}': {}", filename, e);
        }
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    upload_sink: Option<Arc<dyn UploadSink>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Persist a record of every successful upload to `sink`.
    pub fn upload_sink(mut self, sink: Arc<dyn UploadSink>) -> Self {
        self.upload_sink = Some(sink);
        self
    }

    /// Set a custom progress reporter.
    ///
    /// Use this when you need a custom progress reporter implementation,
    /// for example one that forwards updates to a channel.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            reader: DataReader::from_config(&config),
            cleaner: DataCleaner::new(config.unknown_placeholder.clone()),
            renderer: ChartRenderer::new(config.charts.clone()),
            config,
            upload_sink: self.upload_sink,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryUploadLog, SinkError};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SAMPLE_CSV: &[u8] = b"age,city\n25,NY\n,LA\n25,NY\n40,NY\n";

    fn quiet_config() -> PipelineConfig {
        PipelineConfig::builder()
            .generate_charts(false)
            .build()
            .unwrap()
    }

    struct FailingSink;

    impl UploadSink for FailingSink {
        fn record(&self, _record: &UploadRecord) -> std::result::Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.upload_sink.is_none());
        assert!(pipeline.config.generate_charts);
        assert!(pipeline.config.generate_tables);
    }

    #[test]
    fn test_pipeline_builder_with_config() {
        let config = PipelineConfig::builder()
            .generate_tables(false)
            .unknown_placeholder("N/A")
            .build()
            .unwrap();

        let pipeline = Pipeline::builder().config(config).build().unwrap();

        assert!(!pipeline.config.generate_tables);
        assert_eq!(pipeline.config.unknown_placeholder, "N/A");
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            encodings: Vec::new(),
            ..PipelineConfig::default()
        };
        let result = Pipeline::builder().config(config).build();
        assert!(matches!(result, Err(ConfigValidationError::NoEncodings)));
    }

    #[test]
    fn test_pipeline_builder_with_progress_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let pipeline = Pipeline::builder()
            .config(quiet_config())
            .on_progress(move |_update| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        pipeline.process(SAMPLE_CSV, "people.csv").unwrap();
        assert!(count.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_progress_stage_sequence() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let pipeline = Pipeline::builder()
            .config(quiet_config())
            .upload_sink(Arc::new(MemoryUploadLog::new()))
            .on_progress(move |update| stages_clone.lock().push(update.stage))
            .build()
            .unwrap();

        pipeline.process(SAMPLE_CSV, "people.csv").unwrap();

        assert_eq!(
            *stages.lock(),
            vec![
                PipelineStage::Detecting,
                PipelineStage::Reading,
                PipelineStage::Cleaning,
                PipelineStage::Analyzing,
                PipelineStage::GeneratingTables,
                PipelineStage::Recording,
                PipelineStage::Complete,
            ]
        );
    }

    #[test]
    fn test_failure_reports_failed_stage() {
        let last = Arc::new(Mutex::new(None));
        let last_clone = last.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| *last_clone.lock() = Some(update.stage))
            .build()
            .unwrap();

        assert!(pipeline.process(b"a,b\n1,2\n", "data.xyz").is_err());
        assert_eq!(*last.lock(), Some(PipelineStage::Failed));
    }

    #[test]
    fn test_process_sample() {
        let pipeline = Pipeline::builder().config(quiet_config()).build().unwrap();
        let (result, cleaned) = pipeline.process(SAMPLE_CSV, "people.csv").unwrap();

        assert_eq!(result.file_format, FileFormat::Csv);
        assert_eq!(result.encoding.as_deref(), Some("utf-8"));
        assert_eq!(result.cleaning_report.original.rows, 4);
        assert_eq!(result.cleaning_report.cleaned.rows, 3);
        assert_eq!(cleaned.height(), 3);
        assert_eq!(result.analysis.missing_count, 0);
        assert!(result.graphs.is_empty());
        assert!(result.tables.summary.is_some());
    }

    #[test]
    fn test_unsupported_format_lists_extensions() {
        let pipeline = Pipeline::builder().build().unwrap();
        let err = pipeline.process(b"whatever", "notes.docx").unwrap_err();

        match err {
            PipelineError::UnsupportedFormat {
                filename,
                supported,
            } => {
                assert_eq!(filename.as_deref(), Some("notes.docx"));
                assert!(supported.contains(&"csv".to_string()));
                assert!(supported.contains(&"parquet".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        let pipeline = Pipeline::builder().build().unwrap();
        let err = pipeline.process(b"a,b\n", "empty.csv").unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATASET");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_disabled_tables_are_empty() {
        let config = PipelineConfig::builder()
            .generate_tables(false)
            .generate_charts(false)
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();
        let (result, _) = pipeline.process(SAMPLE_CSV, "people.csv").unwrap();

        assert!(result.tables.table_names().is_empty());
    }

    #[test]
    fn test_upload_sink_records_cleaned_shape() {
        let uploads = Arc::new(MemoryUploadLog::new());
        let pipeline = Pipeline::builder()
            .config(quiet_config())
            .upload_sink(uploads.clone())
            .build()
            .unwrap();

        pipeline.process(SAMPLE_CSV, "people.csv").unwrap();

        let records = uploads.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "people.csv");
        assert_eq!(records[0].row_count, 3);
        assert_eq!(records[0].column_count, 2);
    }

    #[test]
    fn test_failing_sink_does_not_fail_upload() {
        let pipeline = Pipeline::builder()
            .config(quiet_config())
            .upload_sink(Arc::new(FailingSink))
            .build()
            .unwrap();

        assert!(pipeline.process(SAMPLE_CSV, "people.csv").is_ok());
    }

    #[test]
    fn test_failed_upload_is_not_recorded() {
        let uploads = Arc::new(MemoryUploadLog::new());
        let pipeline = Pipeline::builder()
            .upload_sink(uploads.clone())
            .build()
            .unwrap();

        assert!(pipeline.process(b"", "empty.csv").is_err());
        assert!(uploads.records().is_empty());
    }

    #[test]
    fn test_process_path_missing_file() {
        let pipeline = Pipeline::builder().build().unwrap();
        let err = pipeline
            .process_path("/definitely/not/here/data.csv")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
