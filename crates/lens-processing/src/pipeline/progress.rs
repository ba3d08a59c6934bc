//! Progress reporting for the ingestion pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_processing::Pipeline;
//!
//! let pipeline = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Mapping the filename to a format
    Detecting,
    /// Decoding the bytes into a table
    Reading,
    /// Removing duplicates and imputing missing values
    Cleaning,
    /// Computing dataset metadata
    Analyzing,
    /// Building the comparison tables
    GeneratingTables,
    /// Drawing and encoding charts
    RenderingCharts,
    /// Persisting the upload record
    Recording,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Detecting => "Detecting Format",
            Self::Reading => "Reading Data",
            Self::Cleaning => "Cleaning Data",
            Self::Analyzing => "Analyzing Dataset",
            Self::GeneratingTables => "Generating Tables",
            Self::RenderingCharts => "Rendering Charts",
            Self::Recording => "Recording Upload",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Cumulative progress at the start of this stage (0.0 - 1.0).
    ///
    /// Chart rendering dominates the run time, so it gets the widest slice.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Detecting => 0.0,
            Self::Reading => 0.02,
            Self::Cleaning => 0.20,
            Self::Analyzing => 0.35,
            Self::GeneratingTables => 0.40,
            Self::RenderingCharts => 0.50,
            Self::Recording => 0.98,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted at every stage boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates an update marking the start of `stage`.
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.base_progress().clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, message)
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Failed, message)
    }
}

/// Trait for receiving progress updates during processing.
///
/// Implementations must be `Send + Sync` so that a pipeline shared between
/// threads can report from any of them.
pub trait ProgressReporter: Send + Sync {
    /// Called once per stage boundary. Implementations should not block.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
