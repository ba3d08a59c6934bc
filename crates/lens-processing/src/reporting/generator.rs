use crate::types::ProcessingResult;
use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// A processing result together with where it came from.
///
/// This is the document printed by `--json` and written by
/// `--emit-report`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path or name of the uploaded file
    pub input_file: String,
    #[serde(flatten)]
    pub result: ProcessingResult,
}

/// Writes analysis reports to an output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Stamp a processing result with its input file and the current time.
    pub fn build_report(input_file: &str, result: ProcessingResult) -> AnalysisReport {
        AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            result,
        }
    }

    /// Write a report as pretty JSON.
    ///
    /// The report is written to the output directory with the specified base name.
    /// For example, if `report_base_name` is "sales", the file will be "sales_report.json".
    pub fn write_report_to_file(
        &self,
        report: &AnalysisReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
