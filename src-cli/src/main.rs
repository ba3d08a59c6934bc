//! CLI entry point for the lens ingestion and analysis pipeline.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use lens_export::{Capabilities, ExportError, ExportFormat, render};
use lens_processing::{
    AnalysisReport, ChartConfig, JsonLinesUploadLog, Pipeline, PipelineConfig, ReportGenerator,
};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// CLI-compatible report format enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliExportFormat {
    /// Comma-separated values
    Csv,
    /// Pretty-printed array of records
    Json,
    /// Excel workbook with Data and Statistics sheets
    Xlsx,
    /// PDF document
    Pdf,
    /// PowerPoint deck
    Pptx,
    /// Word document
    Docx,
}

impl From<CliExportFormat> for ExportFormat {
    fn from(cli: CliExportFormat) -> Self {
        match cli {
            CliExportFormat::Csv => ExportFormat::Csv,
            CliExportFormat::Json => ExportFormat::Json,
            CliExportFormat::Xlsx => ExportFormat::Xlsx,
            CliExportFormat::Pdf => ExportFormat::Pdf,
            CliExportFormat::Pptx => ExportFormat::Pptx,
            CliExportFormat::Docx => ExportFormat::Docx,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "lens",
    version,
    about = "Tabular data cleaning and exploratory analysis",
    long_about = "Reads a data file, cleans it, and prints an exploratory analysis.\n\n\
                  SUPPORTED INPUT:\n  \
                  csv, tsv, txt, json, xlsx, xls, parquet (.pq), feather, hdf5 (.h5)\n\n\
                  EXAMPLES:\n  \
                  # Human-readable summary\n  \
                  lens -i sales.csv\n\n  \
                  # Machine-readable result\n  \
                  lens -i sales.csv --json --no-charts | jq .cleaning_report\n\n  \
                  # Save the JSON report and an Excel export\n  \
                  lens -i sales.xlsx -r --export xlsx -o reports/"
)]
struct Args {
    /// Path to the data file to process
    #[arg(short, long)]
    input: String,

    /// Output directory for reports and exports
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Render the cleaned dataset as one or more report files
    #[arg(long, value_enum, value_delimiter = ',', num_args = 1..)]
    export: Vec<CliExportFormat>,

    /// Append a record of this upload to a JSON-lines log
    #[arg(long)]
    upload_log: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,

    /// Skip comparison tables
    #[arg(long)]
    no_tables: bool,

    /// Prefix chart images with `data:image/png;base64,`
    #[arg(long)]
    data_uri: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = PipelineConfig::builder()
        .output_dir(&args.output)
        .generate_tables(!args.no_tables)
        .generate_charts(!args.no_charts)
        .charts(ChartConfig {
            data_uri_prefix: args.data_uri,
            ..ChartConfig::default()
        })
        .build()?;

    let pipeline = build_pipeline(&args, config)?;
    run_pipeline(&pipeline, &args)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if let Some(ref path) = args.upload_log {
        info!("Recording uploads in {}", path.display());
        builder = builder.upload_sink(Arc::new(JsonLinesUploadLog::new(path)));
    }

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Run pipeline and handle its output.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file
/// - `--export`: Render the cleaned dataset into report files
fn run_pipeline(pipeline: &Pipeline, args: &Args) -> Result<()> {
    let (result, cleaned) = pipeline.process_path(&args.input).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed [{}]: {}", e.error_code(), e)
    })?;

    let report = ReportGenerator::build_report(&args.input, result);
    let output_dir = PathBuf::from(&args.output);

    let mut written = Vec::new();
    if !args.export.is_empty() {
        written.extend(export_reports(&report, &cleaned, args, &output_dir)?);
    }

    if args.emit_report {
        let generator = ReportGenerator::new(&output_dir);
        let report_path = generator.write_report_to_file(&report, &extract_file_stem(&args.input))?;
        info!("Report written to: {}", report_path.display());
        written.push(report_path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, &written);
    Ok(())
}

/// Render every requested export. Unavailable formats are skipped with a
/// warning; a failed render aborts.
fn export_reports(
    report: &AnalysisReport,
    cleaned: &DataFrame,
    args: &Args,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let stats = serde_json::to_value(&report.result.analysis)?;
    let filename = Path::new(&args.input)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("dataset");

    let mut written = Vec::new();
    for format in args.export.iter().copied().map(ExportFormat::from) {
        match render(format, cleaned, filename, Some(&stats)) {
            Ok(rendered) => {
                let path = output_dir.join(&rendered.filename);
                std::fs::write(&path, &rendered.bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Exported {} ({})", path.display(), rendered.mime_type);
                written.push(path);
            }
            Err(ExportError::CapabilityUnavailable { format, hint }) => {
                let available: Vec<_> = Capabilities::detect()
                    .available()
                    .iter()
                    .map(ExportFormat::as_str)
                    .collect();
                warn!(
                    "Skipping {} export: {} (available: {})",
                    format,
                    hint,
                    available.join(", ")
                );
            }
            Err(e) => return Err(anyhow!("Export to {} failed: {}", format, e)),
        }
    }

    Ok(written)
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print a human-readable summary of the analysis.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &AnalysisReport, written: &[PathBuf]) {
    let result = &report.result;
    let analysis = &result.analysis;
    let cleaning = &result.cleaning_report;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({}, {} rows x {} columns)",
        report.input_file, result.file_format, cleaning.original.rows, cleaning.original.columns
    );
    if let Some(ref encoding) = result.encoding {
        println!("Encoding: {}", encoding);
    }
    println!();

    println!("Cleaning Summary:");
    println!(
        "  Rows: {} -> {} ({} removed)",
        cleaning.original.rows, cleaning.cleaned.rows, cleaning.cleaned.rows_removed
    );
    println!(
        "  Duplicates removed: {}",
        cleaning.cleaned.duplicate_rows_removed
    );
    println!(
        "  Missing values: {} found, {} imputed",
        cleaning.cleaned.missing_values_filled, cleaning.cleaned.values_imputed
    );
    if cleaning.cleaned.rows_dropped_unresolved > 0 {
        println!(
            "  Rows dropped (could not impute): {}",
            cleaning.cleaned.rows_dropped_unresolved
        );
    }
    println!();

    println!("Columns:");
    for name in &analysis.columns_names {
        let dtype = analysis
            .data_types
            .get(name)
            .map(String::as_str)
            .unwrap_or("unknown");
        println!("  {:<30} {}", truncate_str(name, 29), dtype);
    }
    println!(
        "  {} numeric, {} categorical, {:.2} MB",
        analysis.numeric_columns.len(),
        analysis.categorical_columns.len(),
        analysis.memory_usage_mb
    );
    println!();

    let tables = result.tables.table_names();
    if !tables.is_empty() {
        println!("Tables: {}", tables.join(", "));
    }
    for failure in &result.tables.failures {
        println!("  ! {} table failed: {}", failure.table, failure.reason);
    }

    if !result.graphs.is_empty() {
        let rendered: Vec<_> = result
            .graphs
            .kinds()
            .filter(|kind| result.graphs.get(*kind).is_some_and(|c| c.is_rendered()))
            .map(|kind| kind.as_str())
            .collect();
        println!(
            "Charts: {} of {} rendered ({})",
            rendered.len(),
            result.graphs.len(),
            rendered.join(", ")
        );
        for failure in result.graphs.failures() {
            println!("  ! {} chart failed: {}", failure.chart, failure.reason);
        }
    }
    println!();

    if !written.is_empty() {
        println!("Files written:");
        for path in written {
            println!("  - {}", path.display());
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_exports() {
        let args = Args::parse_from(["lens", "-i", "data.csv", "--export", "csv,xlsx", "-r"]);
        assert_eq!(
            args.export,
            vec![CliExportFormat::Csv, CliExportFormat::Xlsx]
        );
        assert!(args.emit_report);
        assert_eq!(args.output, "./outputs");
    }

    #[test]
    fn test_extract_file_stem() {
        assert_eq!(extract_file_stem("data/sales.csv"), "sales");
        assert_eq!(extract_file_stem("archive.tar.gz"), "archive.tar");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a_very_long_column_name", 10), "a_very_...");
    }
}
