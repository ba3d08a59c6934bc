//! Report generation module.
//!
//! This module provides the comparison tables computed for every upload and
//! the JSON report written for the CLI.
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_processing::reporting::{ReportGenerator, TableGenerator};
//!
//! let tables = TableGenerator::build_tables(&cleaned);
//! println!("{:?}", tables.table_names());
//!
//! let report = ReportGenerator::build_report("data/sales.csv", result);
//! let generator = ReportGenerator::new("outputs");
//! generator.write_report_to_file(&report, "sales")?;
//! ```

mod generator;
mod tables;

pub use generator::{AnalysisReport, ReportGenerator};
pub use tables::{
    CategoricalComparison, CorrelationMatrix, DataTypesTable, DescriptiveStats,
    DuplicateAnalysis, MissingValues, NumericComparison, SummaryTable, TableFailure,
    TableGenerator, TableSet,
};
