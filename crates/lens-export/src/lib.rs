//! Report rendering for cleaned datasets.
//!
//! Turns a cleaned [`polars::prelude::DataFrame`] (plus optional statistics)
//! into a downloadable file. Which formats are available depends on the
//! backends compiled in; see [`Capabilities`].
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_export::{ExportFormat, render};
//!
//! let stats = serde_json::json!({"rows": cleaned.height()});
//! let report = render(ExportFormat::Xlsx, &cleaned, "sales.csv", Some(&stats))?;
//! std::fs::write(&report.filename, &report.bytes)?;
//! ```

mod capability;
mod error;
mod format;
mod render;
mod values;

pub use capability::Capabilities;
pub use error::{ExportError, Result};
pub use format::ExportFormat;
pub use render::{RenderedReport, render, report_filename};
