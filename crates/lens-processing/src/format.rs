//! File format detection from filename extensions.
//!
//! Detection looks at the extension only; the content is never sniffed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Extensions accepted for upload, sorted.
pub const SUPPORTED_EXTENSIONS: [&str; 11] = [
    "csv", "feather", "h5", "hdf5", "json", "parquet", "pq", "tsv", "txt", "xls", "xlsx",
];

/// Canonical input format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
    Xlsx,
    Xls,
    Tsv,
    Txt,
    Parquet,
    Hdf5,
    Feather,
    Unknown,
}

impl FileFormat {
    /// All formats that can be ingested.
    pub const SUPPORTED: [FileFormat; 9] = [
        FileFormat::Csv,
        FileFormat::Json,
        FileFormat::Xlsx,
        FileFormat::Xls,
        FileFormat::Tsv,
        FileFormat::Txt,
        FileFormat::Parquet,
        FileFormat::Hdf5,
        FileFormat::Feather,
    ];

    /// Map a bare extension (without the dot) to a format, case-insensitively.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Self::Csv,
            "json" => Self::Json,
            "xlsx" => Self::Xlsx,
            "xls" => Self::Xls,
            "tsv" => Self::Tsv,
            "txt" => Self::Txt,
            "parquet" | "pq" => Self::Parquet,
            "hdf5" | "h5" => Self::Hdf5,
            "feather" => Self::Feather,
            _ => Self::Unknown,
        }
    }

    /// Canonical lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Tsv => "tsv",
            Self::Txt => "txt",
            Self::Parquet => "parquet",
            Self::Hdf5 => "hdf5",
            Self::Feather => "feather",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable description of the format.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Csv => "Comma-separated values",
            Self::Json => "JavaScript Object Notation",
            Self::Xlsx => "Excel 2007+ workbook",
            Self::Xls => "Excel 97-2003 workbook",
            Self::Tsv => "Tab-separated values",
            Self::Txt => "Tab or whitespace delimited text",
            Self::Parquet => "Apache Parquet columnar storage",
            Self::Hdf5 => "Hierarchical Data Format 5",
            Self::Feather => "Apache Arrow Feather (IPC)",
            Self::Unknown => "Unrecognized format",
        }
    }

    /// Text formats go through the encoding fallback chain.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Csv | Self::Tsv | Self::Txt)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the format of a file from its name.
///
/// Names without an extension, and dot-files such as `.csv`, are
/// [`FileFormat::Unknown`].
pub fn detect_file_format(filename: &str) -> FileFormat {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(FileFormat::from_extension)
        .unwrap_or(FileFormat::Unknown)
}

/// Sorted list of supported extensions, for error messages.
pub fn supported_extensions() -> Vec<String> {
    SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}
