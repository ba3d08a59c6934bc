//! Delimited text parsing (csv, tsv, txt).

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::io::Cursor;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// Options shared by every delimited parse.
#[derive(Debug, Clone)]
pub(crate) struct TextOptions {
    pub na_values: Vec<String>,
    pub infer_schema_length: Option<usize>,
}

/// Parse decoded text with a header row and the given single-byte separator.
pub(crate) fn parse_delimited(
    text: String,
    separator: u8,
    options: &TextOptions,
) -> PolarsResult<DataFrame> {
    let null_values = NullValues::AllColumns(
        options
            .na_values
            .iter()
            .map(|value| value.as_str().into())
            .collect(),
    );

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(options.infer_schema_length)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_null_values(Some(null_values))
                .with_missing_is_null(true),
        )
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
}

/// True when the first line of a `.txt` payload contains a tab.
pub(crate) fn first_line_has_tab(bytes: &[u8]) -> bool {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    first_line.contains(&b'\t')
}

/// Rewrite whitespace-delimited text as tab-delimited text.
///
/// Leading and trailing whitespace is ignored and blank lines are dropped.
pub(crate) fn whitespace_to_tabs(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| WHITESPACE_RUN.replace_all(line, "\t").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}
