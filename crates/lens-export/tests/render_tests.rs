//! Integration tests for report rendering.

use lens_export::{Capabilities, ExportError, ExportFormat, render};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Cursor;

fn cleaned() -> DataFrame {
    df! {
        "name" => ["Ada", "Grace", "Linus"],
        "salary" => [120000.0, 135000.0, 98000.0],
        "remote" => [true, false, true],
    }
    .unwrap()
}

// ============================================================================
// Text formats
// ============================================================================

#[test]
fn test_csv_reparses_to_same_frame() {
    let report = render(ExportFormat::Csv, &cleaned(), "staff.csv", None).unwrap();

    let reparsed = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(report.bytes))
        .finish()
        .unwrap();

    assert_eq!(reparsed.shape(), (3, 3));
    assert!(reparsed.equals(&cleaned()));
}

#[test]
fn test_json_is_pretty_array_of_records() {
    let report = render(ExportFormat::Json, &cleaned(), "staff.csv", None).unwrap();
    let text = String::from_utf8(report.bytes).unwrap();
    assert!(text.starts_with("[\n"));

    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        parsed[0],
        json!({"name": "Ada", "salary": 120000.0, "remote": true})
    );
}

#[test]
fn test_stats_are_ignored_by_text_formats() {
    let stats = json!({"rows": 3});
    let with = render(ExportFormat::Csv, &cleaned(), "staff.csv", Some(&stats)).unwrap();
    let without = render(ExportFormat::Csv, &cleaned(), "staff.csv", None).unwrap();
    assert_eq!(with.bytes, without.bytes);
}

// ============================================================================
// Capabilities
// ============================================================================

#[test]
fn test_unavailable_format_names_a_hint() {
    let err = render(ExportFormat::Docx, &cleaned(), "staff.csv", None).unwrap_err();
    match err {
        ExportError::CapabilityUnavailable { format, hint } => {
            assert_eq!(format, "docx");
            assert!(!hint.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_every_available_format_renders() {
    for format in Capabilities::detect().available() {
        let report = render(format, &cleaned(), "staff.csv", None).unwrap();
        assert!(!report.bytes.is_empty(), "{format} produced no bytes");
        assert_eq!(report.mime_type, format.mime_type());
        assert!(report.filename.starts_with("staff_report_"));
    }
}

// ============================================================================
// Spreadsheet
// ============================================================================

#[cfg(feature = "xlsx")]
#[test]
fn test_xlsx_has_data_and_statistics_sheets() {
    use calamine::{Data, Reader, Xlsx};

    let stats = json!({"rows": 3, "columns": 3, "file_format": "csv"});
    let report = render(ExportFormat::Xlsx, &cleaned(), "staff.csv", Some(&stats)).unwrap();

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(report.bytes)).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["Data".to_string(), "Statistics".to_string()]
    );

    let data = workbook.worksheet_range("Data").unwrap();
    assert_eq!(data.get_size(), (4, 3));
    assert_eq!(data.get((0, 0)), Some(&Data::String("name".to_string())));
    assert_eq!(data.get((2, 1)), Some(&Data::Float(135000.0)));
    assert_eq!(data.get((3, 2)), Some(&Data::Bool(true)));

    let statistics = workbook.worksheet_range("Statistics").unwrap();
    assert_eq!(statistics.get_size(), (4, 2));
    assert_eq!(
        statistics.get((3, 0)),
        Some(&Data::String("file_format".to_string()))
    );
    assert_eq!(statistics.get((1, 1)), Some(&Data::String("3".to_string())));
}

#[cfg(feature = "xlsx")]
#[test]
fn test_xlsx_without_stats_has_one_sheet() {
    use calamine::{Reader, Xlsx};

    let report = render(ExportFormat::Xlsx, &cleaned(), "staff.csv", None).unwrap();
    let workbook: Xlsx<_> = Xlsx::new(Cursor::new(report.bytes)).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Data".to_string()]);
}
