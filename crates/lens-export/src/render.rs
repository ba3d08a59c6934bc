//! Report renderers.

use crate::capability::Capabilities;
use crate::error::{ExportError, Result};
use crate::format::ExportFormat;
use crate::values::dataframe_to_records;
use chrono::{DateTime, Local, TimeZone};
use polars::prelude::*;
use serde_json::Value;
use tracing::info;

/// A rendered report, ready to be saved or sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    /// Suggested download name, e.g. `sales_report_20240131_094512.xlsx`.
    pub filename: String,
    pub mime_type: &'static str,
}

/// Render `df` as a report in `format`.
///
/// `stats` is an optional JSON object of dataset statistics; only the
/// spreadsheet format uses it (as a `Metric`/`Value` sheet).
///
/// # Errors
///
/// * [`ExportError::CapabilityUnavailable`] when no backend for `format` is
///   compiled in
/// * [`ExportError::RenderFailed`] when the backend cannot produce the file
pub fn render(
    format: ExportFormat,
    df: &DataFrame,
    filename: &str,
    stats: Option<&Value>,
) -> Result<RenderedReport> {
    if !Capabilities::detect().supports(format) {
        return Err(ExportError::CapabilityUnavailable {
            format: format.to_string(),
            hint: Capabilities::hint(format).to_string(),
        });
    }

    let bytes = match format {
        ExportFormat::Csv => render_csv(df)?,
        ExportFormat::Json => render_json(df)?,
        ExportFormat::Xlsx => render_xlsx(df, stats)?,
        ExportFormat::Pdf | ExportFormat::Pptx | ExportFormat::Docx => {
            return Err(ExportError::CapabilityUnavailable {
                format: format.to_string(),
                hint: Capabilities::hint(format).to_string(),
            });
        }
    };

    let report = RenderedReport {
        bytes,
        filename: report_filename(filename, format, &Local::now()),
        mime_type: format.mime_type(),
    };
    info!(
        "Rendered {} report {} ({} bytes)",
        format,
        report.filename,
        report.bytes.len()
    );
    Ok(report)
}

/// `<filename without .csv>_report_<YYYYmmdd_HHMMSS>.<ext>`
pub fn report_filename<Tz: TimeZone>(
    filename: &str,
    format: ExportFormat,
    at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}_report_{}.{}",
        filename.replace(".csv", ""),
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn render_csv(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut df = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| ExportError::render_failed("csv", e))?;
    Ok(buffer)
}

fn render_json(df: &DataFrame) -> Result<Vec<u8>> {
    let records = dataframe_to_records(df)?;
    Ok(serde_json::to_vec_pretty(&records)?)
}

#[cfg(feature = "xlsx")]
fn render_xlsx(df: &DataFrame, stats: Option<&Value>) -> Result<Vec<u8>> {
    xlsx::render(df, stats)
}

#[cfg(not(feature = "xlsx"))]
fn render_xlsx(_df: &DataFrame, _stats: Option<&Value>) -> Result<Vec<u8>> {
    Err(ExportError::CapabilityUnavailable {
        format: ExportFormat::Xlsx.to_string(),
        hint: Capabilities::hint(ExportFormat::Xlsx).to_string(),
    })
}

#[cfg(feature = "xlsx")]
mod xlsx {
    use super::*;
    use crate::values::{any_value_to_json, display_value};
    use rust_xlsxwriter::{Workbook, Worksheet};
    use tracing::debug;

    // Excel sheet limits
    const MAX_ROWS: usize = 1_048_576;
    const MAX_COLUMNS: usize = 16_384;

    pub(super) fn render(df: &DataFrame, stats: Option<&Value>) -> Result<Vec<u8>> {
        if df.height() + 1 > MAX_ROWS || df.width() > MAX_COLUMNS {
            return Err(ExportError::render_failed(
                "xlsx",
                format!(
                    "{} rows x {} columns exceeds the sheet limit of {} x {}",
                    df.height(),
                    df.width(),
                    MAX_ROWS - 1,
                    MAX_COLUMNS
                ),
            ));
        }

        let mut workbook = Workbook::new();

        let data = workbook.add_worksheet();
        data.set_name("Data")?;
        write_data(data, df)?;

        if let Some(Value::Object(stats)) = stats {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Statistics")?;
            sheet.write_string(0, 0, "Metric")?;
            sheet.write_string(0, 1, "Value")?;
            for (row, (key, value)) in (1u32..).zip(stats.iter()) {
                sheet.write_string(row, 0, key.as_str())?;
                sheet.write_string(row, 1, display_value(value))?;
            }
            debug!("Wrote {} statistics", stats.len());
        }

        Ok(workbook.save_to_buffer()?)
    }

    fn write_data(sheet: &mut Worksheet, df: &DataFrame) -> Result<()> {
        for (col, column) in (0u16..).zip(df.get_columns()) {
            sheet.write_string(0, col, column.name().as_str())?;
            for (row, idx) in (1u32..).zip(0..df.height()) {
                match any_value_to_json(column.get(idx)?) {
                    Value::Null => {}
                    Value::Bool(b) => {
                        sheet.write_boolean(row, col, b)?;
                    }
                    Value::Number(n) => {
                        if let Some(n) = n.as_f64() {
                            sheet.write_number(row, col, n)?;
                        }
                    }
                    Value::String(s) => {
                        sheet.write_string(row, col, s)?;
                    }
                    other => {
                        sheet.write_string(row, col, other.to_string())?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df! {
            "age" => [25.0, 32.5, 40.0],
            "city" => ["NY", "LA", "NY"],
        }
        .unwrap()
    }

    #[test]
    fn test_report_filename() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 9, 45, 12).unwrap();
        assert_eq!(
            report_filename("sales.csv", ExportFormat::Xlsx, &at),
            "sales_report_20240131_094512.xlsx"
        );
        assert_eq!(
            report_filename("people.json", ExportFormat::Pdf, &at),
            "people.json_report_20240131_094512.pdf"
        );
    }

    #[test]
    fn test_render_csv() {
        let report = render(ExportFormat::Csv, &sample(), "people.csv", None).unwrap();
        let text = String::from_utf8(report.bytes).unwrap();
        assert_eq!(text.lines().next(), Some("age,city"));
        assert_eq!(text.lines().count(), 4);
        assert_eq!(report.mime_type, "text/csv");
        assert!(report.filename.starts_with("people_report_"));
        assert!(report.filename.ends_with(".csv"));
    }

    #[test]
    fn test_render_json_records() {
        let report = render(ExportFormat::Json, &sample(), "people.csv", None).unwrap();
        let parsed: Value = serde_json::from_slice(&report.bytes).unwrap();
        assert_eq!(parsed[1]["age"], 32.5);
        assert_eq!(parsed[2]["city"], "NY");
        assert_eq!(parsed.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_unavailable_formats() {
        for format in [ExportFormat::Pdf, ExportFormat::Pptx, ExportFormat::Docx] {
            let err = render(format, &sample(), "people.csv", None).unwrap_err();
            assert!(matches!(err, ExportError::CapabilityUnavailable { .. }));
        }
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_render_xlsx_is_zip() {
        let stats = serde_json::json!({"rows": 3, "file_format": "csv"});
        let report = render(ExportFormat::Xlsx, &sample(), "people.csv", Some(&stats)).unwrap();
        assert!(report.bytes.starts_with(b"PK"));
        assert!(report.filename.ends_with(".xlsx"));
    }
}
