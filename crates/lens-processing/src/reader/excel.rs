//! Excel workbook parsing (xlsx, xls) via calamine.
//!
//! Only the first worksheet is read. Its first row is the header; every
//! other row is data.

use calamine::{Data, DataType as _, Range, Reader, Xls, Xlsx, open_workbook_from_rs};
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt::Display;
use std::io::Cursor;
use tracing::debug;

static EMPTY_CELL: Data = Data::Empty;

/// Which flavour of workbook the bytes hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkbookKind {
    Xlsx,
    Xls,
}

/// Read the first worksheet of a workbook into a DataFrame.
pub(crate) fn read_workbook(bytes: &[u8], kind: WorkbookKind) -> Result<DataFrame, String> {
    let cursor = Cursor::new(bytes.to_vec());
    let range = match kind {
        WorkbookKind::Xlsx => {
            let mut workbook: Xlsx<_> =
                open_workbook_from_rs(cursor).map_err(|e| format!("Failed to open workbook: {}", e))?;
            first_sheet(&mut workbook)?
        }
        WorkbookKind::Xls => {
            let mut workbook: Xls<_> =
                open_workbook_from_rs(cursor).map_err(|e| format!("Failed to open workbook: {}", e))?;
            first_sheet(&mut workbook)?
        }
    };

    range_to_frame(&range).map_err(|e| e.to_string())
}

fn first_sheet<R>(workbook: &mut R) -> Result<Range<Data>, String>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: Display,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "Workbook has no worksheets".to_string())?;
    debug!("Reading worksheet '{}'", sheet_name);
    workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read worksheet '{}': {}", sheet_name, e))
}

/// Header names with blanks replaced by `Unnamed: {idx}` and repeats
/// suffixed `.1`, `.2`, ...
fn header_names(header: &[Data], width: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    (0..width)
        .map(|idx| {
            let raw = match header.get(idx) {
                Some(Data::Empty) | None => String::new(),
                Some(cell) => cell.to_string().trim().to_string(),
            };
            let base = if raw.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                raw
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Dominant value class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellClass {
    Int,
    Float,
    Bool,
    DateTime,
    Text,
}

fn is_missing(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn infer_class(cells: &[&Data]) -> CellClass {
    let mut numeric = false;
    let mut fractional = false;
    let mut boolean = false;
    let mut datetime = false;

    for cell in cells.iter().filter(|cell| !is_missing(cell)) {
        match cell {
            Data::Int(_) => numeric = true,
            Data::Float(f) => {
                numeric = true;
                if f.fract() != 0.0 || f.abs() >= 9.0e15 {
                    fractional = true;
                }
            }
            Data::Bool(_) => boolean = true,
            Data::DateTime(_) => datetime = true,
            Data::String(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => return CellClass::Text,
            Data::Empty | Data::Error(_) => {}
        }
    }

    match (numeric, boolean, datetime) {
        (true, false, false) if fractional => CellClass::Float,
        (true, false, false) => CellClass::Int,
        (false, true, false) => CellClass::Bool,
        (false, false, true) => CellClass::DateTime,
        _ => CellClass::Text,
    }
}

fn build_series(name: &str, cells: &[&Data]) -> PolarsResult<Series> {
    let name = PlSmallStr::from(name);
    let series = match infer_class(cells) {
        CellClass::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellClass::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellClass::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellClass::DateTime => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| {
                    cell.as_datetime()
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Series::new(name, values)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
        CellClass::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|cell| {
                    if is_missing(cell) {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect();
            Series::new(name, values)
        }
    };
    Ok(series)
}

fn range_to_frame(range: &Range<Data>) -> PolarsResult<DataFrame> {
    let rows: Vec<&[Data]> = range.rows().collect();
    let Some((header, body)) = rows.split_first() else {
        return Ok(DataFrame::empty());
    };

    let width = range.width();
    let names = header_names(header, width);
    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&EMPTY_CELL))
                .collect();
            build_series(name, &cells).map(Column::from)
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_fill_blanks_and_dedupe() {
        let header = vec![
            Data::String("id".to_string()),
            Data::Empty,
            Data::String("id".to_string()),
            Data::String("  ".to_string()),
        ];
        assert_eq!(
            header_names(&header, 5),
            vec!["id", "Unnamed: 1", "id.1", "Unnamed: 3", "Unnamed: 4"]
        );
    }

    #[test]
    fn test_whole_floats_become_integers() {
        let cells = [Data::Float(1.0), Data::Empty, Data::Int(3)];
        let refs: Vec<&Data> = cells.iter().collect();
        let series = build_series("n", &refs).unwrap();
        assert_eq!(series.dtype(), &DataType::Int64);
        assert_eq!(series.null_count(), 1);
    }

    #[test]
    fn test_fractional_floats_stay_float() {
        let cells = [Data::Float(1.5), Data::Int(2)];
        let refs: Vec<&Data> = cells.iter().collect();
        let series = build_series("n", &refs).unwrap();
        assert_eq!(series.dtype(), &DataType::Float64);
    }

    #[test]
    fn test_mixed_cells_become_text() {
        let cells = [Data::Float(1.0), Data::String("two".to_string()), Data::Bool(true)];
        let refs: Vec<&Data> = cells.iter().collect();
        let series = build_series("mixed", &refs).unwrap();
        assert_eq!(series.dtype(), &DataType::String);
        assert_eq!(series.null_count(), 0);
    }

    #[test]
    fn test_error_cells_are_missing() {
        let cells = [
            Data::String("a".to_string()),
            Data::Error(calamine::CellErrorType::NA),
        ];
        let refs: Vec<&Data> = cells.iter().collect();
        let series = build_series("t", &refs).unwrap();
        assert_eq!(series.null_count(), 1);
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let result = read_workbook(b"definitely not a zip archive", WorkbookKind::Xlsx);
        assert!(result.is_err());
    }
}
