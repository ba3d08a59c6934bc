//! Binary and structured formats: json, parquet, feather and hdf5.
//!
//! None of these go through the encoding fallback chain.

use indexmap::IndexMap;
use polars::prelude::*;
use serde_json::{Map, Value};
use std::io::Cursor;
use std::num::NonZeroUsize;

/// Read JSON records (`[{...}, ...]`) or a column mapping
/// (`{"col": {"0": v}}` / `{"col": [v, ...]}`).
///
/// The schema is inferred from the first `infer_schema_length` records, or
/// from all of them when `None`.
pub(crate) fn read_json(
    bytes: &[u8],
    infer_schema_length: Option<usize>,
) -> Result<DataFrame, String> {
    let document: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

    let records = match document {
        Value::Array(records) => records,
        Value::Object(columns) => columns_to_records(columns)?,
        _ => return Err("expected an array of records or an object of columns".to_string()),
    };

    if records.is_empty() {
        return Ok(DataFrame::empty());
    }

    let payload = serde_json::to_vec(&records).map_err(|e| e.to_string())?;
    JsonReader::new(Cursor::new(payload))
        .with_json_format(JsonFormat::Json)
        .infer_schema_len(infer_schema_length.and_then(NonZeroUsize::new))
        .finish()
        .map_err(|e| e.to_string())
}

/// Pivot a column-oriented document into row records keyed by index label.
fn columns_to_records(columns: Map<String, Value>) -> Result<Vec<Value>, String> {
    let mut rows: IndexMap<String, Map<String, Value>> = IndexMap::new();

    for (column, cells) in columns {
        match cells {
            Value::Object(cells) => {
                for (label, cell) in cells {
                    rows.entry(label).or_default().insert(column.clone(), cell);
                }
            }
            Value::Array(cells) => {
                for (position, cell) in cells.into_iter().enumerate() {
                    rows.entry(position.to_string())
                        .or_default()
                        .insert(column.clone(), cell);
                }
            }
            _ => return Err(format!("column '{}' is neither a list nor a mapping", column)),
        }
    }

    Ok(rows.into_values().map(Value::Object).collect())
}

pub(crate) fn read_parquet(bytes: &[u8]) -> Result<DataFrame, String> {
    ParquetReader::new(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| e.to_string())
}

/// Feather v2 files are Arrow IPC files.
pub(crate) fn read_feather(bytes: &[u8]) -> Result<DataFrame, String> {
    IpcReader::new(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| e.to_string())
}

/// Every top-level one-dimensional dataset becomes a `Float64` column.
#[cfg(feature = "hdf5")]
pub(crate) fn read_hdf5(bytes: &[u8]) -> Result<DataFrame, String> {
    use std::io::Write;
    use tracing::debug;

    const HDF5_NOT_FLAT: &str = "HDF5 file did not contain a flat table";

    // the HDF5 library only opens files by path
    let mut scratch = tempfile::NamedTempFile::new().map_err(|e| e.to_string())?;
    scratch.write_all(bytes).map_err(|e| e.to_string())?;
    scratch.flush().map_err(|e| e.to_string())?;

    let file = hdf5::File::open(scratch.path()).map_err(|e| e.to_string())?;
    let names = file.member_names().map_err(|e| e.to_string())?;

    let mut columns: Vec<Column> = Vec::new();
    for name in names {
        let Ok(dataset) = file.dataset(&name) else {
            debug!("Skipping HDF5 member '{}' (not a dataset)", name);
            continue;
        };
        if dataset.ndim() != 1 {
            debug!("Skipping HDF5 dataset '{}' ({} dimensions)", name, dataset.ndim());
            continue;
        }
        match dataset.read_1d::<f64>() {
            Ok(values) => {
                columns.push(Series::new(name.as_str().into(), values.to_vec()).into());
            }
            Err(e) => debug!("Skipping HDF5 dataset '{}': {}", name, e),
        }
    }

    let Some(first) = columns.first() else {
        return Err(HDF5_NOT_FLAT.to_string());
    };
    let height = first.len();
    if columns.iter().any(|column| column.len() != height) {
        return Err(HDF5_NOT_FLAT.to_string());
    }

    DataFrame::new(columns).map_err(|e| e.to_string())
}

#[cfg(not(feature = "hdf5"))]
pub(crate) fn read_hdf5(_bytes: &[u8]) -> Result<DataFrame, String> {
    Err("HDF5 support is not compiled in (enable the `hdf5` feature)".to_string())
}
