//! Cell conversion from Polars values to JSON.

use polars::prelude::*;
use serde_json::{Map, Number, Value};

/// Convert one cell. Non-finite floats become `null`; temporal and nested
/// values use their display form.
pub(crate) fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float(v as f64),
        AnyValue::Float64(v) => float(v),
        other => Value::String(other.to_string()),
    }
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Rows of `df` as JSON objects keyed by column name, in column order.
pub(crate) fn dataframe_to_records(df: &DataFrame) -> PolarsResult<Vec<Value>> {
    let columns = df.get_columns();
    let mut records = Vec::with_capacity(df.height());

    for row in 0..df.height() {
        let mut record = Map::with_capacity(columns.len());
        for column in columns {
            record.insert(column.name().to_string(), any_value_to_json(column.get(row)?));
        }
        records.push(Value::Object(record));
    }

    Ok(records)
}

/// Text shown for a statistic in a `Metric`/`Value` listing.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
