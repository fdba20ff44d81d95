use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataUnavailable;
use super::model::{
    METADATA_COLUMNS, RawRecord, RawTable, RawValue, RecordMetadata, is_metadata_column,
};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a wide-format climate table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the metadata columns plus one column per year
/// * `.json`    – `[{ "Country": "...", "F1961": 0.12, ... }, ...]`
/// * `.parquet` – same columns as the CSV layout, any scalar types
pub fn load_file(path: &Path) -> Result<RawTable, DataUnavailable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => read_csv(open(path)?, path)?,
        "json" => read_json(open(path)?, path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => {
            return Err(DataUnavailable::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: other.to_string(),
            });
        }
    };

    log::info!(
        "Loaded {} records with {} value columns from {}",
        table.len(),
        table.value_columns.len(),
        path.display()
    );
    Ok(table)
}

fn open(path: &Path) -> Result<File, DataUnavailable> {
    File::open(path).map_err(|source| DataUnavailable::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn malformed(path: &Path) -> impl FnOnce(anyhow::Error) -> DataUnavailable + '_ {
    move |e| DataUnavailable::Malformed {
        path: path.to_path_buf(),
        reason: format!("{e:#}"),
    }
}

// ---------------------------------------------------------------------------
// Column layout shared by all formats
// ---------------------------------------------------------------------------

/// Where the metadata and value columns sit in a header.
struct ColumnLayout {
    /// Source index of each column in [`METADATA_COLUMNS`] order.
    metadata: [usize; 10],
    /// `(source index, label)` of every non-metadata column.
    values: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn resolve(path: &Path, headers: &[String]) -> Result<Self, DataUnavailable> {
        let mut metadata = [0usize; 10];
        let mut missing = Vec::new();
        for (slot, name) in metadata.iter_mut().zip(METADATA_COLUMNS) {
            match headers.iter().position(|h| h == name) {
                Some(idx) => *slot = idx,
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(DataUnavailable::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }

        let values = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !is_metadata_column(h))
            .map(|(i, h)| (i, h.clone()))
            .collect();

        Ok(ColumnLayout { metadata, values })
    }

    fn value_labels(&self) -> Vec<String> {
        self.values.iter().map(|(_, label)| label.clone()).collect()
    }

    /// Assemble one record from a cell accessor keyed by source index.
    fn record<F>(&self, mut cell: F) -> RawRecord
    where
        F: FnMut(usize) -> RawValue,
    {
        let metadata = RecordMetadata::from_fields(self.metadata.map(|idx| cell(idx).to_string()));
        let values = self.values.iter().map(|(idx, _)| cell(*idx)).collect();
        RawRecord { metadata, values }
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, cells as text.
/// Empty cells load as [`RawValue::Null`].
pub fn read_csv<R: Read>(source: R, path: &Path) -> Result<RawTable, DataUnavailable> {
    let mut reader = csv::Reader::from_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")
        .map_err(malformed(path))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let layout = ColumnLayout::resolve(path, &headers)?;
    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result
            .with_context(|| format!("CSV row {row_no}"))
            .map_err(malformed(path))?;
        records.push(layout.record(|idx| match row.get(idx) {
            Some("") | None => RawValue::Null,
            Some(s) => RawValue::Text(s.to_string()),
        }));
    }

    Ok(RawTable {
        value_columns: layout.value_labels(),
        records,
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "ObjectId": 1, "Country": "Albania", ..., "F1961": 0.627, "F1962": null },
///   ...
/// ]
/// ```
///
/// The column set is the union of keys over all records, in the order they
/// are first seen; keys absent from a record load as [`RawValue::Null`].
pub fn read_json<R: Read>(source: R, path: &Path) -> Result<RawTable, DataUnavailable> {
    let root: JsonValue = serde_json::from_reader(source)
        .context("parsing JSON")
        .map_err(malformed(path))?;

    let rows = parse_json_rows(&root).map_err(malformed(path))?;

    let mut seen = HashSet::new();
    let columns: Vec<String> = rows
        .iter()
        .flat_map(|obj| obj.keys())
        .filter(|key| seen.insert(key.as_str()))
        .cloned()
        .collect();

    let layout = ColumnLayout::resolve(path, &columns)?;
    let records = rows
        .iter()
        .map(|obj| {
            layout.record(|idx| obj.get(&columns[idx]).map_or(RawValue::Null, json_to_raw))
        })
        .collect();

    Ok(RawTable {
        value_columns: layout.value_labels(),
        records,
    })
}

fn parse_json_rows(root: &JsonValue) -> Result<Vec<&serde_json::Map<String, JsonValue>>> {
    let records = root.as_array().context("Expected top-level JSON array")?;
    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            rec.as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))
        })
        .collect()
}

fn json_to_raw(val: &JsonValue) -> RawValue {
    match val {
        JsonValue::String(s) if s.is_empty() => RawValue::Null,
        JsonValue::String(s) => RawValue::Text(s.clone()),
        JsonValue::Number(n) => match n.as_i64() {
            // Keep integer identifiers printable without a trailing ".0".
            Some(i) => RawValue::Text(i.to_string()),
            None => n.as_f64().map_or(RawValue::Null, RawValue::Number),
        },
        JsonValue::Null => RawValue::Null,
        other => RawValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the CSV column layout.
///
/// Metadata columns may be any scalar type and are rendered as text.
/// Year columns are usually `Float64` but string columns (as written by
/// Pandas for mixed `object` dtypes) are accepted as well.
fn load_parquet(path: &Path) -> Result<RawTable, DataUnavailable> {
    let file = open(path)?;
    read_parquet(file, path)
}

fn read_parquet(file: File, path: &Path) -> Result<RawTable, DataUnavailable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")
        .map_err(malformed(path))?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let layout = ColumnLayout::resolve(path, &headers)?;

    let reader = builder
        .build()
        .context("building parquet reader")
        .map_err(malformed(path))?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .context("reading parquet record batch")
            .map_err(malformed(path))?;

        for row in 0..batch.num_rows() {
            let record = layout.record(|idx| extract_raw_value(batch.column(idx), row));
            records.push(record);
        }
    }

    Ok(RawTable {
        value_columns: layout.value_labels(),
        records,
    })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_raw_value(col: &Arc<dyn Array>, row: usize) -> RawValue {
    if col.is_null(row) {
        return RawValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => RawValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => RawValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => RawValue::Text(col.as_primitive::<Int32Type>().value(row).to_string()),
        DataType::Int64 => RawValue::Text(col.as_primitive::<Int64Type>().value(row).to_string()),
        DataType::Float32 => {
            RawValue::Number(f64::from(col.as_primitive::<Float32Type>().value(row)))
        }
        DataType::Float64 => RawValue::Number(col.as_primitive::<Float64Type>().value(row)),
        _ => match array_value_to_string(col, row) {
            Ok(s) if !s.is_empty() => RawValue::Text(s),
            _ => RawValue::Null,
        },
    }
}
