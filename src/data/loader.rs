use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray,
};
use arrow::datatypes::DataType;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, SpectralDataset, Spectrum};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a spectral dataset from a file, dispatching on the extension.
///
/// Supported formats:
/// * `.parquet` – `x` and `y` list columns plus metadata columns
/// * `.json`    – `[{ "x": [...], "y": [...], ...meta }, ...]`
/// * `.csv`     – `x` and `y` columns holding semicolon-separated floats
pub fn load_file(path: &Path) -> Result<SpectralDataset> {
    let dataset = match extension(path).as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(
        "Loaded {} spectra from {} (metadata columns: {:?})",
        dataset.len(),
        path.display(),
        dataset.column_names
    );
    Ok(dataset)
}

/// Load several partitions of one dataset and concatenate them in order.
pub fn load_files(paths: &[PathBuf]) -> Result<SpectralDataset> {
    if paths.is_empty() {
        bail!("No input files given");
    }
    let parts = paths
        .iter()
        .map(|p| load_file(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(SpectralDataset::concat(parts))
}

pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn check_lengths(row: usize, x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        bail!("Row {row}: x has {} values but y has {}", x.len(), y.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, one object per spectrum:
///
/// ```json
/// [
///   { "x": [4000.0, 3998.0], "y": [0.12, 0.14], "class": "case", "batch": 3 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SpectralDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let spectra = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            let x = json_floats(obj.get("x"), i, "x")?;
            let y = json_floats(obj.get("y"), i, "y")?;
            check_lengths(i, &x, &y)?;

            let metadata = obj
                .iter()
                .filter(|(key, _)| *key != "x" && *key != "y")
                .map(|(key, val)| (key.clone(), MetadataValue::from_json(val)))
                .collect();
            Ok(Spectrum { x, y, metadata })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SpectralDataset::from_spectra(spectra))
}

fn json_floats(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Row {row}, {col}[{j}]: not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names; `x` and `y` hold semicolon-separated
/// floats (`"4000.0;3998.0"`), every other column is metadata.
fn load_csv(path: &Path) -> Result<SpectralDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let x_idx = column("x")?;
    let y_idx = column("y")?;

    let mut spectra = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let x = semicolon_floats(record.get(x_idx).unwrap_or(""), row_no, "x")?;
        let y = semicolon_floats(record.get(y_idx).unwrap_or(""), row_no, "y")?;
        check_lengths(row_no, &x, &y)?;

        let metadata = record
            .iter()
            .zip(headers.iter())
            .enumerate()
            .filter(|(col_idx, _)| *col_idx != x_idx && *col_idx != y_idx)
            .map(|(_, (value, name))| (name.to_string(), MetadataValue::infer(value)))
            .collect();

        spectra.push(Spectrum { x, y, metadata });
    }

    Ok(SpectralDataset::from_spectra(spectra))
}

fn semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Expected schema:
/// - `x`: List<Float64|Float32> or LargeList – wavenumber arrays
/// - `y`: List<Float64|Float32> or LargeList – intensity arrays
/// - any other column is metadata (strings, ints, floats, bools)
///
/// Files written by Pandas (`df.to_parquet()`), Polars and by this crate's
/// exporter all match.
fn load_parquet(path: &Path) -> Result<SpectralDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?
        .build()
        .context("building parquet reader")?;

    let mut spectra = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let x_idx = schema
            .index_of("x")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'x' column"))?;
        let y_idx = schema
            .index_of("y")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'y' column"))?;
        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != x_idx && *i != y_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let x = float_list(batch.column(x_idx), row)
                .with_context(|| format!("Row {row}: failed to read 'x'"))?;
            let y = float_list(batch.column(y_idx), row)
                .with_context(|| format!("Row {row}: failed to read 'y'"))?;
            check_lengths(row, &x, &y)?;

            let mut metadata = BTreeMap::new();
            for (col_idx, col_name) in &meta_cols {
                let value = metadata_cell(batch.column(*col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{col_name}'"))?;
                metadata.insert(col_name.clone(), value);
            }
            spectra.push(Spectrum { x, y, metadata });
        }
    }

    Ok(SpectralDataset::from_spectra(spectra))
}

/// Read a List/LargeList of Float64 or Float32 at `row` as `Vec<f64>`.
fn float_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row),
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(arr) = values.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = values.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values.data_type()
        )
    }
}

/// Read one metadata cell from an Arrow column.
fn metadata_cell(col: &Arc<dyn Array>, row: usize) -> Result<MetadataValue> {
    if col.is_null(row) {
        return Ok(MetadataValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => MetadataValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => MetadataValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => MetadataValue::Integer(i64::from(
            downcast::<Int32Array>(col)?.value(row),
        )),
        DataType::Int64 => MetadataValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => {
            MetadataValue::Float(f64::from(downcast::<Float32Array>(col)?.value(row)))
        }
        DataType::Float64 => MetadataValue::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => MetadataValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => MetadataValue::String(format!("{other:?}")),
    };
    Ok(value)
}

fn downcast<T: Array + 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}
