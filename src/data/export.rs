use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Float64Builder, Int64Array, ListBuilder,
    StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use super::loader::extension;
use super::model::{MetadataValue, SpectralDataset, Spectrum};
use crate::synth::{Class, GeneratedCohort};

// ---------------------------------------------------------------------------
// Cohort export
// ---------------------------------------------------------------------------

/// Write a generated cohort, dispatching on the extension.
///
/// * `.csv` – wide table: a `label` column then one column per wavenumber
/// * `.json` / `.parquet` – one spectrum per row with `label`, `class` and
///   `sample` metadata, readable again by the loader
pub fn write_cohort(path: &Path, cohort: &GeneratedCohort, wavenumbers: &[f64]) -> Result<()> {
    if wavenumbers.len() != cohort.n_features() {
        bail!(
            "cohort has {} features but the wavenumber axis has {} points",
            cohort.n_features(),
            wavenumbers.len()
        );
    }
    match extension(path).as_str() {
        "csv" => write_wide_csv(path, cohort, wavenumbers),
        _ => write_dataset(path, &cohort_dataset(cohort, wavenumbers)),
    }
    .with_context(|| format!("writing cohort to {}", path.display()))?;

    info!("Wrote {} synthetic spectra to {}", cohort.len(), path.display());
    Ok(())
}

/// Turn each cohort row into a [`Spectrum`] tagged with its label.
pub fn cohort_dataset(cohort: &GeneratedCohort, wavenumbers: &[f64]) -> SpectralDataset {
    let spectra = cohort
        .features
        .rows()
        .into_iter()
        .zip(&cohort.labels)
        .enumerate()
        .map(|(i, (row, &label))| {
            let class = if label == Class::Positive.label() {
                Class::Positive
            } else {
                Class::Negative
            };
            let metadata = BTreeMap::from([
                ("label".to_string(), MetadataValue::Integer(i64::from(label))),
                ("class".to_string(), MetadataValue::String(class.to_string())),
                ("sample".to_string(), MetadataValue::Integer(i as i64)),
            ]);
            Spectrum {
                x: wavenumbers.to_vec(),
                y: row.to_vec(),
                metadata,
            }
        })
        .collect();
    SpectralDataset::from_spectra(spectra)
}

fn write_wide_csv(path: &Path, cohort: &GeneratedCohort, wavenumbers: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    let header = std::iter::once("label".to_string()).chain(wavenumbers.iter().map(f64::to_string));
    writer.write_record(header).context("writing CSV header")?;

    for (row, label) in cohort.features.rows().into_iter().zip(&cohort.labels) {
        let record = std::iter::once(label.to_string()).chain(row.iter().map(f64::to_string));
        writer.write_record(record).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Dataset export
// ---------------------------------------------------------------------------

/// Write a spectral dataset in the layout the loader reads back
/// (`.parquet`, `.json`, or semicolon-list `.csv`).
pub fn write_dataset(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    match extension(path).as_str() {
        "parquet" | "pq" => write_parquet(path, dataset),
        "json" => write_json(path, dataset),
        "csv" => write_list_csv(path, dataset),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn write_json(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let records: Vec<JsonValue> = dataset
        .spectra
        .iter()
        .map(|sp| {
            let mut obj = Map::new();
            obj.insert("x".into(), JsonValue::from(sp.x.clone()));
            obj.insert("y".into(), JsonValue::from(sp.y.clone()));
            for (key, value) in &sp.metadata {
                obj.insert(key.clone(), value.to_json());
            }
            JsonValue::Object(obj)
        })
        .collect();

    let file = File::create(path).context("creating JSON file")?;
    serde_json::to_writer(BufWriter::new(file), &records).context("writing JSON")?;
    Ok(())
}

fn write_list_csv(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let join = |values: &[f64]| {
        values
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(";")
    };

    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    let header = ["x", "y"]
        .into_iter()
        .map(str::to_string)
        .chain(dataset.column_names.iter().cloned());
    writer.write_record(header).context("writing CSV header")?;

    for sp in &dataset.spectra {
        let meta = dataset.column_names.iter().map(|col| match sp.metadata.get(col) {
            Some(MetadataValue::Null) | None => String::new(),
            Some(value) => value.to_string(),
        });
        let record = [join(&sp.x), join(&sp.y)].into_iter().chain(meta);
        writer.write_record(record).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

fn write_parquet(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let list_field = || {
        DataType::List(Arc::new(Field::new("item", DataType::Float64, true)))
    };
    let mut fields = vec![
        Field::new("x", list_field(), false),
        Field::new("y", list_field(), false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        float_lists(dataset.spectra.iter().map(|sp| sp.x.as_slice())),
        float_lists(dataset.spectra.iter().map(|sp| sp.y.as_slice())),
    ];

    for col in &dataset.column_names {
        let cells: Vec<Option<&MetadataValue>> = dataset
            .spectra
            .iter()
            .map(|sp| {
                sp.metadata
                    .get(col)
                    .filter(|v| !matches!(v, MetadataValue::Null))
            })
            .collect();
        let array = metadata_array(&cells);
        fields.push(Field::new(col, array.data_type().clone(), true));
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn float_lists<'a>(rows: impl Iterator<Item = &'a [f64]>) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.values().append_slice(row);
        builder.append(true);
    }
    Arc::new(builder.finish())
}

/// Narrowest Arrow column able to hold every non-null cell.
fn metadata_array(cells: &[Option<&MetadataValue>]) -> ArrayRef {
    let non_null = || cells.iter().flatten();

    if non_null().all(|v| matches!(v, MetadataValue::Integer(_))) {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|v| match v {
                Some(MetadataValue::Integer(i)) => Some(*i),
                _ => None,
            })
            .collect();
        return Arc::new(Int64Array::from(values));
    }
    if non_null().all(|v| matches!(v, MetadataValue::Integer(_) | MetadataValue::Float(_))) {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|v| match v {
                Some(MetadataValue::Integer(i)) => Some(*i as f64),
                Some(MetadataValue::Float(f)) => Some(*f),
                _ => None,
            })
            .collect();
        return Arc::new(Float64Array::from(values));
    }
    if non_null().all(|v| matches!(v, MetadataValue::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|v| match v {
                Some(MetadataValue::Bool(b)) => Some(*b),
                _ => None,
            })
            .collect();
        return Arc::new(BooleanArray::from(values));
    }
    let values: Vec<Option<String>> = cells
        .iter()
        .map(|v| v.map(|value| value.to_string()))
        .collect();
    Arc::new(StringArray::from(values))
}
