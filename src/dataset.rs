//! Reference dataset loading
//!
//! Reads the leading rows of a CSV file with the arrow CSV reader (schema
//! inferred over the whole file) and converts them into JSON records through
//! `arrow-json`, keeping column order and emitting explicit nulls.
//!
//! Column naming and dtypes follow pandas' `read_csv`: blank headers become
//! `Unnamed: {i}`, duplicate headers are suffixed, and integer columns with
//! missing cells are read as floats.

use crate::error::{Error, Result};
use arrow::array::Array;
use arrow::compute::cast;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use arrow_json::writer::{JsonArray, WriterBuilder};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One dataset record, column name to scalar value
pub type SampleRow = Map<String, Value>;

/// Load the first `limit` rows of the CSV file at `path`.
pub fn load_samples(path: &Path, limit: usize) -> Result<Vec<SampleRow>> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "Test data not found at {}",
            path.display()
        )));
    }

    let batches = read_head(path, limit)?;
    let rows = batches_to_rows(&batches)?;
    debug!("Loaded {} sample rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn read_head(path: &Path, limit: usize) -> Result<Vec<RecordBatch>> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut file = File::open(path)?;
    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(&mut file, None)?;
    file.seek(SeekFrom::Start(0))?;

    let schema: SchemaRef = Arc::new(normalize_column_names(&schema));
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(file)?;

    // Null presence is tracked over the whole file, not just the head
    let mut has_nulls = vec![false; schema.fields().len()];
    let mut batches = Vec::new();
    let mut remaining = limit;
    for batch in reader {
        let batch = batch?;
        for (idx, column) in batch.columns().iter().enumerate() {
            has_nulls[idx] |= column.null_count() > 0;
        }
        if remaining > 0 {
            let take = batch.num_rows().min(remaining);
            batches.push(batch.slice(0, take));
            remaining -= take;
        }
    }

    batches
        .iter()
        .map(|batch| promote_nullable_integers(batch, &has_nulls))
        .collect()
}

/// Rename header fields the way pandas does: a blank header at position `i`
/// becomes `Unnamed: {i}` and repeated names get `.1`, `.2`, ... suffixes.
fn normalize_column_names(schema: &Schema) -> Schema {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let mut name = if field.name().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                field.name().clone()
            };

            let mut count = counts.get(&name).copied().unwrap_or(0);
            while count > 0 {
                counts.insert(name.clone(), count + 1);
                name = format!("{}.{}", name, count);
                count = counts.get(&name).copied().unwrap_or(0);
            }
            counts.insert(name.clone(), count + 1);

            if &name != field.name() {
                debug!("Renaming CSV column {} '{}' to '{}'", idx, field.name(), name);
            }
            field.as_ref().clone().with_name(name)
        })
        .collect();
    Schema::new_with_metadata(fields, schema.metadata().clone())
}

/// Integer columns holding nulls are widened to Float64
fn promote_nullable_integers(batch: &RecordBatch, has_nulls: &[bool]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for ((field, column), nullable) in schema.fields().iter().zip(batch.columns()).zip(has_nulls) {
        if *nullable && field.data_type() == &DataType::Int64 {
            columns.push(cast(column, &DataType::Float64)?);
            fields.push(field.as_ref().clone().with_data_type(DataType::Float64));
        } else {
            columns.push(column.clone());
            fields.push(field.as_ref().clone());
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn batches_to_rows(batches: &[RecordBatch]) -> Result<Vec<SampleRow>> {
    if batches.iter().all(|b| b.num_rows() == 0) {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .with_explicit_nulls(true)
        .build::<_, JsonArray>(Vec::new());
    let refs: Vec<&RecordBatch> = batches.iter().collect();
    writer.write_batches(&refs)?;
    writer.finish()?;

    let buf = writer.into_inner();
    let rows: Vec<SampleRow> = serde_json::from_slice(&buf)?;
    Ok(rows)
}
