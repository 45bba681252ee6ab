// src/fetch/decode.rs

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

const SAMPLE_ROWS: usize = 1000;

/// The IADB dumps are requested with `bom=True`.
fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes)
}

/// Promote any integer type or Float32 in a sample-inferred dtype to Float64,
/// so every chunk parses numeric columns identically.
fn promote_sample_dtype(dt: &DataType) -> DataType {
    match dt {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32 => DataType::Float64,
        other => other.clone(),
    }
}

/// Read one CSV body into a DataFrame in row chunks of `chunk_size`.
///
/// The first `SAMPLE_ROWS` rows are sampled to infer a provisional schema;
/// integer-ish columns are promoted to Float64 and `overrides` pins dtypes for
/// columns whose inferred type cannot be trusted (e.g. a numeric column that
/// carries a textual missing marker). Every chunk is then read with the same
/// forced dtype vector, so the output is chunk-size-invariant.
pub fn read_csv_chunked(
    bytes: &[u8],
    chunk_size: usize,
    overrides: &[(&str, DataType)],
) -> Result<DataFrame> {
    let data = strip_bom(bytes);

    // sample read: infer a provisional schema
    let sample_opts = CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(Some(SAMPLE_ROWS))
        .with_infer_schema_length(Some(SAMPLE_ROWS))
        .with_ignore_errors(true);
    let sample: DataFrame = sample_opts
        .into_reader_with_file_handle(Cursor::new(data))
        .finish()
        .context("sample read of CSV body failed")?;

    // forced dtype vector: overrides by name, promotion everywhere else
    let mut forced: Vec<DataType> = Vec::with_capacity(sample.width());
    for s in sample.get_columns() {
        let name = s.name().as_str();
        let dtype = overrides
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, dt)| dt.clone())
            .unwrap_or_else(|| promote_sample_dtype(s.dtype()));
        forced.push(dtype);
    }
    let forced: Arc<Vec<DataType>> = Arc::new(forced);

    // full read, one chunk at a time, with the forced dtype vector
    let mut chunks: Vec<LazyFrame> = Vec::new();
    let mut offset = 0usize;
    loop {
        let opts = CsvReadOptions::default()
            .with_has_header(true)
            .with_skip_rows_after_header(offset)
            .with_n_rows(Some(chunk_size))
            .with_dtype_overwrite(Some(forced.clone()));
        let chunk: DataFrame = opts
            .into_reader_with_file_handle(Cursor::new(data))
            .finish()
            .with_context(|| format!("CSV chunk read at row offset {offset} failed"))?;
        let rows = chunk.height();
        if rows == 0 {
            break;
        }
        offset += rows;
        chunks.push(chunk.lazy());
        if rows < chunk_size {
            break;
        }
    }

    if chunks.is_empty() {
        // header-only body: the empty sample already carries the schema
        return Ok(sample);
    }

    let df = concat(chunks, UnionArgs::default())
        .context("stacking CSV chunks")?
        .collect()
        .context("collecting CSV chunks")?;
    debug!(rows = df.height(), cols = df.width(), "decoded CSV body");
    Ok(df)
}

/// Read the ISO reference table in one shot, every column as text. Only two
/// string columns are consumed downstream, so no inference is needed.
pub fn read_reference_csv(bytes: &[u8]) -> Result<DataFrame> {
    let data = strip_bom(bytes);
    let opts = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0));
    opts.into_reader_with_file_handle(Cursor::new(data))
        .finish()
        .context("parsing the ISO reference CSV")
}
