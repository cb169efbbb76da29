//! TSV Table Loader Module
//! Reads headerless two-column summary tables using Polars.

use super::processor::{Record, RecordTable};
use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8 text", path.display())]
    Decode { path: PathBuf },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: PolarsError },
}

impl LoaderError {
    pub fn path(&self) -> &Path {
        match self {
            LoaderError::Io { path, .. }
            | LoaderError::Decode { path }
            | LoaderError::Parse { path, .. } => path,
        }
    }
}

/// Parse a count cell, returning `None` when the text is not a number.
///
/// Integers (including negative ones) parse directly. Decimal and exponent
/// forms are truncated toward zero. NaN and infinities are rejected.
pub fn parse_count(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let value: f64 = trimmed.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    // `as` saturates at the i64 bounds
    Some(value.trunc() as i64)
}

/// Coerce-or-default: any missing or non-numeric count becomes 0.
///
/// Malformed counts are absorbed here on purpose and never surface as errors.
pub fn coerce_count(raw: Option<&str>) -> i64 {
    raw.and_then(parse_count).unwrap_or(0)
}

/// Loads headerless `<label>\t<count>` files into a [`RecordTable`].
pub struct TableLoader;

impl TableLoader {
    /// Load a tab-separated two-column file.
    ///
    /// Labels are trimmed; counts go through [`coerce_count`]. Blank lines are
    /// skipped and an empty file yields an empty table.
    pub fn load_tsv(
        path: &Path,
        label_column: &str,
        count_column: &str,
    ) -> Result<RecordTable, LoaderError> {
        let bytes = fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| LoaderError::Decode {
            path: path.to_path_buf(),
        })?;

        let table = Self::parse_tsv(&text, label_column, count_column).map_err(|source| {
            LoaderError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

        log::debug!(
            "Loaded {} rows from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse already-decoded TSV text.
    pub fn parse_tsv(
        text: &str,
        label_column: &str,
        count_column: &str,
    ) -> PolarsResult<RecordTable> {
        let body: String = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .flat_map(|line| [line, "\n"])
            .collect();

        if body.is_empty() {
            return Ok(RecordTable::new(label_column, count_column, Vec::new()));
        }

        let mut schema = Schema::with_capacity(2);
        schema.with_column(label_column.into(), DataType::String);
        schema.with_column(count_column.into(), DataType::String);

        let df = CsvReadOptions::default()
            .with_has_header(false)
            .with_schema(Some(Arc::new(schema)))
            .with_n_threads(Some(1))
            .map_parse_options(|options| {
                options
                    .with_separator(b'\t')
                    .with_truncate_ragged_lines(true)
            })
            .into_reader_with_file_handle(Cursor::new(body.into_bytes()))
            .finish()?;

        let labels = df.column(label_column)?.as_materialized_series().str()?;
        let counts = df.column(count_column)?.as_materialized_series().str()?;

        let mut coerced = 0usize;
        let records: Vec<Record> = labels
            .into_iter()
            .zip(counts.into_iter())
            .map(|(label, raw_count)| {
                let label = label.map(str::trim).unwrap_or_default();
                if raw_count.and_then(parse_count).is_none() {
                    coerced += 1;
                    log::debug!("Count {:?} for {:?} defaulted to 0", raw_count, label);
                }
                Record::new(label, coerce_count(raw_count))
            })
            .collect();

        if coerced > 0 {
            log::warn!(
                "{} of {} '{}' values were not numeric and were counted as 0",
                coerced,
                records.len(),
                count_column
            );
        }

        Ok(RecordTable::new(label_column, count_column, records))
    }
}
