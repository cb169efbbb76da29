//! Data module - TSV loading and record tables

mod loader;
mod processor;

pub use loader::{coerce_count, parse_count, LoaderError, TableLoader};
pub use processor::{Record, RecordTable, SortOrder};
