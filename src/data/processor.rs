//! Data Processor Module
//! Holds the loaded record table and the display-order transforms applied to it.

/// One row of a summary table: a category name and its hit count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub label: String,
    pub count: i64,
}

impl Record {
    pub fn new(label: impl Into<String>, count: i64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Display order for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest count first
    Ascending,
    /// Largest count first
    Descending,
}

/// Ordered rows of a two-column summary table.
///
/// Duplicate labels are kept as separate rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    label_column: String,
    count_column: String,
    records: Vec<Record>,
}

impl RecordTable {
    pub fn new(label_column: &str, count_column: &str, records: Vec<Record>) -> Self {
        Self {
            label_column: label_column.to_string(),
            count_column: count_column.to_string(),
            records,
        }
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn count_column(&self) -> &str {
        &self.count_column
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sort rows by count. The sort is stable, so equal counts keep file order.
    pub fn sorted_by_count(mut self, order: SortOrder) -> Self {
        match order {
            SortOrder::Ascending => self.records.sort_by(|a, b| a.count.cmp(&b.count)),
            SortOrder::Descending => self.records.sort_by(|a, b| b.count.cmp(&a.count)),
        }
        self
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
