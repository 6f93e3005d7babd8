use super::table::{Placeholder, Table, TableId};
use serde::{Deserialize, Serialize};

/// One row of a table. Values are positional and string-typed; `None` is SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    table: TableId,
    values: Vec<Option<String>>,
}

impl Record {
    pub(crate) fn new(table: TableId) -> Self {
        Self {
            table,
            values: Vec::new(),
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn value(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sets the value at `idx`, padding any gap before it with `NULL`.
    pub(crate) fn set(&mut self, idx: usize, value: Option<String>) {
        if self.values.len() <= idx {
            self.values.resize(idx + 1, None);
        }
        self.values[idx] = value;
    }

    /// Points the record at its table's final position.
    pub(crate) fn relink(&mut self, table: TableId) {
        self.table = table;
    }

    /// Backfills columns added after this row was written.
    pub(crate) fn pad_to(&mut self, width: usize) {
        if self.values.len() < width {
            self.values.resize(width, None);
        }
    }
}

/// A record paired with the table that defines its layout.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    table: &'a Table,
    record: &'a Record,
}

impl<'a> RecordView<'a> {
    pub(crate) fn new(table: &'a Table, record: &'a Record) -> Self {
        Self { table, record }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn record(&self) -> &'a Record {
        self.record
    }

    pub fn values(&self) -> &'a [Option<String>] {
        self.record.values()
    }

    /// Value of the named column, `None` for `NULL` or an unknown column.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.table
            .find_column_index(column)
            .and_then(|idx| self.record.value(idx))
    }

    pub fn insert_template(&self) -> String {
        self.table.insert_template(Placeholder::Question)
    }

    pub fn literal_values_string(&self) -> String {
        let values: Vec<&str> = (0..self.table.column_count())
            .map(|idx| self.record.value(idx).unwrap_or("null"))
            .collect();

        format!(
            "INSERT INTO {} VALUES ({})",
            self.table.qualified_name(),
            values.join(", ")
        )
    }
}
