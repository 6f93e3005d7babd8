use super::record::{Record, RecordView};
use super::table::{Placeholder, Table, TableId};
use crate::core::SqlType;
use serde::Serialize;

/// A column whose observed values crossed type families and was widened to `TEXT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widening {
    pub table: String,
    pub column: String,
    pub from: SqlType,
    pub with: SqlType,
    pub to: SqlType,
}

/// Rows of one table ready for a batched parameterized insert.
#[derive(Debug, Clone)]
pub struct InsertBatch<'a> {
    pub table: &'a Table,
    pub rows: Vec<&'a [Option<String>]>,
}

impl InsertBatch<'_> {
    pub fn template(&self, placeholder: Placeholder) -> String {
        self.table.insert_template(placeholder)
    }
}

/// The outcome of one conversion: every table plus every row.
///
/// Tables are ordered so that a parent always precedes its children, which is
/// the order their DDL must run in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Database {
    schema: String,
    tables: Vec<Table>,
    records: Vec<Record>,
    widenings: Vec<Widening>,
}

impl Database {
    /// Seals a finished walk, padding every record to its table's final width.
    pub(crate) fn finish(
        schema: String,
        tables: Vec<Table>,
        mut records: Vec<Record>,
        widenings: Vec<Widening>,
    ) -> Self {
        for record in &mut records {
            record.pad_to(tables[record.table_id().index()].column_count());
        }

        Self {
            schema,
            tables,
            records,
            widenings,
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn widenings(&self) -> &[Widening] {
        &self.widenings
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.index()]
    }

    /// Looks a table up by bare or schema-qualified name.
    pub fn find_table(&self, name: &str) -> Option<(TableId, &Table)> {
        self.tables
            .iter()
            .enumerate()
            .find(|(_, t)| t.name() == name || t.qualified_name() == name)
            .map(|(idx, t)| (TableId(idx), t))
    }

    pub fn rows(&self) -> impl Iterator<Item = RecordView<'_>> {
        self.records
            .iter()
            .map(|r| RecordView::new(self.table(r.table_id()), r))
    }

    pub fn records_for(&self, id: TableId) -> impl Iterator<Item = RecordView<'_>> {
        let table = self.table(id);
        self.records
            .iter()
            .filter(move |r| r.table_id() == id)
            .map(move |r| RecordView::new(table, r))
    }

    pub fn create_table_queries(&self) -> Vec<String> {
        self.tables.iter().map(Table::create_table_query).collect()
    }

    /// One batch per table that has rows, parents before children.
    pub fn insert_batches(&self) -> Vec<InsertBatch<'_>> {
        let mut batches: Vec<InsertBatch<'_>> = self
            .tables
            .iter()
            .map(|table| InsertBatch {
                table,
                rows: Vec::new(),
            })
            .collect();

        for record in &self.records {
            batches[record.table_id().index()].rows.push(record.values());
        }

        batches.retain(|b| !b.rows.is_empty());
        batches
    }

    /// Human-readable dump: all DDL, then literal inserts grouped by table.
    pub fn diagnostic_script(&self) -> String {
        let mut out = String::from("--- Tables ---\n");
        out.push_str(&self.create_table_queries().join("\n"));

        for idx in 0..self.tables.len() {
            let inserts: Vec<String> = self
                .records_for(TableId(idx))
                .map(|row| row.literal_values_string())
                .collect();
            if !inserts.is_empty() {
                out.push('\n');
                out.push_str(&inserts.join("\n"));
            }
        }

        out
    }
}
