//! JSON to relational decomposition.
//!
//! Every JSON object becomes a row. Nested objects and arrays become rows of
//! child tables named `<parent>_<key>` that point back at the parent row
//! through a `<parent>_id` foreign key. Scalars become typed columns whose
//! type is the join of every value observed for them.

use super::config::ConversionConfig;
use super::naming::{child_table_name, foreign_key_name, sanitize, sanitize_name};
use crate::core::{Column, ColumnRole, ConversionError, Result, SqlType};
use crate::schema::{Database, Record, Table, TableId, Widening};
use log::{debug, warn};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

/// Key under which non-object array elements are stored.
const ELEMENT_KEY: &str = "value";

/// Converts JSON documents into a `Database`.
///
/// The builder only holds configuration; each call to [`SchemaBuilder::convert`]
/// walks the tree with fresh state, so converting the same document twice
/// yields two equal, independent results.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    config: ConversionConfig,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Decompose `root` into tables under `schema`, naming the top table `root_name`.
    ///
    /// # Example
    /// ```
    /// use jsonrel::SchemaBuilder;
    /// use serde_json::json;
    ///
    /// let db = SchemaBuilder::new()
    ///     .convert("root", &json!({"a": {"b": 2}}), "public")
    ///     .unwrap();
    /// assert_eq!(db.tables().len(), 2);
    /// assert_eq!(db.tables()[1].column_names(), vec!["id", "root_id", "b"]);
    /// ```
    pub fn convert(&self, root_name: &str, root: &JsonValue, schema: &str) -> Result<Database> {
        let root_name = sanitize_name("root", root_name)?;
        let schema = sanitize_name("schema", schema)?;

        let mut walk = Walk::new(&self.config, schema);
        match root {
            JsonValue::Object(map) => walk.visit_object(&root_name, map, None)?,
            JsonValue::Array(items) => walk.visit_array(&root_name, items, None)?,
            scalar => return Err(ConversionError::InvalidRoot(kind_of(scalar).to_string())),
        }

        Ok(walk.finish())
    }
}

/// Convert with the default configuration.
pub fn convert(root_name: &str, root: &JsonValue, schema: &str) -> Result<Database> {
    SchemaBuilder::new().convert(root_name, root, schema)
}

/// The parent row a child row links back to.
#[derive(Debug, Clone, Copy)]
struct Link {
    table: TableId,
    row_id: u64,
}

/// Per-table bookkeeping while the walk runs.
struct TableState {
    table: Table,
    last_id: u64,
    /// Whether each column has seen a non-null value yet.
    typed: Vec<bool>,
}

struct Walk<'c> {
    config: &'c ConversionConfig,
    schema: String,
    tables: Vec<TableState>,
    by_name: HashMap<String, TableId>,
    records: Vec<Record>,
    widenings: Vec<Widening>,
}

impl<'c> Walk<'c> {
    fn new(config: &'c ConversionConfig, schema: String) -> Self {
        Self {
            config,
            schema,
            tables: Vec::new(),
            by_name: HashMap::new(),
            records: Vec::new(),
            widenings: Vec::new(),
        }
    }

    fn visit_object(
        &mut self,
        name: &str,
        fields: &Map<String, JsonValue>,
        parent: Option<Link>,
    ) -> Result<()> {
        let (table, record_idx, row_id) = self.begin_row(name, parent)?;
        for (key, value) in fields {
            self.visit_field(table, record_idx, row_id, key, value)?;
        }
        Ok(())
    }

    fn visit_array(&mut self, name: &str, items: &[JsonValue], parent: Option<Link>) -> Result<()> {
        // Created up front so an empty array still yields its table.
        self.ensure_table(name, parent.map(|p| p.table))?;

        for item in items {
            match item {
                JsonValue::Object(fields) => self.visit_object(name, fields, parent)?,
                other => {
                    let (table, record_idx, row_id) = self.begin_row(name, parent)?;
                    self.visit_field(table, record_idx, row_id, ELEMENT_KEY, other)?;
                }
            }
        }
        Ok(())
    }

    fn visit_field(
        &mut self,
        table: TableId,
        record_idx: usize,
        row_id: u64,
        key: &str,
        value: &JsonValue,
    ) -> Result<()> {
        let link = Link { table, row_id };
        match value {
            JsonValue::Object(fields) => {
                let child = child_table_name(self.table(table).name(), key);
                self.visit_object(&child, fields, Some(link))
            }
            JsonValue::Array(items) => {
                let child = child_table_name(self.table(table).name(), key);
                self.visit_array(&child, items, Some(link))
            }
            scalar => self.set_scalar(table, record_idx, key, scalar),
        }
    }

    /// Allocates the next key of `name` and emits its record, linked to `parent`.
    fn begin_row(&mut self, name: &str, parent: Option<Link>) -> Result<(TableId, usize, u64)> {
        let (table, fk_idx) = self.ensure_table(name, parent.map(|p| p.table))?;

        let state = &mut self.tables[table.index()];
        state.last_id += 1;
        let row_id = state.last_id;

        let mut record = Record::new(table);
        record.set(0, Some(row_id.to_string()));
        if let (Some(idx), Some(link)) = (fk_idx, parent) {
            record.set(idx, Some(link.row_id.to_string()));
        }

        self.records.push(record);
        Ok((table, self.records.len() - 1, row_id))
    }

    /// Looks up or creates `name`, making sure it has a foreign key to `parent`.
    fn ensure_table(&mut self, name: &str, parent: Option<TableId>) -> Result<(TableId, Option<usize>)> {
        let table = match self.by_name.get(name).copied() {
            Some(id) => id,
            None => {
                let id = TableId(self.tables.len());
                debug!("Creating table {}.{}", self.schema, name);
                self.tables.push(TableState {
                    table: Table::new(
                        self.schema.clone(),
                        name,
                        self.config.primary_key.clone(),
                        self.config.foreign_key_constraints,
                    ),
                    last_id: 0,
                    typed: vec![true],
                });
                self.by_name.insert(name.to_string(), id);
                id
            }
        };

        let Some(parent) = parent else {
            return Ok((table, None));
        };

        let parent_table = self.table(parent);
        let column = Column::foreign_key(
            foreign_key_name(parent_table.name(), &self.config.primary_key),
            parent_table.primary_key().sql_type,
            parent_table.qualified_name(),
        );

        let idx = match self.table(table).find_column_index(&column.name) {
            Some(idx) => {
                self.check_role(table, idx, &column.name, &column.role)?;
                idx
            }
            None => self.push_column(table, column, true),
        };

        Ok((table, Some(idx)))
    }

    fn set_scalar(&mut self, table: TableId, record_idx: usize, key: &str, value: &JsonValue) -> Result<()> {
        let name = sanitize(key);
        let role = ColumnRole::Field {
            key: key.to_string(),
        };

        let idx = match self.table(table).find_column_index(&name) {
            Some(idx) => {
                self.check_role(table, idx, key, &role)?;
                idx
            }
            None => {
                let mut column = Column::new(name, SqlType::Text, role);
                if let Some(default) = self.config.defaults.get(&column.name) {
                    column = column.with_default(default.clone());
                }
                self.push_column(table, column, false)
            }
        };

        let rendered = match self.infer_type(value) {
            Some(sql_type) => {
                self.observe(table, idx, sql_type)?;
                Some(render_scalar(value))
            }
            None => None,
        };
        self.records[record_idx].set(idx, rendered);
        Ok(())
    }

    /// Folds a newly observed type into a column.
    fn observe(&mut self, table: TableId, idx: usize, observed: SqlType) -> Result<()> {
        let observed = self.cap(observed);
        let state = &mut self.tables[table.index()];

        if !state.typed[idx] {
            state.typed[idx] = true;
            state.table.column_mut(idx).sql_type = observed;
            return Ok(());
        }

        let current = state.table.columns()[idx].sql_type;
        let merged = self.cap(current.join(observed));
        if merged == current && !current.conflicts_with(observed) {
            return Ok(());
        }

        let state = &mut self.tables[table.index()];
        let column = state.table.columns()[idx].name.clone();

        if current.conflicts_with(observed) {
            if self.config.strict_types {
                return Err(ConversionError::TypeWideningConflict {
                    table: state.table.qualified_name(),
                    column,
                    from: current,
                    with: observed,
                });
            }
            if merged != current {
                warn!(
                    "Column {}.{} mixes {} and {}; widening to {}",
                    state.table.qualified_name(),
                    column,
                    current,
                    observed,
                    merged
                );
                self.widenings.push(Widening {
                    table: state.table.qualified_name(),
                    column,
                    from: current,
                    with: observed,
                    to: merged,
                });
            }
        } else {
            debug!(
                "Widening {}.{} from {} to {}",
                state.table.qualified_name(),
                column,
                current,
                merged
            );
        }

        state.table.column_mut(idx).sql_type = merged;
        Ok(())
    }

    /// Fails unless the existing column at `idx` plays `role`.
    fn check_role(&self, table: TableId, idx: usize, key: &str, role: &ColumnRole) -> Result<()> {
        let table = self.table(table);
        let existing = &table.columns()[idx];
        if &existing.role == role {
            return Ok(());
        }
        Err(ConversionError::NameCollision {
            table: table.qualified_name(),
            column: existing.name.clone(),
            key: key.to_string(),
            existing: existing.role.to_string(),
        })
    }

    fn push_column(&mut self, table: TableId, column: Column, typed: bool) -> usize {
        let state = &mut self.tables[table.index()];
        debug!("Adding column {} to {}", column.name, state.table.qualified_name());
        state.typed.push(typed);
        state.table.push_column(column)
    }

    fn infer_type(&self, value: &JsonValue) -> Option<SqlType> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(_) => Some(SqlType::Boolean),
            JsonValue::Number(n) => Some(match n.as_i64() {
                Some(i) if self.config.fits_integer(i) => SqlType::Integer,
                Some(_) => SqlType::BigInt,
                // u64 above i64::MAX, or a fraction
                None => SqlType::Double,
            }),
            JsonValue::String(s) => {
                let len = u32::try_from(s.chars().count()).unwrap_or(u32::MAX);
                Some(SqlType::VarChar(len.max(1)))
            }
            // visit_field routes containers to child tables; kept for exhaustiveness
            JsonValue::Array(_) | JsonValue::Object(_) => Some(SqlType::Text),
        }
    }

    fn cap(&self, sql_type: SqlType) -> SqlType {
        match (sql_type, self.config.max_varchar_length) {
            (SqlType::VarChar(n), Some(max)) if n > max => SqlType::Text,
            _ => sql_type,
        }
    }

    fn table(&self, id: TableId) -> &Table {
        &self.tables[id.index()].table
    }

    fn finish(mut self) -> Database {
        // Keys that outgrew INTEGER widen together with the foreign keys pointing at them.
        let mut widened_keys = Vec::new();
        for state in &mut self.tables {
            let last = i64::try_from(state.last_id).unwrap_or(i64::MAX);
            if !self.config.fits_integer(last) {
                state.table.column_mut(0).sql_type = SqlType::BigInt;
                widened_keys.push(state.table.qualified_name());
            }
        }
        if !widened_keys.is_empty() {
            for state in &mut self.tables {
                for idx in 0..state.table.column_count() {
                    let column = state.table.column_mut(idx);
                    if let ColumnRole::ForeignKey { references } = &column.role
                        && widened_keys.contains(references)
                    {
                        column.sql_type = SqlType::BigInt;
                    }
                }
            }
        }

        // A table reached again from a later parent may reference a table created after it.
        let order = self.dependency_order();
        let mut position = vec![0; order.len()];
        for (new_idx, &old_idx) in order.iter().enumerate() {
            position[old_idx] = new_idx;
        }
        for record in &mut self.records {
            record.relink(TableId(position[record.table_id().index()]));
        }

        let mut slots: Vec<Option<Table>> = self.tables.into_iter().map(|s| Some(s.table)).collect();
        let tables = order.iter().filter_map(|&idx| slots[idx].take()).collect();
        Database::finish(self.schema, tables, self.records, self.widenings)
    }

    /// Creation order, with every table moved behind the tables it references.
    fn dependency_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.tables.len());
        let mut placed = vec![false; self.tables.len()];
        for idx in 0..self.tables.len() {
            self.place(idx, &mut placed, &mut order);
        }
        order
    }

    fn place(&self, idx: usize, placed: &mut [bool], order: &mut Vec<usize>) {
        if placed[idx] {
            return;
        }
        // Child names extend their parent's name, so references never form a cycle.
        placed[idx] = true;
        for fk in self.tables[idx].table.foreign_keys() {
            let parent = self
                .tables
                .iter()
                .position(|s| s.table.qualified_name() == fk.references);
            if let Some(parent) = parent {
                self.place(parent, placed, order);
            }
        }
        order.push(idx);
    }
}

fn render_scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
