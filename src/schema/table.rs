use crate::core::{Column, ColumnRole, ForeignKey};
use serde::{Deserialize, Serialize};

/// Position of a table inside its `Database`, parents before children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub(crate) usize);

impl TableId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Placeholder syntax used by parameterized insert templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `?` (JDBC / ODBC style)
    #[default]
    Question,
    /// `$1`, `$2`, ...
    Numbered,
    /// `$1::text::INTEGER`, for drivers that bind every value as text.
    TextCast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    schema: String,
    name: String,
    columns: Vec<Column>,
    foreign_key_constraints: bool,
}

impl Table {
    pub(crate) fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        primary_key: impl Into<String>,
        foreign_key_constraints: bool,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: vec![Column::primary_key(primary_key)],
            foreign_key_constraints,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.find_column_index(name).map(|idx| &self.columns[idx])
    }

    /// The identity column. Always the first one.
    pub fn primary_key(&self) -> &Column {
        &self.columns[0]
    }

    pub fn foreign_keys(&self) -> Vec<ForeignKey<'_>> {
        self.columns
            .iter()
            .filter_map(|col| match &col.role {
                ColumnRole::ForeignKey { references } => Some(ForeignKey {
                    column: &col.name,
                    references,
                }),
                _ => None,
            })
            .collect()
    }

    /// Appends a column and returns its position.
    pub(crate) fn push_column(&mut self, column: Column) -> usize {
        self.columns.push(column);
        self.columns.len() - 1
    }

    pub(crate) fn column_mut(&mut self, idx: usize) -> &mut Column {
        &mut self.columns[idx]
    }

    pub fn create_table_query(&self) -> String {
        let pk_name = &self.primary_key().name;
        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|col| match &col.role {
                ColumnRole::PrimaryKey => format!("{} PRIMARY KEY", col.definition()),
                ColumnRole::ForeignKey { references } if self.foreign_key_constraints => {
                    format!("{} REFERENCES {} ({})", col.definition(), references, pk_name)
                }
                _ => col.definition(),
            })
            .collect();

        format!(
            "CREATE TABLE {} ({})",
            self.qualified_name(),
            column_defs.join(", ")
        )
    }

    pub fn insert_template(&self, placeholder: Placeholder) -> String {
        let params: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| match placeholder {
                Placeholder::Question => "?".to_string(),
                Placeholder::Numbered => format!("${}", i + 1),
                Placeholder::TextCast => format!("${}::text::{}", i + 1, col.sql_type),
            })
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.qualified_name(),
            self.column_names().join(", "),
            params.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SqlType;

    fn sample() -> Table {
        let mut table = Table::new("shop", "order_items", "id", true);
        table.push_column(Column::foreign_key("order_id", SqlType::Integer, "shop.order"));
        table.push_column(Column::field("sku", SqlType::VarChar(8), "sku"));
        table.push_column(Column::field("qty", SqlType::Integer, "qty").with_default("1"));
        table
    }

    #[test]
    fn test_create_table_query() {
        assert_eq!(
            sample().create_table_query(),
            "CREATE TABLE shop.order_items (id INTEGER PRIMARY KEY, \
             order_id INTEGER REFERENCES shop.order (id), sku VARCHAR(8), qty INTEGER DEFAULT '1')"
        );
    }

    #[test]
    fn test_create_table_without_constraints() {
        let mut table = Table::new("s", "child", "id", false);
        table.push_column(Column::foreign_key("parent_id", SqlType::Integer, "s.parent"));
        assert_eq!(
            table.create_table_query(),
            "CREATE TABLE s.child (id INTEGER PRIMARY KEY, parent_id INTEGER)"
        );
    }

    #[test]
    fn test_insert_templates() {
        let table = sample();
        assert_eq!(
            table.insert_template(Placeholder::Question),
            "INSERT INTO shop.order_items (id, order_id, sku, qty) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(
            table.insert_template(Placeholder::Numbered),
            "INSERT INTO shop.order_items (id, order_id, sku, qty) VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(
            table.insert_template(Placeholder::TextCast),
            "INSERT INTO shop.order_items (id, order_id, sku, qty) VALUES \
             ($1::text::INTEGER, $2::text::INTEGER, $3::text::VARCHAR(8), $4::text::INTEGER)"
        );
    }

    #[test]
    fn test_lookups() {
        let table = sample();
        assert_eq!(table.qualified_name(), "shop.order_items");
        assert_eq!(table.primary_key().name, "id");
        assert_eq!(table.find_column_index("sku"), Some(2));
        assert!(table.get_column("missing").is_none());
        assert_eq!(
            table.foreign_keys(),
            vec![ForeignKey {
                column: "order_id",
                references: "shop.order"
            }]
        );
    }
}
