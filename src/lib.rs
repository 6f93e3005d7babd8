// ============================================================================
// jsonrel Library
// ============================================================================

pub mod convert;
pub mod core;
pub mod executor;
pub mod schema;
pub mod source;

// Re-export main types for convenience
pub use convert::{ConversionConfig, SchemaBuilder, convert};
pub use crate::core::{Column, ColumnRole, ConversionError, Result, SqlType};
pub use schema::{Database, Placeholder, Record, RecordView, Table, TableId, Widening};
pub use source::{JsonSource, SourceError};

// Re-export executor API
pub use executor::{
    ExecError, ExecutionOptions, ExecutionReport, PostgresExecutor, RecordingExecutor,
    SqlExecutor, execute_database,
};

/// Parse `text` and convert it with the default configuration.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = jsonrel::convert_str("root", r#"{"items": [1, 2, 3]}"#, "public")?;
///
/// let (_, items) = db.find_table("root_items").unwrap();
/// assert_eq!(items.column_names(), vec!["id", "root_id", "value"]);
/// assert_eq!(db.records().len(), 4);
/// # Ok(())
/// # }
/// ```
pub fn convert_str(root_name: &str, text: &str, schema: &str) -> anyhow::Result<Database> {
    let value = JsonSource::Text(text.to_string()).load()?;
    Ok(convert(root_name, &value, schema)?)
}
