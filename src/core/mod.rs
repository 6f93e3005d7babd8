pub mod error;
pub mod types;

pub use error::{ConversionError, Result};
pub use types::{Column, ColumnRole, ForeignKey, SqlType, TypeFamily};
