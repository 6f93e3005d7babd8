//! Relational model produced by a conversion: tables, their rows and the
//! aggregate handed to an executor.

pub mod database;
pub mod record;
pub mod table;

pub use database::{Database, InsertBatch, Widening};
pub use record::{Record, RecordView};
pub use table::{Placeholder, Table, TableId};
