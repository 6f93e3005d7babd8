//! JSON to relational conversion
//!
//! - `builder.rs` - recursive tree walk (SchemaBuilder)
//! - `config.rs` - inference settings
//! - `naming.rs` - identifier sanitization

mod builder;
mod config;
pub mod naming;

pub use builder::{SchemaBuilder, convert};
pub use config::ConversionConfig;
