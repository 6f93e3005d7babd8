//! Maps JSON keys onto unquoted SQL identifiers.
//!
//! Identifiers are folded to lowercase ASCII, every run of other characters
//! becomes a single `_`, a leading digit gets a `_` prefix and reserved SQL
//! words get a `_` suffix. Distinct keys may therefore map to the same
//! identifier; the builder reports that as a name collision.

use crate::core::{ConversionError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INVALID_RUN: Regex = Regex::new(r"[^a-z0-9_]+").unwrap();
}

const RESERVED_WORDS: &[&str] = &[
    "all", "alter", "and", "any", "as", "asc", "between", "both", "by", "case", "cast", "check",
    "column", "constraint", "create", "cross", "default", "delete", "desc", "distinct", "do",
    "drop", "else", "end", "except", "false", "fetch", "for", "foreign", "from", "full", "grant",
    "group", "having", "in", "inner", "insert", "intersect", "into", "is", "join", "leading",
    "left", "like", "limit", "natural", "not", "null", "offset", "on", "only", "or", "order",
    "outer", "primary", "references", "right", "select", "table", "then", "to", "trailing",
    "true", "union", "unique", "update", "user", "using", "when", "where", "window", "with",
];

pub fn is_reserved(ident: &str) -> bool {
    RESERVED_WORDS.binary_search(&ident).is_ok()
}

/// Sanitizes an arbitrary JSON key. Never returns an empty string.
pub fn sanitize(key: &str) -> String {
    let lowered = key.to_ascii_lowercase();
    let mut ident = INVALID_RUN.replace_all(&lowered, "_").into_owned();

    if ident.is_empty() {
        return "_".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if is_reserved(&ident) {
        ident.push('_');
    }

    ident
}

/// Sanitizes a caller-supplied root table or schema name.
pub fn sanitize_name(kind: &str, name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(ConversionError::InvalidName(format!("{} name cannot be empty", kind)));
    }
    Ok(sanitize(name.trim()))
}

/// `<parent>_<key>`
pub fn child_table_name(parent: &str, key: &str) -> String {
    format!("{}_{}", parent, sanitize(key))
}

/// `<parent>_<pk>`
pub fn foreign_key_name(parent: &str, primary_key: &str) -> String {
    format!("{}_{}", parent, primary_key)
}
