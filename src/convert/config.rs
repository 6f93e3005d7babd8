use serde::Deserialize;
use std::collections::BTreeMap;

/// Knobs for schema inference.
///
/// Defaults follow common PostgreSQL usage: 32-bit `INTEGER`, no length cap on
/// `VARCHAR`, foreign keys rendered as `REFERENCES` constraints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Name of the generated identity column of every table
    pub primary_key: String,

    /// Inclusive range of integers kept as `INTEGER`; outside it they become `BIGINT`
    pub integer_range: (i64, i64),

    /// Strings longer than this turn the column into `TEXT`
    pub max_varchar_length: Option<u32>,

    /// Fail on a numeric/non-numeric clash instead of widening to `TEXT`
    pub strict_types: bool,

    /// Render `REFERENCES parent (id)` on foreign key columns
    pub foreign_key_constraints: bool,

    /// Default values keyed by column name
    pub defaults: BTreeMap<String, String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            integer_range: (i32::MIN as i64, i32::MAX as i64),
            max_varchar_length: None,
            strict_types: false,
            foreign_key_constraints: true,
            defaults: BTreeMap::new(),
        }
    }
}

impl ConversionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identity column name
    pub fn primary_key(mut self, name: &str) -> Self {
        self.primary_key = name.to_string();
        self
    }

    /// Set the range kept as `INTEGER`
    pub fn integer_range(mut self, min: i64, max: i64) -> Self {
        self.integer_range = (min, max);
        self
    }

    /// Cap `VARCHAR` precision
    pub fn max_varchar_length(mut self, len: u32) -> Self {
        self.max_varchar_length = Some(len);
        self
    }

    pub fn strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }

    pub fn foreign_key_constraints(mut self, enabled: bool) -> Self {
        self.foreign_key_constraints = enabled;
        self
    }

    /// Add a `DEFAULT` for every column with this name
    pub fn default_value(mut self, column: &str, value: &str) -> Self {
        self.defaults.insert(column.to_string(), value.to_string());
        self
    }

    pub fn fits_integer(&self, n: i64) -> bool {
        let (min, max) = self.integer_range;
        n >= min && n <= max
    }

    /// Parse from a JSON document; missing fields keep their defaults.
    ///
    /// ```
    /// # use jsonrel::ConversionConfig;
    /// let config = ConversionConfig::from_json(r#"{"strict_types": true}"#).unwrap();
    /// assert!(config.strict_types);
    /// assert_eq!(config.primary_key, "id");
    /// ```
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
