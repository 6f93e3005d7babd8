use serde::{Deserialize, Serialize};
use std::fmt;

/// Column datatype inferred from observed JSON scalars.
///
/// The variants form a join semilattice: numbers widen along
/// `Integer < BigInt < Double`, `VarChar(n)` grows with the longest string
/// seen, and values from different families meet at `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Integer,
    BigInt,
    Double,
    Boolean,
    VarChar(u32),
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Numeric,
    Boolean,
    Character,
}

impl SqlType {
    pub fn family(self) -> TypeFamily {
        match self {
            Self::Integer | Self::BigInt | Self::Double => TypeFamily::Numeric,
            Self::Boolean => TypeFamily::Boolean,
            Self::VarChar(_) | Self::Text => TypeFamily::Character,
        }
    }

    /// Least upper bound of two types. Never narrower than either input.
    pub fn join(self, other: Self) -> Self {
        if self.family() != other.family() {
            return Self::Text;
        }

        match (self, other) {
            (Self::VarChar(a), Self::VarChar(b)) => Self::VarChar(a.max(b)),
            (Self::Text, _) | (_, Self::Text) => Self::Text,
            (Self::Boolean, Self::Boolean) => Self::Boolean,
            (a, b) => {
                if a.numeric_rank() >= b.numeric_rank() {
                    a
                } else {
                    b
                }
            }
        }
    }

    /// True when joining the two types crosses type families.
    pub fn conflicts_with(self, other: Self) -> bool {
        self.family() != other.family()
    }

    pub fn precision(self) -> Option<u32> {
        match self {
            Self::VarChar(n) => Some(n),
            _ => None,
        }
    }

    /// SQL name without precision.
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE PRECISION",
            Self::Boolean => "BOOLEAN",
            Self::VarChar(_) => "VARCHAR",
            Self::Text => "TEXT",
        }
    }

    fn numeric_rank(self) -> u8 {
        match self {
            Self::Integer => 0,
            Self::BigInt => 1,
            Self::Double => 2,
            _ => u8::MAX,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision() {
            Some(n) => write!(f, "{}({})", self.sql_name(), n),
            None => write!(f, "{}", self.sql_name()),
        }
    }
}

/// Why a column exists in its table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    PrimaryKey,
    /// Links each row to a row of the parent table, named by qualified name.
    ForeignKey { references: String },
    /// Holds the scalars found under `key` in the source objects.
    Field { key: String },
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryKey => write!(f, "the primary key"),
            Self::ForeignKey { references } => write!(f, "the foreign key to '{}'", references),
            Self::Field { key } => write!(f, "key '{}'", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub default_value: Option<String>,
    pub role: ColumnRole,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType, role: ColumnRole) -> Self {
        Self {
            name: name.into(),
            sql_type,
            default_value: None,
            role,
        }
    }

    pub fn primary_key(name: impl Into<String>) -> Self {
        Self::new(name, SqlType::Integer, ColumnRole::PrimaryKey)
    }

    pub fn foreign_key(name: impl Into<String>, sql_type: SqlType, references: impl Into<String>) -> Self {
        Self::new(
            name,
            sql_type,
            ColumnRole::ForeignKey {
                references: references.into(),
            },
        )
    }

    pub fn field(name: impl Into<String>, sql_type: SqlType, key: impl Into<String>) -> Self {
        Self::new(name, sql_type, ColumnRole::Field { key: key.into() })
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn precision(&self) -> Option<u32> {
        self.sql_type.precision()
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.role, ColumnRole::PrimaryKey)
    }

    /// `name TYPE[(n)][ DEFAULT '...']`
    pub fn definition(&self) -> String {
        let default = self
            .default_value
            .as_ref()
            .map(|v| format!(" DEFAULT '{}'", v.replace('\'', "''")))
            .unwrap_or_default();

        format!("{} {}{}", self.name, self.sql_type, default)
    }
}

/// A child-to-parent link, as seen from the child table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey<'a> {
    pub column: &'a str,
    pub references: &'a str,
}
