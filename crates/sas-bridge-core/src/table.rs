//! In-memory labeled tables exchanged with the host namespace.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column label of a [`Table`].
///
/// Hosts may label columns with integers; SAS only accepts names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLabel {
    /// Integer label.
    Index(i64),
    /// String label.
    Name(String),
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for ColumnLabel {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ColumnLabel {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i64> for ColumnLabel {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

/// Two-dimensional labeled table.
///
/// Cells are JSON values: `null` is a missing value, numbers and strings map
/// onto SAS numeric and character variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Ordered column labels.
    pub columns: Vec<ColumnLabel>,
    /// Row-major cell values.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from labels and rows.
    #[must_use]
    pub fn new<L>(columns: impl IntoIterator<Item = L>, rows: Vec<Vec<Value>>) -> Self
    where
        L: Into<ColumnLabel>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Iterate over the cells of one column.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Return a copy whose column labels are all names.
    #[must_use]
    pub fn with_string_labels(&self) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|label| ColumnLabel::Name(label.to_string()))
                .collect(),
            rows: self.rows.clone(),
        }
    }
}

/// A value held in the host namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Labeled table, the only kind that can be exchanged.
    Table(Table),
    /// Anything else.
    Other(Value),
}

impl HostValue {
    /// Borrow the table, if this value is one.
    #[must_use]
    pub const fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            Self::Other(_) => None,
        }
    }

    /// Short type name used in warnings.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Other(Value::Null) => "null",
            Self::Other(Value::Bool(_)) => "bool",
            Self::Other(Value::Number(_)) => "number",
            Self::Other(Value::String(_)) => "string",
            Self::Other(Value::Array(_)) => "list",
            Self::Other(Value::Object(_)) => "dict",
        }
    }
}

impl From<Table> for HostValue {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        Self::Other(value)
    }
}
