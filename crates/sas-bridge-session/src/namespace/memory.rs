//! In-memory host namespace.

use std::collections::HashMap;

use sas_bridge_core::{HostValue, Namespace, Table};

/// In-memory namespace implementation.
///
/// Useful for hosts that keep no variables of their own, and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryNamespace {
    values: HashMap<String, HostValue>,
}

impl MemoryNamespace {
    /// Create an empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store imported tables under their result keys.
    pub fn insert_tables(&mut self, tables: impl IntoIterator<Item = (String, Table)>) {
        for (name, table) in tables {
            self.values.insert(name, HostValue::Table(table));
        }
    }

    /// Borrow a table variable.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.values.get(name).and_then(HostValue::as_table)
    }

    /// Remove a variable.
    pub fn remove(&mut self, name: &str) -> Option<HostValue> {
        self.values.remove(name)
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the namespace is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Namespace for MemoryNamespace {
    fn get(&self, name: &str) -> Option<&HostValue> {
        self.values.get(name)
    }

    fn insert(&mut self, name: String, value: HostValue) {
        self.values.insert(name, value);
    }
}
