//! Reading rows for a built [`SelectQuery`].

#[cfg(feature = "rusqlite")]
mod sqlite;

use std::sync::Arc;

use crate::error::{PlanError, Result};
use crate::sql::SelectQuery;
use crate::value::Value;

/// One result row, cells in select-column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The cell at `index`, failing if the row is narrower than the query.
    pub fn value(&self, index: usize) -> Result<&Value> {
        self.values.get(index).ok_or_else(|| {
            PlanError::Storage(format!(
                "row has {} columns, column {index} was selected",
                self.values.len()
            ))
        })
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Executes a select and returns every row. Blocking.
pub trait StorageReader {
    fn execute_select(&self, query: &SelectQuery) -> Result<Vec<Row>>;
}

impl<T: StorageReader + ?Sized> StorageReader for &T {
    fn execute_select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        (**self).execute_select(query)
    }
}

impl<T: StorageReader + ?Sized> StorageReader for Arc<T> {
    fn execute_select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        (**self).execute_select(query)
    }
}
