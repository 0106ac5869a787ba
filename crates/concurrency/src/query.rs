//! Statement execution surface shared by connections and transactions

use actian_odbc_core::{Error, FromValue, Result, Value};

/// Something statements can run against
pub trait Queryable {
    /// Run a statement, returning the number of affected rows
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Run a query and return its first row, or `Error::NoRows`
    fn query_row(&mut self, sql: &str, params: &[Value]) -> Result<Row>;

    /// Run a query and scan the first column of its first row
    fn query_scalar<T: FromValue>(&mut self, sql: &str, params: &[Value]) -> Result<T>
    where
        Self: Sized,
    {
        self.query_row(sql, params)?.get(0)
    }
}

/// One fetched result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Wrap fetched column values
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Scan one column
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.values.get(index).cloned().ok_or_else(|| {
            Error::Execution(format!(
                "column {} out of range ({} columns)",
                index,
                self.values.len()
            ))
        })?;
        T::from_value(value)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw column values
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
