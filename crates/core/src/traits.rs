//! Backend seam
//!
//! The network transport, driver manager and SQL execution all live behind
//! these two traits. A [`Driver`] opens sessions; a [`Session`] runs opaque
//! statements and owns the backend side of a transaction.

use crate::config::ConnectOptions;
use crate::error::Result;
use crate::wire::Buffer;

/// Opens sessions against a backend
pub trait Driver: Send + Sync {
    /// Establish a new session, or fail with `Error::Connection`
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Session>>;
}

/// One logical session to the backend
///
/// A session runs in autocommit mode until [`Session::begin`] is called,
/// and returns to autocommit after `commit` or `rollback`.
pub trait Session: Send {
    /// Leave autocommit mode
    fn begin(&mut self) -> Result<()>;

    /// Run a statement, returning the number of affected rows
    fn execute(&mut self, sql: &str, params: &[Buffer]) -> Result<u64>;

    /// Run a query, returning its first row if any
    fn query_row(&mut self, sql: &str, params: &[Buffer]) -> Result<Option<Vec<Buffer>>>;

    /// Make the open transaction's effects durable and visible
    fn commit(&mut self) -> Result<()>;

    /// Discard the open transaction's effects
    fn rollback(&mut self) -> Result<()>;

    /// Release the session; any open transaction is rolled back
    fn close(&mut self) -> Result<()>;
}
