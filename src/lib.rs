//! # actian-odbc
//!
//! Transaction coordination and time-of-day marshaling for ODBC access to
//! Actian (Ingres/Avalanche) databases.
//!
//! ## Quick Start
//!
//! ```ignore
//! use actian_odbc::prelude::*;
//!
//! let db = Database::ephemeral();
//! let mut conn = db.connect()?;
//! conn.execute("create table txn_tst (name varchar(20))", &[])?;
//!
//! let mut tx = conn.begin()?;
//! tx.execute("insert into txn_tst (name) values ('tx1')", &[])?;
//! let n: i64 = tx.query_scalar("select count(*) from txn_tst", &[])?;
//! tx.commit()?;
//! ```
//!
//! ## Pieces
//!
//! - [`TimeOfDay`] - the `SQL_TIME_STRUCT` codec: hour/minute/second only
//! - [`Connection`] / [`Transaction`] - begin/commit/rollback with exclusive
//!   hold on the connection while a transaction is active
//! - [`Database`] - hands out connections and runs workers on their own
//!   connections
//! - [`MemoryDriver`] - in-process backend with blocking or snapshot reads

#![warn(missing_docs)]

mod database;
mod worker;

pub mod prelude;

// Re-export main entry points
pub use database::{Database, DatabaseBuilder};
pub use worker::WorkerHandle;

// Re-export core types
pub use actian_odbc_core::{
    Buffer, CDataType, ConnectOptions, Driver, Error, FromValue, Result, Session, TimeOfDay,
    Value, SQL_TIME_STRUCT_SIZE,
};

// Re-export coordinator types
pub use actian_odbc_concurrency::{
    Connection, ConnectionId, CoordinatorMetrics, Queryable, Row, Transaction,
    TransactionStatus, TxnId,
};

// Re-export the in-process backend
pub use actian_odbc_storage::{IsolationMode, MemoryDriver, MemoryOptions};
