//! Concurrency layer for the Actian ODBC layer
//!
//! This crate implements the transaction coordinator:
//! - Connection: caller-owned session, autocommit by default
//! - Transaction: Active → Committed | RolledBack, exclusive hold on its connection
//! - TransactionCoordinator: id allocation, state transitions, metrics
//!
//! Isolation between connections is the backend's job. The coordinator
//! only guarantees that a transaction's statements go through its own
//! session and that the connection does nothing else while it is active.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod coordinator;
pub mod query;
pub mod transaction;

pub use connection::Connection;
pub use coordinator::{ConnectionId, CoordinatorMetrics, TransactionCoordinator, TxnId};
pub use query::{Queryable, Row};
pub use transaction::{Transaction, TransactionStatus};
