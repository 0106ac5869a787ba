//! Transaction handle

use crate::connection::ConnectionInner;
use crate::coordinator::{ConnectionId, TransactionCoordinator, TxnId};
use crate::query::{Queryable, Row};
use actian_odbc_core::{Error, Result, Value};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Committed`
/// - `Active` → `RolledBack`
///
/// Terminal states (no transitions allowed):
/// - `Committed`
/// - `RolledBack`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Statements may run
    Active,
    /// Effects are durable and visible to every connection
    Committed,
    /// Effects were discarded
    RolledBack,
}

impl TransactionStatus {
    /// Check if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Active)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Active => f.write_str("active"),
            TransactionStatus::Committed => f.write_str("committed"),
            TransactionStatus::RolledBack => f.write_str("rolled back"),
        }
    }
}

/// An open unit of work on one connection
///
/// While `Active` the transaction holds its connection exclusively:
/// autocommit statements on that connection are refused until it commits
/// or rolls back. Operations take `&mut self`, so one handle never runs
/// two statements at once.
///
/// Dropping an `Active` transaction rolls it back.
pub struct Transaction {
    id: TxnId,
    status: TransactionStatus,
    conn: Arc<ConnectionInner>,
    coordinator: Arc<TransactionCoordinator>,
}

impl Transaction {
    pub(crate) fn new(
        id: TxnId,
        conn: Arc<ConnectionInner>,
        coordinator: Arc<TransactionCoordinator>,
    ) -> Self {
        Self {
            id,
            status: TransactionStatus::Active,
            conn,
            coordinator,
        }
    }

    /// Transaction id
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Current status
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Id of the owning connection
    pub fn connection_id(&self) -> ConnectionId {
        self.conn.id
    }

    /// Make all statements durable and visible to every connection
    pub fn commit(&mut self) -> Result<()> {
        let coordinator = Arc::clone(&self.coordinator);
        coordinator.commit(self)
    }

    /// Discard all statements run in this transaction
    pub fn rollback(&mut self) -> Result<()> {
        let coordinator = Arc::clone(&self.coordinator);
        coordinator.rollback(self)
    }

    pub(crate) fn connection(&self) -> &ConnectionInner {
        &self.conn
    }

    pub(crate) fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
    }

    pub(crate) fn ensure_active(&self, operation: &str) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::State(format!(
                "cannot {} transaction {}: already {}",
                operation, self.id, self.status
            )));
        }
        Ok(())
    }
}

impl Queryable for Transaction {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.ensure_active("execute in")?;
        self.conn.execute(sql, params)
    }

    fn query_row(&mut self, sql: &str, params: &[Value]) -> Result<Row> {
        self.ensure_active("query in")?;
        self.conn.query_row(sql, params)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("connection", &self.conn.id)
            .field("status", &self.status)
            .finish()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.status == TransactionStatus::Active {
            warn!(
                connection = self.conn.id,
                txn = self.id,
                "Active transaction dropped, rolling back"
            );
            if let Err(e) = self.rollback() {
                warn!(txn = self.id, error = %e, "Rollback on drop failed");
                let coordinator = Arc::clone(&self.coordinator);
                coordinator.abandon(self);
            }
        }
    }
}
