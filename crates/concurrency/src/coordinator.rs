//! Transaction coordinator
//!
//! Enforces the transaction state machine and connection exclusivity:
//!
//! ```text
//! begin()    - reserve the connection's slot, open the backend transaction
//! commit()   - Active -> Committed, release the slot
//! rollback() - Active -> RolledBack, release the slot
//! ```
//!
//! `begin` is the only way into `Active`. Terminal states have no
//! outgoing transitions, so a second commit or rollback fails with
//! `Error::State`.
//!
//! A statement error inside a transaction leaves it `Active`; so does a
//! commit or rollback the backend refuses. Recovery is always the
//! caller's explicit decision.

use crate::connection::ConnectionInner;
use crate::transaction::{Transaction, TransactionStatus};
use actian_odbc_core::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Connection identifier, unique per coordinator
pub type ConnectionId = u64;

/// Transaction identifier, unique per coordinator
pub type TxnId = u64;

/// Snapshot of coordinator counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorMetrics {
    /// Transactions started
    pub begun: u64,
    /// Transactions committed
    pub committed: u64,
    /// Transactions rolled back (explicitly or on drop)
    pub rolled_back: u64,
    /// Transactions currently active
    pub active: u64,
    /// Connections opened and not yet closed
    pub open_connections: u64,
    /// Statements currently executing on the backend
    pub open_statements: u64,
}

/// Coordinates transaction lifecycles across connections
pub struct TransactionCoordinator {
    next_connection_id: AtomicU64,
    next_txn_id: AtomicU64,
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    open_connections: AtomicU64,
    open_statements: AtomicU64,
}

/// Counts one statement as open until dropped
pub(crate) struct StatementGuard<'a> {
    open: &'a AtomicU64,
}

impl Drop for StatementGuard<'_> {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TransactionCoordinator {
    /// Create a coordinator with fresh id counters
    pub fn new() -> Self {
        Self {
            next_connection_id: AtomicU64::new(1),
            next_txn_id: AtomicU64::new(1),
            begun: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            rolled_back: AtomicU64::new(0),
            open_connections: AtomicU64::new(0),
            open_statements: AtomicU64::new(0),
        }
    }

    /// Current counters
    pub fn metrics(&self) -> CoordinatorMetrics {
        let begun = self.begun.load(Ordering::SeqCst);
        let committed = self.committed.load(Ordering::SeqCst);
        let rolled_back = self.rolled_back.load(Ordering::SeqCst);
        CoordinatorMetrics {
            begun,
            committed,
            rolled_back,
            active: begun.saturating_sub(committed + rolled_back),
            open_connections: self.open_connections.load(Ordering::SeqCst),
            open_statements: self.open_statements.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn connection_opened(&self) {
        self.open_connections.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn connection_closed(&self) {
        self.open_connections.fetch_sub(1, Ordering::SeqCst);
    }

    /// Mark a statement open for the guard's lifetime
    pub(crate) fn statement(&self) -> StatementGuard<'_> {
        self.open_statements.fetch_add(1, Ordering::SeqCst);
        StatementGuard {
            open: &self.open_statements,
        }
    }

    pub(crate) fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Start a transaction holding the connection exclusively
    ///
    /// Fails with `Error::State` if the connection already has an active
    /// transaction. Backend errors propagate and leave the slot empty.
    pub(crate) fn begin(self: &Arc<Self>, conn: &Arc<ConnectionInner>) -> Result<Transaction> {
        let mut slot = conn.slot.lock();
        if let Some(active) = *slot {
            return Err(Error::State(format!(
                "connection {} already has active transaction {}",
                conn.id, active
            )));
        }

        conn.session.lock().begin()?;

        let id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        *slot = Some(id);
        self.begun.fetch_add(1, Ordering::SeqCst);
        debug!(connection = conn.id, txn = id, "Transaction started");

        Ok(Transaction::new(id, Arc::clone(conn), Arc::clone(self)))
    }

    /// Active -> Committed
    pub(crate) fn commit(&self, txn: &mut Transaction) -> Result<()> {
        txn.ensure_active("commit")?;
        txn.connection().session.lock().commit()?;

        txn.set_status(TransactionStatus::Committed);
        self.release(txn);
        self.committed.fetch_add(1, Ordering::SeqCst);
        debug!(
            connection = txn.connection_id(),
            txn = txn.id(),
            "Transaction committed"
        );
        Ok(())
    }

    /// Active -> RolledBack
    pub(crate) fn rollback(&self, txn: &mut Transaction) -> Result<()> {
        txn.ensure_active("roll back")?;
        txn.connection().session.lock().rollback()?;

        txn.set_status(TransactionStatus::RolledBack);
        self.release(txn);
        self.rolled_back.fetch_add(1, Ordering::SeqCst);
        debug!(
            connection = txn.connection_id(),
            txn = txn.id(),
            "Transaction rolled back"
        );
        Ok(())
    }

    /// Mark a transaction rolled back without the backend's agreement
    ///
    /// Used only when a dropped transaction cannot be rolled back, so the
    /// connection slot does not stay reserved forever.
    pub(crate) fn abandon(&self, txn: &mut Transaction) {
        txn.set_status(TransactionStatus::RolledBack);
        self.release(txn);
        self.rolled_back.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self, txn: &Transaction) {
        let mut slot = txn.connection().slot.lock();
        if *slot == Some(txn.id()) {
            *slot = None;
        }
    }
}

impl Default for TransactionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
