//! Caller-owned connection

use crate::coordinator::{ConnectionId, TransactionCoordinator, TxnId};
use crate::query::{Queryable, Row};
use crate::transaction::Transaction;
use actian_odbc_core::wire::{bind_params, fetch_row};
use actian_odbc_core::{ConnectOptions, Driver, Error, Result, Session, Value};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// State shared between a connection and its transactions
pub(crate) struct ConnectionInner {
    pub(crate) id: ConnectionId,
    pub(crate) session: Mutex<Box<dyn Session>>,
    /// Transaction currently holding the connection
    pub(crate) slot: Mutex<Option<TxnId>>,
    /// Statement accounting
    stats: Arc<TransactionCoordinator>,
}

impl ConnectionInner {
    pub(crate) fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let _stmt = self.stats.statement();
        self.session.lock().execute(sql, &bind_params(params))
    }

    pub(crate) fn query_row(&self, sql: &str, params: &[Value]) -> Result<Row> {
        let _stmt = self.stats.statement();
        let buffers = self
            .session
            .lock()
            .query_row(sql, &bind_params(params))?
            .ok_or(Error::NoRows)?;
        Ok(Row::new(fetch_row(&buffers)?))
    }
}

/// One logical session to the backend
///
/// Statements run in autocommit mode unless issued through a
/// [`Transaction`] from [`Connection::begin`]. The session is closed when
/// the connection is dropped, rolling back anything left open.
pub struct Connection {
    inner: Arc<ConnectionInner>,
    coordinator: Arc<TransactionCoordinator>,
    closed: bool,
}

impl Connection {
    /// Open a session through a driver
    ///
    /// Any failure is reported as `Error::Connection`.
    pub fn open(
        driver: &dyn Driver,
        options: &ConnectOptions,
        coordinator: Arc<TransactionCoordinator>,
    ) -> Result<Self> {
        let session = driver.connect(options).map_err(|e| match e {
            Error::Connection(_) => e,
            other => Error::Connection(other.to_string()),
        })?;
        let id = coordinator.next_connection_id();
        coordinator.connection_opened();
        debug!(connection = id, database = %options.database, "Connection opened");
        Ok(Self {
            inner: Arc::new(ConnectionInner {
                id,
                session: Mutex::new(session),
                slot: Mutex::new(None),
                stats: Arc::clone(&coordinator),
            }),
            coordinator,
            closed: false,
        })
    }

    /// Connection id
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Id of the transaction holding this connection, if any
    pub fn active_transaction(&self) -> Option<TxnId> {
        *self.inner.slot.lock()
    }

    /// Start a transaction
    ///
    /// Fails with `Error::State` while another transaction on this
    /// connection is active.
    pub fn begin(&mut self) -> Result<Transaction> {
        self.ensure_open()?;
        self.coordinator.begin(&self.inner)
    }

    /// Close the session
    ///
    /// Refused while a transaction is active; finish it first.
    pub fn close(&mut self) -> Result<()> {
        if let Some(txn) = self.active_transaction() {
            return Err(Error::State(format!(
                "connection {} cannot close while transaction {} is active",
                self.inner.id, txn
            )));
        }
        self.close_session()
    }

    fn close_session(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.coordinator.connection_closed();
        debug!(connection = self.inner.id, "Connection closed");
        self.inner.session.lock().close()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Connection(format!(
                "connection {} is closed",
                self.inner.id
            )));
        }
        Ok(())
    }

    fn ensure_available(&self) -> Result<()> {
        self.ensure_open()?;
        if let Some(txn) = self.active_transaction() {
            return Err(Error::State(format!(
                "connection {} is held by active transaction {}",
                self.inner.id, txn
            )));
        }
        Ok(())
    }
}

impl Queryable for Connection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.ensure_available()?;
        self.inner.execute(sql, params)
    }

    fn query_row(&mut self, sql: &str, params: &[Value]) -> Result<Row> {
        self.ensure_available()?;
        self.inner.query_row(sql, params)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("active_transaction", &self.active_transaction())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.close_session() {
            warn!(connection = self.inner.id, error = %e, "Close on drop failed");
        }
    }
}
