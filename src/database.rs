//! Main entry point.
//!
//! This module provides the `Database` struct, which owns the driver,
//! the connection options and the transaction coordinator, and hands out
//! caller-owned connections.

use crate::worker::WorkerHandle;
use actian_odbc_concurrency::{Connection, CoordinatorMetrics, TransactionCoordinator};
use actian_odbc_core::{ConnectOptions, Driver, Result};
use actian_odbc_storage::{IsolationMode, MemoryDriver, MemoryOptions};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// A data source that hands out connections.
///
/// Create one with [`Database::new`], [`Database::ephemeral`] or
/// [`Database::builder`]. Cloning is cheap; clones share the driver and
/// the coordinator.
///
/// # Example
///
/// ```ignore
/// use actian_odbc::prelude::*;
///
/// let db = Database::ephemeral();
/// let mut conn = db.connect()?;
/// conn.execute("create table txn_tst (name varchar(20))", &[])?;
///
/// let mut tx = conn.begin()?;
/// tx.execute("insert into txn_tst (name) values ('tx1')", &[])?;
/// tx.commit()?;
/// ```
#[derive(Clone)]
pub struct Database {
    driver: Arc<dyn Driver>,
    options: ConnectOptions,
    coordinator: Arc<TransactionCoordinator>,
}

impl Database {
    /// Use the given driver and options.
    ///
    /// No session is opened until [`Database::connect`].
    pub fn new(driver: Arc<dyn Driver>, options: ConnectOptions) -> Self {
        Self {
            driver,
            options,
            coordinator: Arc::new(TransactionCoordinator::new()),
        }
    }

    /// Create a database backed by a fresh in-process driver.
    ///
    /// Uses default options: blocking reads, 30s lock timeout.
    pub fn ephemeral() -> Self {
        Self::builder().open()
    }

    /// Create a builder for database configuration.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Open a new connection.
    ///
    /// Fails with `Error::Connection` if no session can be established.
    pub fn connect(&self) -> Result<Connection> {
        info!(
            "Connecting: {}",
            self.options.redacted_connection_string()
        );
        Connection::open(
            &*self.driver,
            &self.options,
            Arc::clone(&self.coordinator),
        )
    }

    /// Run `f` on a fresh connection that is closed on every exit path.
    ///
    /// An error from `f` takes precedence over an error closing the
    /// connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.connect()?;
        let result = f(&mut conn);
        let closed = conn.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Run `f` on its own thread with its own connection.
    ///
    /// The result comes back through [`WorkerHandle::wait`].
    pub fn spawn_worker<T, F>(&self, f: F) -> WorkerHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        let (tx, rx) = mpsc::sync_channel(1);
        let thread = thread::spawn(move || {
            let _ = tx.send(db.with_connection(f));
        });
        WorkerHandle::new(rx, thread)
    }

    /// Connection options in use.
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Transaction counters.
    pub fn metrics(&self) -> CoordinatorMetrics {
        self.coordinator.metrics()
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// // Readers see committed rows instead of waiting on writers
/// let db = Database::builder()
///     .database("txn_demo")
///     .isolation(IsolationMode::Snapshot)
///     .open();
///
/// // A custom driver; isolation and lock timeout are then its concern
/// let db = Database::builder()
///     .driver(my_driver)
///     .options(ConnectOptions::from_env())
///     .open();
/// ```
pub struct DatabaseBuilder {
    options: ConnectOptions,
    memory: MemoryOptions,
    driver: Option<Arc<dyn Driver>>,
}

impl DatabaseBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            options: ConnectOptions::default(),
            memory: MemoryOptions::default(),
            driver: None,
        }
    }

    /// Replace all connection options.
    pub fn options(mut self, options: ConnectOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.options = self.options.database(database);
        self
    }

    /// Reader behaviour of the in-process backend.
    pub fn isolation(mut self, isolation: IsolationMode) -> Self {
        self.memory.isolation = isolation;
        self
    }

    /// Lock wait limit of the in-process backend.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.memory.lock_timeout = timeout;
        self
    }

    /// Use an external driver instead of the in-process backend.
    pub fn driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Build the database.
    pub fn open(self) -> Database {
        let memory = self.memory;
        let driver = self
            .driver
            .unwrap_or_else(|| Arc::new(MemoryDriver::with_options(memory)) as Arc<dyn Driver>);
        Database::new(driver, self.options)
    }
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
