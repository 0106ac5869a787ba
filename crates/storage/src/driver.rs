//! Driver over named in-process databases

use crate::engine::{Engine, MemoryOptions};
use crate::session::MemorySession;
use actian_odbc_core::{ConnectOptions, Driver, Error, Result, Session};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// A [`Driver`] whose databases live in this process
///
/// Connections naming the same database share one [`Engine`]. Databases
/// are created on first connect.
pub struct MemoryDriver {
    databases: DashMap<String, Arc<Engine>>,
    options: MemoryOptions,
    accepting: AtomicBool,
}

impl MemoryDriver {
    /// Create a driver with default engine options
    pub fn new() -> Self {
        Self::with_options(MemoryOptions::default())
    }

    /// Create a driver whose databases use the given options
    pub fn with_options(options: MemoryOptions) -> Self {
        Self {
            databases: DashMap::new(),
            options,
            accepting: AtomicBool::new(true),
        }
    }

    /// Get or create the engine for a database
    pub fn engine(&self, database: &str) -> Arc<Engine> {
        let entry = self
            .databases
            .entry(database.to_string())
            .or_insert_with(|| {
                info!(database, "Creating in-process database");
                Arc::new(Engine::new(database, self.options))
            });
        Arc::clone(entry.value())
    }

    /// Refuse all further connections
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MemoryDriver {
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Session>> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(Error::Connection("server is not accepting connections".into()));
        }
        if options.database.is_empty() {
            return Err(Error::Connection("no database specified".into()));
        }
        Ok(Box::new(MemorySession::new(self.engine(&options.database))))
    }
}
