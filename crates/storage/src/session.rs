//! Session bound to an in-process engine

use crate::engine::{Engine, SessionId};
use crate::sql;
use actian_odbc_core::wire::{bind_params, fetch_row};
use actian_odbc_core::{Buffer, Error, Result, Session};
use std::sync::Arc;

/// A [`Session`] against an [`Engine`]
///
/// Parameters arrive as bound buffers and are unmarshalled before
/// execution; result columns are marshalled back the same way, so every
/// value makes the full wire round trip.
pub struct MemorySession {
    engine: Arc<Engine>,
    id: SessionId,
    closed: bool,
}

impl MemorySession {
    /// Open a new session on an engine
    pub fn new(engine: Arc<Engine>) -> Self {
        let id = engine.open_session();
        Self {
            engine,
            id,
            closed: false,
        }
    }

    /// Backend session id
    pub fn id(&self) -> SessionId {
        self.id
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Connection(format!("session {} is closed", self.id)));
        }
        Ok(())
    }
}

impl Session for MemorySession {
    fn begin(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.engine.begin(self.id)
    }

    fn execute(&mut self, sql: &str, params: &[Buffer]) -> Result<u64> {
        self.ensure_open()?;
        let stmt = sql::parse(sql)?;
        let values = fetch_row(params)?;
        self.engine.execute(self.id, &stmt, &values)
    }

    fn query_row(&mut self, sql: &str, params: &[Buffer]) -> Result<Option<Vec<Buffer>>> {
        self.ensure_open()?;
        let stmt = sql::parse(sql)?;
        let values = fetch_row(params)?;
        Ok(self
            .engine
            .query(self.id, &stmt, &values)?
            .map(|row| bind_params(&row)))
    }

    fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.engine.commit(self.id)
    }

    fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.engine.rollback(self.id)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.engine.close_session(self.id);
            self.closed = true;
        }
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
