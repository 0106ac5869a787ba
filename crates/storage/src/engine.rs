//! Table store with transaction-scoped write locks
//!
//! One [`Engine`] is one logical database shared by every session
//! connected to it.
//!
//! # Visibility
//!
//! - Committed rows are visible to every session
//! - Rows inserted inside a transaction are visible only to the inserting
//!   session until it commits; rollback discards them
//! - The first transactional insert into a table takes that table's write
//!   lock; it is released when the owning session commits, rolls back or
//!   closes
//!
//! # Waiting
//!
//! Writers always wait for another session's lock on the target table. A
//! reader waits too under [`IsolationMode::Blocking`], so it observes the
//! table only after the writer reaches a terminal state. Under
//! [`IsolationMode::Snapshot`] the reader sees the committed rows without
//! waiting. Either way a reader never observes another session's
//! uncommitted rows. Waits longer than the configured lock timeout fail
//! with `Error::Conflict`.

use crate::sql::{ColumnDef, ColumnType, Expr, Projection, Statement};
use actian_odbc_core::{Error, Result, Value};
use parking_lot::{Condvar, Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Backend-assigned session identifier
pub type SessionId = u64;

/// What a reader does when another session holds a table's write lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationMode {
    /// Wait until the lock holder commits or rolls back
    #[default]
    Blocking,
    /// Read the last committed rows immediately
    Snapshot,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryOptions {
    /// Reader behaviour under a foreign write lock
    pub isolation: IsolationMode,
    /// Longest wait for a table lock before reporting a conflict
    pub lock_timeout: Duration,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            isolation: IsolationMode::Blocking,
            lock_timeout: Duration::from_secs(30),
        }
    }
}

struct Table {
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<Value>>,
    next_id: i64,
}

impl Table {
    fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::Execution(format!("unknown column '{}'", name)))
    }
}

struct PendingInsert {
    table: String,
    row: Vec<Value>,
}

#[derive(Default)]
struct EngineState {
    tables: FxHashMap<String, Table>,
    /// Table name -> session holding its write lock
    locks: FxHashMap<String, SessionId>,
    /// Sessions with an open transaction and their uncommitted inserts
    pending: FxHashMap<SessionId, Vec<PendingInsert>>,
}

/// A logical database
pub struct Engine {
    name: String,
    options: MemoryOptions,
    state: Mutex<EngineState>,
    /// Signalled whenever table locks are released
    released: Condvar,
    next_session: AtomicU64,
}

impl Engine {
    /// Create an empty database
    pub fn new(name: impl Into<String>, options: MemoryOptions) -> Self {
        Self {
            name: name.into(),
            options,
            state: Mutex::new(EngineState::default()),
            released: Condvar::new(),
            next_session: AtomicU64::new(1),
        }
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Engine configuration
    pub fn options(&self) -> MemoryOptions {
        self.options
    }

    /// Allocate a session id
    pub fn open_session(&self) -> SessionId {
        self.next_session.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of committed rows in a table, without waiting on locks
    pub fn committed_rows(&self, table: &str) -> Option<usize> {
        self.state.lock().tables.get(table).map(|t| t.rows.len())
    }

    /// Check whether a session has an open transaction
    pub fn in_transaction(&self, session: SessionId) -> bool {
        self.state.lock().pending.contains_key(&session)
    }

    /// Start a transaction on a session
    pub fn begin(&self, session: SessionId) -> Result<()> {
        let mut state = self.state.lock();
        if state.pending.contains_key(&session) {
            return Err(Error::State(format!(
                "session {} already has an open transaction",
                session
            )));
        }
        state.pending.insert(session, Vec::new());
        Ok(())
    }

    /// Apply a session's pending inserts and release its locks
    pub fn commit(&self, session: SessionId) -> Result<()> {
        let mut state = self.state.lock();
        let inserts = state.pending.remove(&session).ok_or_else(|| {
            Error::State(format!("session {} has no open transaction", session))
        })?;

        let applied = inserts.len();
        for insert in inserts {
            match state.tables.get_mut(&insert.table) {
                Some(table) => table.rows.push(insert.row),
                None => warn!(
                    session,
                    table = %insert.table,
                    "Table dropped before commit, discarding row"
                ),
            }
        }
        self.release_locks(&mut state, session);
        debug!(database = %self.name, session, applied, "Committed");
        Ok(())
    }

    /// Discard a session's pending inserts and release its locks
    pub fn rollback(&self, session: SessionId) -> Result<()> {
        let mut state = self.state.lock();
        let discarded = state
            .pending
            .remove(&session)
            .ok_or_else(|| Error::State(format!("session {} has no open transaction", session)))?
            .len();
        self.release_locks(&mut state, session);
        debug!(database = %self.name, session, discarded, "Rolled back");
        Ok(())
    }

    /// Forget a session, rolling back anything it left open
    pub fn close_session(&self, session: SessionId) {
        let mut state = self.state.lock();
        if let Some(inserts) = state.pending.remove(&session) {
            if !inserts.is_empty() {
                warn!(
                    database = %self.name,
                    session,
                    discarded = inserts.len(),
                    "Session closed with open transaction, rolled back"
                );
            }
        }
        self.release_locks(&mut state, session);
    }

    /// Run a statement, returning the number of affected rows
    pub fn execute(&self, session: SessionId, stmt: &Statement, params: &[Value]) -> Result<u64> {
        check_params(stmt, params)?;
        match stmt {
            Statement::CreateTable { name, columns } => self.create_table(name, columns),
            Statement::DropTable { name } => self.drop_table(session, name),
            Statement::Insert {
                table,
                columns,
                values,
            } => {
                let values = values
                    .iter()
                    .map(|e| e.resolve(params))
                    .collect::<Result<Vec<_>>>()?;
                self.insert(session, table, columns.as_deref(), values)
            }
            Statement::Select { .. } => self.query(session, stmt, params).map(|_| 0),
        }
    }

    /// Run a query, returning its first row
    ///
    /// `COUNT(*)` always produces exactly one row.
    pub fn query(
        &self,
        session: SessionId,
        stmt: &Statement,
        params: &[Value],
    ) -> Result<Option<Vec<Value>>> {
        check_params(stmt, params)?;
        let Statement::Select {
            projection,
            table: table_name,
            filter,
        } = stmt
        else {
            return Err(Error::Execution("statement does not return rows".into()));
        };

        let mut state = self.state.lock();
        require_table(&state, table_name)?;
        if self.options.isolation == IsolationMode::Blocking {
            self.wait_for_lock(&mut state, table_name, session)?;
        }

        let table = state
            .tables
            .get(table_name)
            .ok_or_else(|| no_such_table(table_name))?;

        let filter = match filter {
            Some(f) => Some((table.column_index(&f.column)?, f.value.resolve(params)?)),
            None => None,
        };
        let own_pending = state.pending.get(&session).into_iter().flatten();
        let mut matching = table
            .rows
            .iter()
            .chain(
                own_pending
                    .filter(|p| p.table == *table_name)
                    .map(|p| &p.row),
            )
            .filter(|row| match &filter {
                Some((idx, value)) => !value.is_null() && row[*idx] == *value,
                None => true,
            });

        match projection {
            Projection::CountStar => Ok(Some(vec![Value::Int(matching.count() as i64)])),
            Projection::Columns(names) => {
                let indices = names
                    .iter()
                    .map(|n| table.column_index(n))
                    .collect::<Result<Vec<_>>>()?;
                Ok(matching
                    .next()
                    .map(|row| indices.iter().map(|&i| row[i].clone()).collect()))
            }
        }
    }

    fn create_table(&self, name: &str, columns: &[ColumnDef]) -> Result<u64> {
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::Execution(format!(
                    "duplicate column '{}' in table '{}'",
                    col.name, name
                )));
            }
        }

        let mut state = self.state.lock();
        if state.tables.contains_key(name) {
            return Err(Error::Execution(format!("table '{}' already exists", name)));
        }
        state.tables.insert(
            name.to_string(),
            Table {
                columns: columns.to_vec(),
                rows: Vec::new(),
                next_id: 1,
            },
        );
        debug!(database = %self.name, table = name, "Created table");
        Ok(0)
    }

    fn drop_table(&self, session: SessionId, name: &str) -> Result<u64> {
        let mut state = self.state.lock();
        require_table(&state, name)?;
        self.wait_for_lock(&mut state, name, session)?;

        let state = &mut *state;
        state.tables.remove(name).ok_or_else(|| no_such_table(name))?;
        if state.locks.remove(name).is_some() {
            // Waiters fail fast with "no such table" instead of timing out
            self.released.notify_all();
        }
        if let Some(inserts) = state.pending.get_mut(&session) {
            inserts.retain(|p| p.table != name);
        }
        debug!(database = %self.name, table = name, "Dropped table");
        Ok(0)
    }

    fn insert(
        &self,
        session: SessionId,
        table_name: &str,
        columns: Option<&[String]>,
        values: Vec<Value>,
    ) -> Result<u64> {
        let mut state = self.state.lock();
        require_table(&state, table_name)?;
        self.wait_for_lock(&mut state, table_name, session)?;

        let EngineState {
            tables,
            locks,
            pending,
        } = &mut *state;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| no_such_table(table_name))?;
        let own_pending = pending.get(&session);
        let row = build_row(table, table_name, columns, values, own_pending)?;

        match pending.get_mut(&session) {
            Some(inserts) => {
                locks.insert(table_name.to_string(), session);
                inserts.push(PendingInsert {
                    table: table_name.to_string(),
                    row,
                });
            }
            None => table.rows.push(row),
        }
        Ok(1)
    }

    /// Block until no other session holds the table's write lock
    fn wait_for_lock(
        &self,
        state: &mut MutexGuard<'_, EngineState>,
        table: &str,
        session: SessionId,
    ) -> Result<()> {
        let deadline = Instant::now() + self.options.lock_timeout;
        loop {
            let holder = match state.locks.get(table) {
                Some(&holder) if holder != session => holder,
                _ => return Ok(()),
            };
            debug!(
                database = %self.name,
                table,
                session,
                holder,
                "Waiting for table lock"
            );
            if self.released.wait_until(state, deadline).timed_out()
                && matches!(state.locks.get(table), Some(&h) if h != session)
            {
                return Err(Error::Conflict(format!(
                    "lock timeout after {}ms on table '{}' held by session {}",
                    self.options.lock_timeout.as_millis(),
                    table,
                    holder
                )));
            }
        }
    }

    fn release_locks(&self, state: &mut EngineState, session: SessionId) {
        let before = state.locks.len();
        state.locks.retain(|_, holder| *holder != session);
        if state.locks.len() != before {
            self.released.notify_all();
        }
    }
}

fn no_such_table(name: &str) -> Error {
    Error::Execution(format!("table '{}' does not exist", name))
}

fn require_table(state: &EngineState, name: &str) -> Result<()> {
    if state.tables.contains_key(name) {
        Ok(())
    } else {
        Err(no_such_table(name))
    }
}

fn check_params(stmt: &Statement, params: &[Value]) -> Result<()> {
    let expected = stmt.param_count();
    if params.len() != expected {
        return Err(Error::Execution(format!(
            "statement has {} parameter(s), {} supplied",
            expected,
            params.len()
        )));
    }
    Ok(())
}

/// Lay out and validate one row; the auto-increment counter advances only
/// when the row is accepted
fn build_row(
    table: &mut Table,
    table_name: &str,
    columns: Option<&[String]>,
    values: Vec<Value>,
    own_pending: Option<&Vec<PendingInsert>>,
) -> Result<Vec<Value>> {
    let mut row = vec![Value::Null; table.columns.len()];
    match columns {
        Some(names) => {
            if names.len() != values.len() {
                return Err(Error::Execution(format!(
                    "{} columns named, {} values supplied",
                    names.len(),
                    values.len()
                )));
            }
            for (i, name) in names.iter().enumerate() {
                if names[..i].contains(name) {
                    return Err(Error::Execution(format!(
                        "column '{}' specified more than once",
                        name
                    )));
                }
            }
            for (name, value) in names.iter().zip(values) {
                let idx = table.column_index(name)?;
                row[idx] = value;
            }
        }
        None => {
            if values.len() != table.columns.len() {
                return Err(Error::Execution(format!(
                    "table '{}' has {} columns, {} values supplied",
                    table_name,
                    table.columns.len(),
                    values.len()
                )));
            }
            for (slot, value) in row.iter_mut().zip(values) {
                *slot = value;
            }
        }
    }

    let mut next_id = table.next_id;
    for (idx, col) in table.columns.iter().enumerate() {
        if col.auto_increment {
            match row[idx] {
                Value::Null => {
                    row[idx] = Value::Int(next_id);
                    next_id = next_id.checked_add(1).ok_or_else(|| overflow(col))?;
                }
                Value::Int(n) => {
                    next_id = next_id.max(n.checked_add(1).ok_or_else(|| overflow(col))?)
                }
                _ => {}
            }
        }
        let value = &row[idx];
        if value.is_null() && !col.nullable {
            return Err(Error::Execution(format!(
                "column '{}' cannot be NULL",
                col.name
            )));
        }
        if !col.ty.accepts(value) {
            return Err(Error::Execution(format!(
                "column '{}' is {:?}, got {}",
                col.name,
                col.ty,
                value.type_name()
            )));
        }
        if let (ColumnType::Varchar(Some(max)), Value::String(s)) = (col.ty, value) {
            if s.chars().count() > max {
                return Err(Error::Execution(format!(
                    "value too long for column '{}' (max {})",
                    col.name, max
                )));
            }
        }
        if col.primary_key {
            let pending_rows = own_pending
                .into_iter()
                .flatten()
                .filter(|p| p.table == table_name)
                .map(|p| &p.row);
            if table.rows.iter().chain(pending_rows).any(|r| r[idx] == *value) {
                return Err(Error::Execution(format!(
                    "duplicate key {} for column '{}'",
                    value, col.name
                )));
            }
        }
    }
    table.next_id = next_id;
    Ok(row)
}

fn overflow(col: &ColumnDef) -> Error {
    Error::Execution(format!("auto-increment overflow on column '{}'", col.name))
}
