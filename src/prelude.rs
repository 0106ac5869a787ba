//! Convenient imports.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```ignore
//! use actian_odbc::prelude::*;
//!
//! let db = Database::ephemeral();
//! let mut conn = db.connect()?;
//! ```

// Main entry point
pub use crate::database::{Database, DatabaseBuilder};

// Error handling
pub use crate::{Error, Result};

// Connections and transactions
pub use crate::{Connection, Queryable, Transaction, TransactionStatus};

// Core types
pub use crate::{ConnectOptions, IsolationMode, TimeOfDay, Value};
