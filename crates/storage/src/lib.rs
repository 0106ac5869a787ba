//! In-process backend for the Actian ODBC layer
//!
//! This crate stands in for the database server behind the driver manager:
//! - `sql`: tokenizer and parser for the statement subset the layer issues
//! - `engine`: tables, table-level write locks, commit/rollback
//! - `session`: a `Session` bound to one engine
//! - `driver`: registry of named databases implementing `Driver`
//!
//! Reads of a table write-locked by another session either wait for that
//! session to finish ([`IsolationMode::Blocking`]) or see the last committed
//! rows ([`IsolationMode::Snapshot`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod driver;
pub mod engine;
pub mod session;
pub mod sql;

pub use driver::MemoryDriver;
pub use engine::{Engine, IsolationMode, MemoryOptions, SessionId};
pub use session::MemorySession;
