//! Core types for the Actian ODBC layer
//!
//! This crate defines the fundamental types shared by every other crate:
//! - [`TimeOfDay`]: the native `SQL_TIME_STRUCT` and its timestamp codec
//! - [`Value`] / [`FromValue`]: parameter and result values
//! - [`wire::Buffer`]: the bound-buffer image values travel in
//! - [`Error`]: the single error taxonomy
//! - [`ConnectOptions`]: connection configuration
//! - [`Driver`] / [`Session`]: the seam to the statement execution backend

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod value;
pub mod wire;

pub use config::ConnectOptions;
pub use error::{Error, Result};
pub use time::{TimeOfDay, SQL_TIME_STRUCT_SIZE};
pub use traits::{Driver, Session};
pub use value::{FromValue, Value};
pub use wire::{Buffer, CDataType};
