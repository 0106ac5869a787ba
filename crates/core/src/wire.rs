//! Bound-buffer wire format
//!
//! Values cross the session boundary the way ODBC binds them: a C data type
//! code, a length/indicator, and a raw byte buffer. Integers travel as
//! native-endian `SQLBIGINT`, character data as UTF-8, and time-of-day as
//! the 6-byte `SQL_TIME_STRUCT` image.

use crate::error::{Error, Result};
use crate::time::TimeOfDay;
use crate::value::Value;
use byteorder::{ByteOrder, NativeEndian};

/// Length/indicator value marking SQL NULL
pub const SQL_NULL_DATA: isize = -1;

/// ODBC C data type codes used for binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum CDataType {
    /// `SQL_C_CHAR`
    Char = 1,
    /// `SQL_C_SBIGINT`
    SBigInt = -25,
    /// `SQL_C_TYPE_TIME`
    TypeTime = 92,
}

impl CDataType {
    /// The raw ODBC type code
    pub fn code(self) -> i16 {
        self as i16
    }

    /// Look up a type from its ODBC code
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(CDataType::Char),
            -25 => Some(CDataType::SBigInt),
            92 => Some(CDataType::TypeTime),
            _ => None,
        }
    }
}

/// A bound parameter or fetched column buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    /// C type of `data`
    pub c_type: CDataType,
    /// Byte length of `data`, or [`SQL_NULL_DATA`]
    pub indicator: isize,
    /// Raw value bytes
    pub data: Vec<u8>,
}

impl Buffer {
    /// A NULL buffer of the given type
    pub fn null(c_type: CDataType) -> Self {
        Self {
            c_type,
            indicator: SQL_NULL_DATA,
            data: Vec::new(),
        }
    }

    /// Check if this buffer carries SQL NULL
    pub fn is_null(&self) -> bool {
        self.indicator == SQL_NULL_DATA
    }

    /// Marshal a value into its bound form
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::null(CDataType::Char),
            Value::Int(n) => {
                let mut data = vec![0u8; 8];
                NativeEndian::write_i64(&mut data, *n);
                Self::with_data(CDataType::SBigInt, data)
            }
            Value::String(s) => Self::with_data(CDataType::Char, s.as_bytes().to_vec()),
            Value::Time(t) => Self::with_data(CDataType::TypeTime, t.to_bytes().to_vec()),
        }
    }

    /// Unmarshal the bound form back into a value
    pub fn to_value(&self) -> Result<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        if self.indicator < 0 || self.indicator as usize != self.data.len() {
            return Err(Error::Execution(format!(
                "buffer indicator {} does not match {} data bytes",
                self.indicator,
                self.data.len()
            )));
        }
        match self.c_type {
            CDataType::SBigInt => {
                if self.data.len() != 8 {
                    return Err(Error::Execution(format!(
                        "SQL_C_SBIGINT needs 8 bytes, got {}",
                        self.data.len()
                    )));
                }
                Ok(Value::Int(NativeEndian::read_i64(&self.data)))
            }
            CDataType::Char => String::from_utf8(self.data.clone())
                .map(Value::String)
                .map_err(|e| Error::Execution(format!("invalid character data: {}", e))),
            CDataType::TypeTime => TimeOfDay::from_bytes(&self.data).map(Value::Time),
        }
    }

    fn with_data(c_type: CDataType, data: Vec<u8>) -> Self {
        Self {
            c_type,
            indicator: data.len() as isize,
            data,
        }
    }
}

/// Marshal a parameter list
pub fn bind_params(params: &[Value]) -> Vec<Buffer> {
    params.iter().map(Buffer::from_value).collect()
}

/// Unmarshal a fetched row
pub fn fetch_row(buffers: &[Buffer]) -> Result<Vec<Value>> {
    buffers.iter().map(Buffer::to_value).collect()
}
