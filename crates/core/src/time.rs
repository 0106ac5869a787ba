//! Time-of-day codec
//!
//! [`TimeOfDay`] mirrors ODBC's `SQL_TIME_STRUCT`: three unsigned 16-bit
//! fields for hour, minute and second. There is no date, no fractional
//! second and no zone on the wire.
//!
//! Converting a timestamp to a `TimeOfDay` keeps only its wall-clock
//! hour/minute/second. Converting back anchors the wall clock at
//! 0001-01-01 in the target zone with a zero sub-second part, so two
//! timestamps compare equal after a round trip exactly when their
//! wall-clock hour/minute/second match.
//!
//! ## Zone offsets
//!
//! Decoding into [`Local`] uses whatever offset the local zone had on the
//! reference date (often local mean time for year 1), not the offset in
//! force today. The result is stable on one machine but differs between
//! machines with different zone settings. Use [`TimeOfDay::decode_in`] with
//! a fixed zone when results must be comparable across machines.

use crate::error::{Error, Result};
use byteorder::{ByteOrder, NativeEndian};
use chrono::{
    DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};
use std::fmt;

/// Size in bytes of the native `SQL_TIME_STRUCT`
pub const SQL_TIME_STRUCT_SIZE: usize = 6;

/// Year of the date every decoded time-of-day is anchored to
pub const REFERENCE_YEAR: i32 = 1;

/// Native time-of-day: hour 0-23, minute 0-59, second 0-59
///
/// Field order and widths match `SQL_TIME_STRUCT`. Fields are private so
/// every instance is in range.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TimeOfDay {
    hour: u16,
    minute: u16,
    second: u16,
}

impl TimeOfDay {
    /// Midnight, 00:00:00
    pub const MIDNIGHT: TimeOfDay = TimeOfDay {
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Create a time-of-day, rejecting out-of-range fields
    pub fn new(hour: u16, minute: u16, second: u16) -> Result<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(Error::InvalidTime(format!(
                "{:02}:{:02}:{:02} out of range",
                hour, minute, second
            )));
        }
        Ok(Self {
            hour,
            minute,
            second,
        })
    }

    /// Extract the wall-clock time of a timestamp in its own zone
    ///
    /// Date and sub-second components are discarded. A leap second is
    /// folded into second 59.
    pub fn encode<Tz: TimeZone>(ts: &DateTime<Tz>) -> Self {
        Self::from_naive_time(ts.time())
    }

    /// Extract hour/minute/second from a naive time
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u16,
            minute: time.minute() as u16,
            second: time.second() as u16,
        }
    }

    /// Rebuild a local timestamp at the reference date
    pub fn decode(&self) -> DateTime<Local> {
        self.decode_in(&Local)
    }

    /// Rebuild a timestamp at the reference date in the given zone
    ///
    /// An ambiguous wall clock resolves to the earlier instant. A wall
    /// clock that does not exist in `tz` is read as UTC.
    pub fn decode_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        let naive = reference_datetime(self.to_naive_time());
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => tz.from_utc_datetime(&naive),
        }
    }

    /// `decode(encode(ts))`: the comparable form of a timestamp
    pub fn normalize<Tz: TimeZone>(ts: &DateTime<Tz>) -> DateTime<Local> {
        Self::encode(ts).decode()
    }

    /// Hour, 0-23
    pub fn hour(&self) -> u16 {
        self.hour
    }

    /// Minute, 0-59
    pub fn minute(&self) -> u16 {
        self.minute
    }

    /// Second, 0-59
    pub fn second(&self) -> u16 {
        self.second
    }

    /// Convert to a chrono naive time
    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            .unwrap_or_default()
    }

    /// Native-endian wire image of the struct
    pub fn to_bytes(&self) -> [u8; SQL_TIME_STRUCT_SIZE] {
        let mut buf = [0u8; SQL_TIME_STRUCT_SIZE];
        NativeEndian::write_u16(&mut buf[0..2], self.hour);
        NativeEndian::write_u16(&mut buf[2..4], self.minute);
        NativeEndian::write_u16(&mut buf[4..6], self.second);
        buf
    }

    /// Parse a native-endian wire image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SQL_TIME_STRUCT_SIZE {
            return Err(Error::InvalidTime(format!(
                "expected {} bytes, got {}",
                SQL_TIME_STRUCT_SIZE,
                bytes.len()
            )));
        }
        Self::new(
            NativeEndian::read_u16(&bytes[0..2]),
            NativeEndian::read_u16(&bytes[2..4]),
            NativeEndian::read_u16(&bytes[4..6]),
        )
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self::from_naive_time(time)
    }
}

fn reference_datetime(time: NaiveTime) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(REFERENCE_YEAR, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(time)
}
