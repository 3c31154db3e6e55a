//! `version` section: container format number and data build date.
//!
//! After a 4-byte prologue come `varuint (format - 1)` and one stored value.
//! Old generators wrote the build date as a packed decimal `yymmdd`; newer
//! ones write a Unix timestamp. Values below [`TIMESTAMP_THRESHOLD`] are
//! packed dates.

use time::{Date, Month, OffsetDateTime};

use crate::codec::SectionReader;
use crate::error::{Error, Result};

/// Name of the section
pub const SECTION: &str = "version";

/// Bytes preceding the format number
pub const PROLOGUE_LEN: usize = 4;

/// Stored values from here on are Unix timestamps
pub const TIMESTAMP_THRESHOLD: u64 = 161_231;

/// Decoded `version` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MwmVersion {
    /// Container format number
    pub format: u32,
    /// Build date as decimal `yymmdd`
    pub version: u32,
    /// Build time in seconds since the Unix epoch; midnight UTC for
    /// packed dates
    pub seconds_since_epoch: i64,
    /// Build date (UTC)
    pub date: Date,
    /// The value as stored
    pub raw: u64,
}

impl MwmVersion {
    /// Decodes a version section
    pub fn parse(reader: &mut SectionReader) -> Result<Self> {
        reader.skip(PROLOGUE_LEN)?;

        let at = reader.position();
        let format = reader
            .read_varuint()?
            .checked_add(1)
            .and_then(|f| u32::try_from(f).ok())
            .ok_or_else(|| Error::malformed(at, "format number out of range"))?;

        let raw = reader.read_varuint()?;
        if raw < TIMESTAMP_THRESHOLD {
            Self::from_packed(format, raw)
        } else {
            Self::from_timestamp(format, raw)
        }
    }

    fn from_packed(format: u32, raw: u64) -> Result<Self> {
        let year = 2000 + (raw / 10_000) as i32;
        let month = Month::try_from(((raw / 100) % 100) as u8)
            .map_err(|_| Error::InvalidDate { value: raw })?;
        let day = (raw % 100) as u8;
        let date = Date::from_calendar_date(year, month, day)
            .map_err(|_| Error::InvalidDate { value: raw })?;

        Ok(Self {
            format,
            version: raw as u32,
            seconds_since_epoch: date.midnight().assume_utc().unix_timestamp(),
            date,
            raw,
        })
    }

    fn from_timestamp(format: u32, raw: u64) -> Result<Self> {
        let timestamp = i64::try_from(raw).map_err(|_| Error::InvalidDate { value: raw })?;
        let date = OffsetDateTime::from_unix_timestamp(timestamp)
            .map_err(|_| Error::InvalidDate { value: raw })?
            .date();
        let version = (date.year().rem_euclid(100) as u32) * 10_000
            + (u8::from(date.month()) as u32) * 100
            + date.day() as u32;

        Ok(Self {
            format,
            version,
            seconds_since_epoch: timestamp,
            date,
            raw,
        })
    }
}
