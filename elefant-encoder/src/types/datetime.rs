use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;
use crate::error::{EncodeError, Result};
use crate::network_order::NetworkOrder;
use crate::types::{check_region, type_mismatch, write_bytes, EncodedLength, Encoder, Intermediate};
use crate::Value;

/// Days between the unix epoch (1970-01-01) and the PostgreSQL epoch (2000-01-01).
pub const POSTGRES_EPOCH_DAYS: i64 = 10957;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const MICROSECONDS_PER_SECOND: i64 = 1_000_000;
const RAW_TIMESTAMP_LENGTH: usize = 8;

/// How instants are presented to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampZone {
    /// Send the UTC value of the instant.
    #[default]
    Utc,
    /// Send the instant as local wall clock time.
    Local,
}

/// Finds the local UTC offset in effect at an instant.
pub type LocalOffsetResolver = fn(OffsetDateTime) -> Result<UtcOffset>;

fn system_local_offset(instant: OffsetDateTime) -> Result<UtcOffset> {
    Ok(UtcOffset::local_offset_at(instant)?)
}

/// Encoder for `timestamp` values.
///
/// Instants are written as an i64 of microseconds since 2000-01-01 00:00:00. In
/// [`TimestampZone::Local`] the local UTC offset is added, so the database sees local wall
/// clock time. An 8 byte binary value is taken to be an already encoded timestamp and is
/// passed through untouched.
#[derive(Debug, Clone, Copy)]
pub struct TimestampEncoder {
    zone: TimestampZone,
    local_offset: LocalOffsetResolver,
}

impl Default for TimestampEncoder {
    fn default() -> Self {
        Self::new(TimestampZone::Utc)
    }
}

impl TimestampEncoder {
    pub fn new(zone: TimestampZone) -> Self {
        Self {
            zone,
            local_offset: system_local_offset,
        }
    }

    pub fn utc() -> Self {
        Self::new(TimestampZone::Utc)
    }

    /// Local time, with the offset looked up from the operating system.
    pub fn local() -> Self {
        Self::new(TimestampZone::Local)
    }

    /// Local time, with the offset looked up by `resolver`.
    pub fn local_with(resolver: LocalOffsetResolver) -> Self {
        Self {
            zone: TimestampZone::Local,
            local_offset: resolver,
        }
    }

    pub fn zone(&self) -> TimestampZone {
        self.zone
    }
}

/// Microseconds since the PostgreSQL epoch, plus the instant's own offset when it is meant
/// to be sent as local time.
fn postgres_microseconds(instant: OffsetDateTime, zone: TimestampZone) -> i64 {
    let seconds = instant.unix_timestamp() - POSTGRES_EPOCH_DAYS * SECONDS_PER_DAY;
    let mut timestamp = seconds * MICROSECONDS_PER_SECOND + (instant.nanosecond() / 1000) as i64;

    if zone == TimestampZone::Local {
        timestamp += instant.offset().whole_seconds() as i64 * MICROSECONDS_PER_SECOND;
    }

    timestamp
}

impl Encoder for TimestampEncoder {
    fn name(&self) -> &'static str {
        "Timestamp"
    }

    fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
        match value {
            Value::Bytes(raw) if raw.len() == RAW_TIMESTAMP_LENGTH => {
                *intermediate = Intermediate::Bytes(Cow::Borrowed(*raw));
            }
            Value::Bytes(raw) => {
                return Err(EncodeError::InvalidRawTimestamp { length: raw.len() });
            }
            Value::Timestamp(instant) => {
                let instant = match self.zone {
                    TimestampZone::Utc => *instant,
                    TimestampZone::Local => {
                        let offset = (self.local_offset)(*instant)?;
                        debug!("Resolved local offset {offset} for timestamp {instant}");
                        instant.to_offset(offset)
                    }
                };
                *intermediate = Intermediate::Instant(instant);
            }
            _ => return Err(type_mismatch(self.name(), "timestamp or 8 byte binary", value)),
        }

        Ok(EncodedLength::Known(RAW_TIMESTAMP_LENGTH))
    }

    fn write<'v>(&self, _value: &Value<'v>, out: &mut [u8], intermediate: &mut Intermediate<'v>) -> Result<usize> {
        match intermediate {
            Intermediate::Bytes(raw) => write_bytes(raw, out),
            Intermediate::Instant(instant) => {
                check_region(RAW_TIMESTAMP_LENGTH, out)?;
                Ok(postgres_microseconds(*instant, self.zone).write_nbo(out))
            }
            _ => Err(EncodeError::MissingIntermediate { encoder: self.name() }),
        }
    }
}
