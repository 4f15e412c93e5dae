// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`PortData`] implementations for primitives, strings, sequences and
//! timestamped samples.

use super::{CdrReader, CdrWriter, PortData, SerResult};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

macro_rules! impl_port_data_primitive {
    ($type:ty, $name:expr, $write:ident, $read:ident) => {
        impl PortData for $type {
            fn type_name() -> String {
                $name.to_string()
            }

            fn serialize(&self, writer: &mut CdrWriter) -> SerResult<()> {
                writer.$write(*self)
            }

            fn deserialize(reader: &mut CdrReader<'_>) -> SerResult<Self> {
                reader.$read()
            }
        }
    };
}

impl_port_data_primitive!(bool, "boolean", write_bool, read_bool);
impl_port_data_primitive!(u8, "octet", write_u8, read_u8);
impl_port_data_primitive!(i8, "int8", write_i8, read_i8);
impl_port_data_primitive!(u16, "unsigned short", write_u16, read_u16);
impl_port_data_primitive!(i16, "short", write_i16, read_i16);
impl_port_data_primitive!(u32, "unsigned long", write_u32, read_u32);
impl_port_data_primitive!(i32, "long", write_i32, read_i32);
impl_port_data_primitive!(u64, "unsigned long long", write_u64, read_u64);
impl_port_data_primitive!(i64, "long long", write_i64, read_i64);
impl_port_data_primitive!(f32, "float", write_f32, read_f32);
impl_port_data_primitive!(f64, "double", write_f64, read_f64);

impl PortData for String {
    fn type_name() -> String {
        "string".to_string()
    }

    fn serialize(&self, writer: &mut CdrWriter) -> SerResult<()> {
        writer.write_string(self)
    }

    fn deserialize(reader: &mut CdrReader<'_>) -> SerResult<Self> {
        reader.read_string()
    }
}

impl<T: PortData> PortData for Vec<T> {
    fn type_name() -> String {
        format!("sequence<{}>", T::type_name())
    }

    fn serialize(&self, writer: &mut CdrWriter) -> SerResult<()> {
        writer.write_len(self.len())?;
        for item in self {
            item.serialize(writer)?;
        }
        Ok(())
    }

    fn deserialize(reader: &mut CdrReader<'_>) -> SerResult<Self> {
        let count = reader.read_u32()? as usize;
        // Every element takes at least one byte; cap the allocation hint.
        let mut out = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            out.push(T::deserialize(reader)?);
        }
        Ok(out)
    }
}

/// Seconds + nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    pub sec: u32,
    pub nsec: u32,
}

impl Timestamp {
    pub const fn new(sec: u32, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    /// Current wall-clock time. Clocks before the epoch read as zero.
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(Self::from_duration)
            .unwrap_or_default()
    }

    pub fn from_duration(d: Duration) -> Self {
        Self {
            sec: u32::try_from(d.as_secs()).unwrap_or(u32::MAX),
            nsec: d.subsec_nanos(),
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::new(u64::from(self.sec), self.nsec)
    }
}

impl PortData for Timestamp {
    fn type_name() -> String {
        "Time".to_string()
    }

    fn serialize(&self, writer: &mut CdrWriter) -> SerResult<()> {
        writer.write_u32(self.sec)?;
        writer.write_u32(self.nsec)
    }

    fn deserialize(reader: &mut CdrReader<'_>) -> SerResult<Self> {
        Ok(Self {
            sec: reader.read_u32()?,
            nsec: reader.read_u32()?,
        })
    }
}

/// A sample tagged with the time it was produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimedValue<T> {
    pub tm: Timestamp,
    pub data: T,
}

impl<T> TimedValue<T> {
    /// Wrap `data` stamped with the current time.
    pub fn new(data: T) -> Self {
        Self {
            tm: Timestamp::now(),
            data,
        }
    }

    pub fn with_time(tm: Timestamp, data: T) -> Self {
        Self { tm, data }
    }
}

impl<T: PortData> PortData for TimedValue<T> {
    fn type_name() -> String {
        format!("Timed<{}>", T::type_name())
    }

    fn serialize(&self, writer: &mut CdrWriter) -> SerResult<()> {
        self.tm.serialize(writer)?;
        self.data.serialize(writer)
    }

    fn deserialize(reader: &mut CdrReader<'_>) -> SerResult<Self> {
        let tm = Timestamp::deserialize(reader)?;
        let data = T::deserialize(reader)?;
        Ok(Self { tm, data })
    }
}
