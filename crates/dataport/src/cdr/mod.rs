// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample encoding: byte containers, CDR cursors and the [`PortData`] trait.
//!
//! Samples travel between ports as [`ByteData`]: an owned byte vector tagged
//! with the byte order it was encoded in. Typed ports convert values with
//! [`encode`]/[`decode`], which drive the alignment-aware [`CdrWriter`] and
//! [`CdrReader`] cursors.
//!
//! ```rust
//! use dataport::cdr::{decode, encode, Endian, TimedValue};
//!
//! let sample = TimedValue::new(vec![1.5f64, -2.0]);
//! let bytes = encode(&sample, Endian::Big).expect("encode");
//! assert_eq!(bytes.endian(), Endian::Big);
//! let back: TimedValue<Vec<f64>> = decode(&bytes).expect("decode");
//! assert_eq!(back, sample);
//! ```

mod cursor;
mod types;

pub use cursor::{CdrReader, CdrWriter};
pub use types::{TimedValue, Timestamp};

use std::fmt;
use std::str::FromStr;

/// Codec failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerError {
    /// Input ended before the value was complete.
    ReadFailed { offset: usize, reason: String },
    /// Value cannot be represented on the wire.
    WriteFailed { offset: usize, reason: String },
    /// Bytes were read but do not form a valid value.
    InvalidData { reason: String },
}

impl fmt::Display for SerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerError::ReadFailed { offset, reason } => {
                write!(f, "read failed at offset {}: {}", offset, reason)
            }
            SerError::WriteFailed { offset, reason } => {
                write!(f, "write failed at offset {}: {}", offset, reason)
            }
            SerError::InvalidData { reason } => write!(f, "invalid data: {}", reason),
        }
    }
}

impl std::error::Error for SerError {}

pub type SerResult<T> = core::result::Result<T, SerError>;

/// Byte order of an encoded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// Byte order of the running host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Endian::Little => "little",
            Endian::Big => "big",
        }
    }

    /// Parse a comma separated preference list, skipping unknown entries.
    pub fn parse_list(value: &str) -> Vec<Endian> {
        let mut out = Vec::new();
        for item in value.split(',') {
            if let Ok(endian) = item.parse::<Endian>() {
                if !out.contains(&endian) {
                    out.push(endian);
                }
            }
        }
        out
    }
}

impl FromStr for Endian {
    type Err = SerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "little" => Ok(Endian::Little),
            "big" => Ok(Endian::Big),
            other => Err(SerError::InvalidData {
                reason: format!("unknown byte order '{}'", other),
            }),
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded sample: owned bytes plus the byte order they were written in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteData {
    data: Vec<u8>,
    endian: Endian,
}

impl ByteData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(data: Vec<u8>, endian: Endian) -> Self {
        Self { data, endian }
    }

    /// Replace the content with a copy of `bytes`.
    pub fn write_data(&mut self, bytes: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(bytes);
    }

    /// Copy up to `out.len()` bytes into `out`, returning the count copied.
    pub fn read_data(&self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.data.len());
        out[..n].copy_from_slice(&self.data[..n]);
        n
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Retag the byte order without touching the bytes.
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }
}

impl AsRef<[u8]> for ByteData {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// A value that can travel through a data port.
pub trait PortData: Clone + Send + Sync + 'static {
    /// Type name advertised in connector profiles.
    fn type_name() -> String;

    fn serialize(&self, writer: &mut CdrWriter) -> SerResult<()>;

    fn deserialize(reader: &mut CdrReader<'_>) -> SerResult<Self>;
}

/// Encode `value` in the given byte order.
///
/// # Errors
/// Propagates [`PortData::serialize`] failures.
pub fn encode<T: PortData>(value: &T, endian: Endian) -> SerResult<ByteData> {
    let mut writer = CdrWriter::new(endian);
    value.serialize(&mut writer)?;
    Ok(writer.finish())
}

/// Decode a `T` using the byte order recorded in `data`.
///
/// # Errors
/// Fails on truncated or malformed input.
pub fn decode<T: PortData>(data: &ByteData) -> SerResult<T> {
    let mut reader = CdrReader::new(data.as_slice(), data.endian());
    T::deserialize(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endian_parsing() {
        assert_eq!(" Big ".parse::<Endian>(), Ok(Endian::Big));
        assert!("middle".parse::<Endian>().is_err());
        assert_eq!(
            Endian::parse_list("little, big,little,pdp"),
            vec![Endian::Little, Endian::Big]
        );
        assert!(Endian::parse_list("").is_empty());
    }

    #[test]
    fn test_byte_data_copy_in_out() {
        let mut data = ByteData::new();
        assert!(data.is_empty());
        data.write_data(&[1, 2, 3, 4]);
        data.set_endian(Endian::Big);

        let mut short = [0u8; 2];
        assert_eq!(data.read_data(&mut short), 2);
        assert_eq!(short, [1, 2]);

        let mut long = [0u8; 8];
        assert_eq!(data.read_data(&mut long), 4);
        assert_eq!(data.len(), 4);
        assert_eq!(data.endian(), Endian::Big);
    }

    #[test]
    fn test_same_value_differs_by_endian() {
        let le = encode(&0x0102_0304u32, Endian::Little).expect("encode le");
        let be = encode(&0x0102_0304u32, Endian::Big).expect("encode be");
        assert_eq!(le.as_slice(), &[4, 3, 2, 1]);
        assert_eq!(be.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(decode::<u32>(&le), decode::<u32>(&be));
    }

    #[test]
    fn test_decode_truncated_is_error() {
        let data = ByteData::from_vec(vec![0, 0], Endian::Little);
        let err = decode::<u64>(&data).expect_err("two bytes cannot hold a u64");
        assert!(matches!(err, SerError::ReadFailed { .. }));
    }
}
