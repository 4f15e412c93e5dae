// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endian-aware CDR cursors.
//!
//! Primitives are aligned to their own size relative to the start of the
//! stream. Strings are a `u32` length (including the trailing NUL), the
//! bytes, then NUL. Sequences are a `u32` element count followed by the
//! elements.

use super::{ByteData, Endian, SerError, SerResult};

/// Generate aligned write methods for primitive types.
macro_rules! impl_write {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self, value: $type) -> SerResult<()> {
            self.align($size);
            match self.endian {
                Endian::Little => self.buffer.extend_from_slice(&value.to_le_bytes()),
                Endian::Big => self.buffer.extend_from_slice(&value.to_be_bytes()),
            }
            Ok(())
        }
    };
}

/// Generate aligned, bounds-checked read methods for primitive types.
macro_rules! impl_read {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> SerResult<$type> {
            self.align($size)?;
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(match self.endian {
                Endian::Little => <$type>::from_le_bytes(bytes),
                Endian::Big => <$type>::from_be_bytes(bytes),
            })
        }
    };
}

/// Growable writer producing a [`ByteData`].
pub struct CdrWriter {
    buffer: Vec<u8>,
    endian: Endian,
}

impl CdrWriter {
    pub fn new(endian: Endian) -> Self {
        Self {
            buffer: Vec::with_capacity(64),
            endian,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Pad with zeros up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        if alignment <= 1 {
            return;
        }
        let mask = alignment - 1;
        let aligned = (self.buffer.len() + mask) & !mask;
        self.buffer.resize(aligned, 0);
    }

    pub fn write_u8(&mut self, value: u8) -> SerResult<()> {
        self.buffer.push(value);
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> SerResult<()> {
        self.write_u8(value as u8)
    }

    pub fn write_bool(&mut self, value: bool) -> SerResult<()> {
        self.write_u8(u8::from(value))
    }

    impl_write!(write_u16, u16, 2);
    impl_write!(write_i16, i16, 2);
    impl_write!(write_u32, u32, 4);
    impl_write!(write_i32, i32, 4);
    impl_write!(write_u64, u64, 8);
    impl_write!(write_i64, i64, 8);
    impl_write!(write_f32, f32, 4);
    impl_write!(write_f64, f64, 8);

    pub fn write_bytes(&mut self, data: &[u8]) -> SerResult<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Length prefix for sequences and strings.
    pub fn write_len(&mut self, len: usize) -> SerResult<()> {
        let len = u32::try_from(len).map_err(|_| SerError::WriteFailed {
            offset: self.buffer.len(),
            reason: format!("length {} exceeds u32", len),
        })?;
        self.write_u32(len)
    }

    pub fn write_string(&mut self, value: &str) -> SerResult<()> {
        if value.as_bytes().contains(&0) {
            return Err(SerError::WriteFailed {
                offset: self.buffer.len(),
                reason: "string contains NUL".into(),
            });
        }
        self.write_len(value.len() + 1)?;
        self.write_bytes(value.as_bytes())?;
        self.write_u8(0)
    }

    pub fn finish(self) -> ByteData {
        ByteData::from_vec(self.buffer, self.endian)
    }
}

/// Bounds-checked reader over an encoded sample.
pub struct CdrReader<'a> {
    buffer: &'a [u8],
    offset: usize,
    endian: Endian,
}

impl<'a> CdrReader<'a> {
    pub fn new(buffer: &'a [u8], endian: Endian) -> Self {
        Self {
            buffer,
            offset: 0,
            endian,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn align(&mut self, alignment: usize) -> SerResult<()> {
        if alignment <= 1 {
            return Ok(());
        }
        let mask = alignment - 1;
        let aligned = (self.offset + mask) & !mask;
        if aligned > self.buffer.len() {
            return Err(SerError::ReadFailed {
                offset: self.offset,
                reason: "unexpected end of buffer".into(),
            });
        }
        self.offset = aligned;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> SerResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(SerError::ReadFailed {
                offset: self.offset,
                reason: "unexpected end of buffer".into(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> SerResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> SerResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> SerResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SerError::InvalidData {
                reason: format!("bool byte {:#04x}", other),
            }),
        }
    }

    impl_read!(read_u16, u16, 2);
    impl_read!(read_i16, i16, 2);
    impl_read!(read_u32, u32, 4);
    impl_read!(read_i32, i32, 4);
    impl_read!(read_u64, u64, 8);
    impl_read!(read_i64, i64, 8);
    impl_read!(read_f32, f32, 4);
    impl_read!(read_f64, f64, 8);

    /// Sequence/string length, rejected when larger than the remaining input.
    pub fn read_len(&mut self) -> SerResult<usize> {
        let len = self.read_u32()? as usize;
        if len > self.remaining() {
            return Err(SerError::ReadFailed {
                offset: self.offset,
                reason: format!("length {} exceeds remaining {}", len, self.remaining()),
            });
        }
        Ok(len)
    }

    pub fn read_string(&mut self) -> SerResult<String> {
        let len = self.read_len()?;
        if len == 0 {
            return Err(SerError::InvalidData {
                reason: "string length must include NUL".into(),
            });
        }
        let bytes = self.read_bytes(len)?;
        let (text, nul) = bytes.split_at(len - 1);
        if nul != [0] {
            return Err(SerError::InvalidData {
                reason: "string not NUL terminated".into(),
            });
        }
        String::from_utf8(text.to_vec()).map_err(|e| SerError::InvalidData {
            reason: format!("string is not UTF-8: {}", e),
        })
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_pads_relative_to_start() {
        let mut w = CdrWriter::new(Endian::Little);
        w.write_u8(0xAA).expect("u8");
        w.write_u32(0x1122_3344).expect("u32");
        w.write_u8(0xBB).expect("u8");
        w.write_f64(1.0).expect("f64");
        let data = w.finish();
        // 1 + 3 pad + 4 + 1 + 7 pad + 8
        assert_eq!(data.len(), 24);
        assert_eq!(&data.as_slice()[..8], &[0xAA, 0, 0, 0, 0x44, 0x33, 0x22, 0x11]);

        let mut r = CdrReader::new(data.as_slice(), Endian::Little);
        assert_eq!(r.read_u8().expect("u8"), 0xAA);
        assert_eq!(r.read_u32().expect("u32"), 0x1122_3344);
        assert_eq!(r.read_u8().expect("u8"), 0xBB);
        assert_eq!(r.read_f64().expect("f64"), 1.0);
        assert!(r.is_eof());
    }

    #[test]
    fn test_string_layout_big_endian() {
        let mut w = CdrWriter::new(Endian::Big);
        w.write_string("hi").expect("string");
        assert_eq!(w.finish().as_slice(), &[0, 0, 0, 3, b'h', b'i', 0]);
    }

    #[test]
    fn test_string_rejects_interior_nul_and_missing_terminator() {
        let mut w = CdrWriter::new(Endian::Little);
        assert!(w.write_string("a\0b").is_err());

        let bytes = [2u8, 0, 0, 0, b'o', b'k'];
        let mut r = CdrReader::new(&bytes, Endian::Little);
        assert!(matches!(
            r.read_string(),
            Err(SerError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_oversized_length_prefix_is_rejected() {
        let bytes = [0xFFu8, 0xFF, 0xFF, 0x7F, 1, 2];
        let mut r = CdrReader::new(&bytes, Endian::Little);
        assert!(matches!(r.read_len(), Err(SerError::ReadFailed { .. })));
    }

    #[test]
    fn test_bool_strictness() {
        let bytes = [1u8, 0, 2];
        let mut r = CdrReader::new(&bytes, Endian::Little);
        assert!(r.read_bool().expect("true"));
        assert!(!r.read_bool().expect("false"));
        assert!(r.read_bool().is_err());
    }
}
