//! Bounds-checked little-endian reader and writer over byte buffers.
//!
//! Every multi-byte integer in a shell link is little-endian. Reads check the
//! remaining length up front so a short buffer surfaces as
//! [`Error::TruncatedData`] with the offending offset instead of a bare EOF.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding::all::WINDOWS_1252;
use encoding::{DecoderTrap, EncoderTrap, Encoding};
use std::io::{Cursor, Write};

/// Sequential reader over a borrowed buffer
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Bytes left after the current offset
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if available < needed {
            return Err(Error::TruncatedData {
                offset: self.position(),
                needed,
                available,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.cursor.read_u16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.cursor.read_i32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.cursor.read_u64::<LittleEndian>()?)
    }

    /// Read the next u32 without advancing
    pub fn peek_u32(&self) -> Result<u32> {
        self.ensure(4)?;
        let start = self.position();
        let data: &'a [u8] = self.cursor.get_ref();
        Ok(u32::from_le_bytes([
            data[start],
            data[start + 1],
            data[start + 2],
            data[start + 3],
        ]))
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let start = self.position();
        let data: &'a [u8] = self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    /// Read a u16 character count followed by that many characters.
    ///
    /// Characters are UTF-16LE code units when `unicode` is set, otherwise
    /// single bytes in the ANSI code page.
    pub fn read_sized_string(&mut self, unicode: bool) -> Result<String> {
        let count = self.read_u16()? as usize;
        if count == 0 {
            return Ok(String::new());
        }

        if unicode {
            let raw = self.read_bytes(count * 2)?;
            Ok(utf16le_to_string(raw))
        } else {
            let raw = self.read_bytes(count)?;
            Ok(decode_ansi(raw))
        }
    }
}

/// Sequential writer building an owned buffer
#[derive(Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        Ok(self.buffer.write_u8(value)?)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        Ok(self.buffer.write_u16::<LittleEndian>(value)?)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        Ok(self.buffer.write_u32::<LittleEndian>(value)?)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        Ok(self.buffer.write_i32::<LittleEndian>(value)?)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        Ok(self.buffer.write_u64::<LittleEndian>(value)?)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.buffer.write_all(bytes)?)
    }

    /// Write a u16 character count followed by the characters.
    ///
    /// `field` names the value in the [`Error::PathTooLong`] raised when the
    /// count does not fit in 16 bits.
    pub fn write_sized_string(&mut self, field: &'static str, value: &str, unicode: bool) -> Result<()> {
        let (count, raw) = if unicode {
            let raw = string_to_utf16le(value);
            (raw.len() / 2, raw)
        } else {
            let raw = encode_ansi(value);
            (raw.len(), raw)
        };

        let count = u16::try_from(count).map_err(|_| Error::PathTooLong { field, length: count })?;
        self.write_u16(count)?;
        self.write_bytes(&raw)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

/// Decode ANSI (Windows-1252) bytes, replacing unmappable characters
pub fn decode_ansi(bytes: &[u8]) -> String {
    WINDOWS_1252
        .decode(bytes, DecoderTrap::Replace)
        .unwrap_or_else(|partial| partial.into_owned())
}

/// Encode to ANSI (Windows-1252), replacing unrepresentable characters with `?`
pub fn encode_ansi(value: &str) -> Vec<u8> {
    WINDOWS_1252
        .encode(value, EncoderTrap::Replace)
        .unwrap_or_else(|_| value.bytes().map(|b| if b.is_ascii() { b } else { b'?' }).collect())
}

/// Encode to ANSI only if every character is representable
pub fn encode_ansi_exact(value: &str) -> Option<Vec<u8>> {
    WINDOWS_1252.encode(value, EncoderTrap::Strict).ok()
}

pub fn string_to_utf16le(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

pub fn utf16le_to_string(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Bytes of the NUL-terminated ANSI string starting at `offset`.
///
/// Returns `None` when the offset is outside `block` or no terminator is
/// found before the end of it.
pub fn c_string_at(block: &[u8], offset: usize) -> Option<&[u8]> {
    let tail = block.get(offset..)?;
    let len = tail.iter().position(|&b| b == 0)?;
    Some(&tail[..len])
}

/// NUL-terminated UTF-16LE string starting at `offset`, bounded like [`c_string_at`]
pub fn c_utf16_string_at(block: &[u8], offset: usize) -> Option<String> {
    let tail = block.get(offset..)?;
    let units = tail.chunks_exact(2).position(|pair| pair == [0, 0])?;
    Some(utf16le_to_string(&tail[..units * 2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_reads() {
        let data = [0x4C, 0x00, 0x00, 0x00, 0x34, 0x12, 0xFF];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.peek_u32().unwrap(), 0x4C);
        assert_eq!(reader.read_u32().unwrap(), 0x4C);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_reports_offset() {
        let data = [1u8, 2, 3];
        let mut reader = ByteReader::new(&data);
        reader.read_u8().unwrap();
        match reader.read_u32() {
            Err(Error::TruncatedData { offset, needed, available }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("expected TruncatedData, got {:?}", other),
        }
        // A failed read does not consume anything
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_sized_string_counts_code_units() {
        let mut writer = ByteWriter::new();
        writer.write_sized_string("name", "héllo", true).unwrap();
        writer.write_sized_string("name", "héllo", false).unwrap();
        let bytes = writer.into_inner();

        // 5 UTF-16 units, then 5 Windows-1252 bytes
        assert_eq!(&bytes[..2], &[5, 0]);
        assert_eq!(&bytes[12..14], &[5, 0]);
        assert_eq!(bytes[15], 0xE9);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_sized_string(true).unwrap(), "héllo");
        assert_eq!(reader.read_sized_string(false).unwrap(), "héllo");
    }

    #[test]
    fn test_sized_string_too_long() {
        let long = "x".repeat(u16::MAX as usize + 1);
        let mut writer = ByteWriter::new();
        let result = writer.write_sized_string("arguments", &long, true);
        assert!(matches!(result, Err(Error::PathTooLong { field: "arguments", .. })));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_c_string_bounds() {
        let block = b"abc\0def";
        assert_eq!(c_string_at(block, 0), Some(&b"abc"[..]));
        assert_eq!(c_string_at(block, 3), Some(&b""[..]));
        // No terminator after offset 4
        assert_eq!(c_string_at(block, 4), None);
        assert_eq!(c_string_at(block, 40), None);

        let wide = [b'G', 0, b':', 0, 0, 0];
        assert_eq!(c_utf16_string_at(&wide, 0).as_deref(), Some("G:"));
        assert_eq!(c_utf16_string_at(&wide, 10), None);
        assert_eq!(c_utf16_string_at(&wide[..4], 0), None);
    }

    #[test]
    fn test_ansi_exact() {
        assert!(encode_ansi_exact("C:\\Program Files").is_some());
        assert!(encode_ansi_exact("C:\\日本").is_none());
        assert_eq!(encode_ansi("C:\\日本"), b"C:\\??".to_vec());
    }
}
