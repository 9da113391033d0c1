//! Immutable byte cursor used by the container decoder
//!
//! A cursor is an offset into a borrowed buffer. Every read returns the value
//! together with the advanced cursor, so decoding steps never share mutable
//! position state.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Position inside an immutable localization buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at `pos` (clamped to the buffer length)
    #[must_use]
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    /// Absolute offset in the buffer
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Whether the remaining bytes begin with `tag`
    #[must_use]
    pub fn starts_with(&self, tag: &[u8]) -> bool {
        self.remaining().starts_with(tag)
    }

    /// Peek a little-endian u32 without advancing
    #[must_use]
    pub fn peek_u32(&self) -> Option<u32> {
        let rest = self.remaining();
        (rest.len() >= 4).then(|| LittleEndian::read_u32(rest))
    }

    /// Take `len` bytes, failing with [`Error::KeyLengthOverflow`] if the
    /// buffer is shorter.
    pub fn take(self, len: usize, field: &'static str) -> Result<(&'a [u8], Self)> {
        let rest = self.remaining();
        if len > rest.len() {
            return Err(Error::KeyLengthOverflow {
                field,
                offset: self.pos,
                needed: len,
                available: rest.len(),
            });
        }
        Ok((
            &rest[..len],
            Self {
                data: self.data,
                pos: self.pos + len,
            },
        ))
    }

    /// Advance by `len` bytes
    pub fn skip(self, len: usize, field: &'static str) -> Result<Self> {
        self.take(len, field).map(|(_, next)| next)
    }

    /// Read a little-endian u32
    pub fn read_u32(self, field: &'static str) -> Result<(u32, Self)> {
        let (bytes, next) = self.take(4, field)?;
        Ok((LittleEndian::read_u32(bytes), next))
    }

    /// Read a single byte
    pub fn read_u8(self, field: &'static str) -> Result<(u8, Self)> {
        let (bytes, next) = self.take(1, field)?;
        Ok((bytes[0], next))
    }

    /// Read `len` bytes as an ASCII string
    pub fn read_ascii(self, len: usize, field: &'static str) -> Result<(String, Self)> {
        let offset = self.pos;
        let (bytes, next) = self.take(len, field)?;
        if !bytes.is_ascii() {
            return Err(Error::InvalidAscii { field, offset });
        }
        let text = bytes.iter().map(|&b| char::from(b)).collect();
        Ok((text, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_advance_without_mutation() {
        let data = [0x2A, 0, 0, 0, b'K', b'E', b'Y'];
        let start = ByteCursor::new(&data, 0);

        let (value, after) = start.read_u32("value").unwrap();
        assert_eq!(value, 42);
        assert_eq!(after.position(), 4);
        assert_eq!(start.position(), 0);

        let (key, end) = after.read_ascii(3, "key").unwrap();
        assert_eq!(key, "KEY");
        assert!(end.is_empty());
    }

    #[test]
    fn test_take_past_end_is_overflow() {
        let data = [1, 2, 3];
        let err = ByteCursor::new(&data, 1).take(5, "text").unwrap_err();
        match err {
            Error::KeyLengthOverflow {
                field,
                offset,
                needed,
                available,
            } => {
                assert_eq!(field, "text");
                assert_eq!(offset, 1);
                assert_eq!(needed, 5);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_ascii_keeps_every_byte() {
        let data: Vec<u8> = (0u8..0x80).collect();
        let (text, _) = ByteCursor::new(&data, 0).read_ascii(data.len(), "key").unwrap();
        assert_eq!(text.len(), 0x80);
        assert_eq!(text.as_bytes(), data.as_slice());
    }

    #[test]
    fn test_non_ascii_rejected() {
        let data = [b'O', 0xE9];
        let err = ByteCursor::new(&data, 0).read_ascii(2, "key").unwrap_err();
        assert!(matches!(err, Error::InvalidAscii { field: "key", offset: 0 }));
    }

    #[test]
    fn test_peek_needs_four_bytes() {
        let data = [1, 0, 0];
        assert_eq!(ByteCursor::new(&data, 0).peek_u32(), None);
        let data = [0xFF, 0, 0, 0, 9];
        assert_eq!(ByteCursor::new(&data, 0).peek_u32(), Some(255));
    }
}
