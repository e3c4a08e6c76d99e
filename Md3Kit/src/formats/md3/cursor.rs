//! Bounds-checked little-endian reader over an in-memory buffer

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Sequential and random-access reader over a borrowed byte buffer.
///
/// Every read checks the remaining length first and fails with
/// [`Error::TruncatedData`] instead of reading short. The position never
/// leaves `0..=len`.
#[derive(Debug, Clone)]
pub struct BinaryCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move to an absolute offset.
    ///
    /// # Errors
    /// Returns [`Error::OffsetOutOfRange`] if `offset` is outside `0..=len`.
    pub fn seek(&mut self, offset: i64) -> Result<()> {
        if offset < 0 || offset > self.data.len() as i64 {
            return Err(Error::OffsetOutOfRange {
                offset,
                len: self.data.len(),
            });
        }
        self.pos = offset as usize;
        Ok(())
    }

    /// Check that `needed` bytes are available at the current position.
    ///
    /// # Errors
    /// Returns [`Error::TruncatedData`] if fewer bytes remain.
    pub fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(Error::TruncatedData {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Borrow `length` bytes starting at an absolute offset without moving.
    ///
    /// # Errors
    /// Returns [`Error::OffsetOutOfRange`] if `offset` is past the end, or
    /// [`Error::TruncatedData`] if the range runs past the end.
    pub fn slice(&self, offset: usize, length: usize) -> Result<&'a [u8]> {
        if offset > self.data.len() {
            return Err(Error::OffsetOutOfRange {
                offset: offset as i64,
                len: self.data.len(),
            });
        }
        let available = self.data.len() - offset;
        if length > available {
            return Err(Error::TruncatedData { offset, needed: length, available });
        }
        Ok(&self.data[offset..offset + length])
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        let bytes = self.take(12)?;
        Ok([
            LittleEndian::read_f32(&bytes[0..4]),
            LittleEndian::read_f32(&bytes[4..8]),
            LittleEndian::read_f32(&bytes[8..12]),
        ])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read an `n`-byte null-padded name. Only bytes before the first null
    /// are significant; invalid UTF-8 is replaced rather than rejected.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.take(n)?;
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(n);
        Ok(String::from_utf8_lossy(&bytes[..len]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_reads() {
        let data = [
            0x01, 0x00, 0x00, 0x00, // i32 1
            0xFE, 0xFF, // i16 -2
            0x00, 0x00, 0x80, 0x3F, // f32 1.0
            0x7F,
        ];
        let mut cursor = BinaryCursor::new(&data);

        assert_eq!(cursor.read_i32().unwrap(), 1);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_f32().unwrap(), 1.0);
        assert_eq!(cursor.read_u8().unwrap(), 0x7F);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_short_read_is_truncated_data() {
        let data = [0u8; 3];
        let mut cursor = BinaryCursor::new(&data);
        cursor.read_u8().unwrap();

        let err = cursor.read_i32().unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedData { offset: 1, needed: 4, available: 2 }
        ));
        // Failed reads do not move the cursor
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 8];
        let mut cursor = BinaryCursor::new(&data);

        cursor.seek(8).unwrap();
        assert_eq!(cursor.remaining(), 0);
        assert!(matches!(cursor.seek(9), Err(Error::OffsetOutOfRange { offset: 9, len: 8 })));
        assert!(matches!(cursor.seek(-1), Err(Error::OffsetOutOfRange { offset: -1, .. })));
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_fixed_string_stops_at_null() {
        let mut data = [0u8; 16];
        data[..5].copy_from_slice(b"h_tag");
        data[6] = b'x'; // garbage after the terminator is ignored
        let mut cursor = BinaryCursor::new(&data);

        assert_eq!(cursor.read_fixed_string(16).unwrap(), "h_tag");
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_fixed_string_without_null_uses_full_width() {
        let data = *b"ABCD";
        let mut cursor = BinaryCursor::new(&data);
        assert_eq!(cursor.read_fixed_string(4).unwrap(), "ABCD");
    }

    #[test]
    fn test_slice() {
        let data = [1u8, 2, 3, 4];
        let cursor = BinaryCursor::new(&data);

        assert_eq!(cursor.slice(1, 2).unwrap(), &[2, 3]);
        assert_eq!(cursor.slice(4, 0).unwrap(), &[] as &[u8]);
        assert!(matches!(cursor.slice(5, 0), Err(Error::OffsetOutOfRange { .. })));
        assert!(matches!(cursor.slice(3, 2), Err(Error::TruncatedData { offset: 3, needed: 2, available: 1 })));
    }
}
