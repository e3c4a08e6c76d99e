//! MD3 file header

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::cursor::BinaryCursor;
use super::layout::{Span, check_overlaps};
use super::writer::write_name;
use super::{
    FRAME_SIZE, HEADER_SIZE, MAX_QPATH, MD3_IDENT, MD3_VERSION, SURFACE_HEADER_SIZE, TAG_SIZE,
};
use crate::error::{Error, Result};

/// The fixed 108-byte header, with counts and offsets as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Md3Header {
    pub ident: [u8; 4],
    pub version: i32,
    pub name: String,
    pub flags: i32,
    pub num_frames: i32,
    pub num_tags: i32,
    pub num_surfaces: i32,
    pub num_skins: i32,
    /// Absolute offset of the frame table
    pub ofs_frames: i32,
    /// Absolute offset of the tag table
    pub ofs_tags: i32,
    /// Absolute offset of the first surface block
    pub ofs_surfaces: i32,
    /// Declared end of file
    pub ofs_end: i32,
}

impl Md3Header {
    /// Read and validate the header at the cursor position.
    ///
    /// # Errors
    /// Returns [`Error::TruncatedData`] if fewer than 108 bytes remain,
    /// [`Error::BadMagic`] for a wrong ident, [`Error::UnsupportedVersion`]
    /// for any version other than 15, and [`Error::InvalidCount`] for
    /// negative counts.
    pub fn read(cursor: &mut BinaryCursor<'_>) -> Result<Self> {
        cursor.ensure(HEADER_SIZE)?;

        let ident = cursor.read_array::<4>()?;
        if ident != MD3_IDENT {
            return Err(Error::BadMagic { found: ident });
        }

        let version = cursor.read_i32()?;
        if version != MD3_VERSION {
            return Err(Error::UnsupportedVersion { version });
        }

        let header = Self {
            ident,
            version,
            name: cursor.read_fixed_string(MAX_QPATH)?,
            flags: cursor.read_i32()?,
            num_frames: cursor.read_i32()?,
            num_tags: cursor.read_i32()?,
            num_surfaces: cursor.read_i32()?,
            num_skins: cursor.read_i32()?,
            ofs_frames: cursor.read_i32()?,
            ofs_tags: cursor.read_i32()?,
            ofs_surfaces: cursor.read_i32()?,
            ofs_end: cursor.read_i32()?,
        };

        for (field, count) in [
            ("frame", header.num_frames),
            ("tag", header.num_tags),
            ("surface", header.num_surfaces),
        ] {
            if count < 0 {
                return Err(Error::InvalidCount { field, count: i64::from(count), max: 0 });
            }
        }

        Ok(header)
    }

    /// Check that every non-empty table starts inside `extent`, has room
    /// for its records before `extent`, and overlaps neither the header nor
    /// another table. The surface area is only known to hold at least one
    /// block header per surface at this point.
    ///
    /// # Errors
    /// Returns [`Error::OffsetOutOfRange`] for a table starting outside the
    /// extent, [`Error::InvalidCount`] for a count that cannot fit, or
    /// [`Error::OverlappingTables`].
    pub fn check_layout(&self, extent: usize) -> Result<()> {
        let tags = i64::from(self.num_frames) * i64::from(self.num_tags);
        let mut spans = vec![Span::new("header", 0, HEADER_SIZE)];
        for (name, field, offset, count, record) in [
            ("frame table", "frame", self.ofs_frames, i64::from(self.num_frames), FRAME_SIZE),
            ("tag table", "tag", self.ofs_tags, tags, TAG_SIZE),
            ("surface blocks", "surface", self.ofs_surfaces, i64::from(self.num_surfaces), SURFACE_HEADER_SIZE),
        ] {
            if count == 0 {
                continue;
            }
            if offset < 0 || offset as usize > extent {
                return Err(Error::OffsetOutOfRange { offset: i64::from(offset), len: extent });
            }
            check_count(field, count, record, extent - offset as usize)?;
            spans.push(Span::new(name, i64::from(offset), count as usize * record));
        }
        check_overlaps(&spans)
    }

    /// Byte ranges of the header and the frame and tag tables. Only
    /// meaningful once [`check_layout`](Self::check_layout) has passed.
    pub(super) fn fixed_spans(&self) -> [Span; 3] {
        let tags = self.num_frames.max(0) as usize * self.num_tags.max(0) as usize;
        [
            Span::new("header", 0, HEADER_SIZE),
            Span::new("frame table", i64::from(self.ofs_frames), self.num_frames.max(0) as usize * FRAME_SIZE),
            Span::new("tag table", i64::from(self.ofs_tags), tags * TAG_SIZE),
        ]
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.ident)?;
        writer.write_i32::<LittleEndian>(self.version)?;
        write_name(writer, &self.name, MAX_QPATH)?;
        for value in [
            self.flags,
            self.num_frames,
            self.num_tags,
            self.num_surfaces,
            self.num_skins,
            self.ofs_frames,
            self.ofs_tags,
            self.ofs_surfaces,
            self.ofs_end,
        ] {
            writer.write_i32::<LittleEndian>(value)?;
        }
        Ok(())
    }
}

/// Fail with [`Error::InvalidCount`] unless `count` records of `record`
/// bytes fit in `extent` bytes.
pub(super) fn check_count(field: &'static str, count: i64, record: usize, extent: usize) -> Result<()> {
    let max = extent / record;
    if count < 0 || count as u64 > max as u64 {
        return Err(Error::InvalidCount { field, count, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Md3Header {
        Md3Header {
            ident: MD3_IDENT,
            version: MD3_VERSION,
            name: "models/test.md3".to_string(),
            flags: 0,
            num_frames: 1,
            num_tags: 0,
            num_surfaces: 0,
            num_skins: 0,
            ofs_frames: 108,
            ofs_tags: 164,
            ofs_surfaces: 164,
            ofs_end: 164,
        }
    }

    fn bytes(header: &Md3Header) -> Vec<u8> {
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        out
    }

    #[test]
    fn test_header_is_108_bytes() {
        assert_eq!(bytes(&sample()).len(), HEADER_SIZE);
    }

    #[test]
    fn test_read_back() {
        let data = bytes(&sample());
        let header = Md3Header::read(&mut BinaryCursor::new(&data)).unwrap();
        assert_eq!(header, sample());
    }

    #[test]
    fn test_bad_magic() {
        let mut data = bytes(&sample());
        data[0] = b'X';
        let err = Md3Header::read(&mut BinaryCursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::BadMagic { found } if &found == b"XDP3"));
    }

    #[test]
    fn test_unsupported_version() {
        let mut header = sample();
        header.version = 16;
        let data = bytes(&header);
        let err = Md3Header::read(&mut BinaryCursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { version: 16 }));
    }

    #[test]
    fn test_negative_count() {
        let mut header = sample();
        header.num_tags = -1;
        let data = bytes(&header);
        let err = Md3Header::read(&mut BinaryCursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::InvalidCount { field: "tag", count: -1, .. }));
    }

    #[test]
    fn test_short_header() {
        let data = bytes(&sample());
        let err = Md3Header::read(&mut BinaryCursor::new(&data[..100])).unwrap_err();
        assert!(matches!(err, Error::TruncatedData { offset: 0, needed: 108, available: 100 }));
    }

    #[test]
    fn test_count_must_fit_after_its_offset() {
        let mut header = sample();
        header.num_frames = 1_000_000;
        let err = header.check_layout(4096).unwrap_err();
        // (4096 - 108) / 56
        assert!(matches!(err, Error::InvalidCount { field: "frame", max: 71, .. }));
    }

    #[test]
    fn test_tag_table_is_frames_times_tags() {
        let mut header = sample();
        header.num_frames = 10;
        header.num_tags = 10;
        header.ofs_tags = 108 + 10 * 56;
        let tags_end = header.ofs_tags as usize + 100 * 112;

        assert!(header.check_layout(tags_end).is_ok());
        assert!(matches!(
            header.check_layout(tags_end - 1),
            Err(Error::InvalidCount { field: "tag", count: 100, max: 99 })
        ));
    }

    #[test]
    fn test_table_offset_outside_extent() {
        let mut header = sample();
        header.ofs_frames = 5000;
        assert!(matches!(
            header.check_layout(4096),
            Err(Error::OffsetOutOfRange { offset: 5000, len: 4096 })
        ));

        header.ofs_frames = -8;
        assert!(matches!(header.check_layout(4096), Err(Error::OffsetOutOfRange { offset: -8, .. })));
    }

    #[test]
    fn test_tables_overlapping_header() {
        let mut header = sample();
        header.ofs_frames = 100;
        assert!(matches!(
            header.check_layout(4096),
            Err(Error::OverlappingTables { first: "header", second: "frame table" })
        ));

        // Empty tables may point anywhere
        let mut header = sample();
        header.ofs_tags = 0;
        assert!(header.check_layout(4096).is_ok());
    }
}
