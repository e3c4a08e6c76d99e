//! Table placement checks shared by the file and surface levels

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use super::cursor::BinaryCursor;
use crate::error::{Error, Result};

/// A named byte range claimed by one table.
#[derive(Debug, Clone, Copy)]
pub(super) struct Span {
    pub name: &'static str,
    pub start: u64,
    pub len: u64,
}

impl Span {
    pub fn new(name: &'static str, start: i64, len: usize) -> Self {
        Self { name, start: start.max(0) as u64, len: len as u64 }
    }
}

/// Fail with [`Error::OverlappingTables`] if two non-empty spans share bytes.
pub(super) fn check_overlaps(spans: &[Span]) -> Result<()> {
    let mut spans: Vec<&Span> = spans.iter().filter(|s| s.len > 0).collect();
    spans.sort_by_key(|s| s.start);
    for pair in spans.windows(2) {
        if pair[0].start + pair[0].len > pair[1].start {
            return Err(Error::OverlappingTables {
                first: pair[0].name,
                second: pair[1].name,
            });
        }
    }
    Ok(())
}

/// Seek to a table the file declares at `target`, where `declared_end` is
/// the end of the enclosing block as the file states it.
///
/// A target inside the declared block but past the end of the buffer means
/// the file was cut short and yields [`Error::TruncatedData`]; a target
/// outside both yields [`Error::OffsetOutOfRange`].
pub(super) fn seek_declared(cursor: &mut BinaryCursor<'_>, target: i64, declared_end: i64) -> Result<()> {
    let len = cursor.len() as i64;
    if target < 0 || target > declared_end.max(len) {
        return Err(Error::OffsetOutOfRange { offset: target, len: cursor.len() });
    }
    if target > len {
        return Err(Error::TruncatedData {
            offset: cursor.len(),
            needed: (target - len) as usize,
            available: 0,
        });
    }
    cursor.seek(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_spans_do_not_overlap() {
        let spans = [
            Span::new("header", 0, 108),
            Span::new("frame table", 108, 56),
            Span::new("tag table", 164, 0),
            Span::new("surface blocks", 164, 108),
        ];
        assert!(check_overlaps(&spans).is_ok());
    }

    #[test]
    fn test_overlap_is_reported_in_file_order() {
        let spans = [
            Span::new("tag table", 150, 112),
            Span::new("header", 0, 108),
            Span::new("frame table", 108, 56),
        ];
        let err = check_overlaps(&spans).unwrap_err();
        assert!(matches!(
            err,
            Error::OverlappingTables { first: "frame table", second: "tag table" }
        ));
    }

    #[test]
    fn test_seek_declared() {
        let data = [0u8; 16];
        let mut cursor = BinaryCursor::new(&data);

        seek_declared(&mut cursor, 16, 16).unwrap();
        assert!(matches!(
            seek_declared(&mut cursor, 20, 32),
            Err(Error::TruncatedData { offset: 16, needed: 4, available: 0 })
        ));
        assert!(matches!(
            seek_declared(&mut cursor, 40, 32),
            Err(Error::OffsetOutOfRange { offset: 40, len: 16 })
        ));
        assert!(matches!(
            seek_declared(&mut cursor, -4, 32),
            Err(Error::OffsetOutOfRange { offset: -4, .. })
        ));
    }
}
