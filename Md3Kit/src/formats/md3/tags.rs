//! Tag table
//!
//! Tags are stored frame-major: all tags of frame 0, then all tags of
//! frame 1, and so on.

use super::cursor::BinaryCursor;
use super::types::{Tag, TagFrame};
use super::{MAX_QPATH, TAG_SIZE};
use crate::error::Result;

/// Read `num_frames * num_tags` tag records in file order.
///
/// # Errors
/// Returns [`Error::TruncatedData`](crate::Error::TruncatedData) if the
/// buffer ends inside the table.
pub fn read_tags(cursor: &mut BinaryCursor<'_>, num_frames: usize, num_tags: usize) -> Result<Vec<Tag>> {
    let count = num_frames * num_tags;
    cursor.ensure(count * TAG_SIZE)?;

    let mut tags = Vec::with_capacity(count);
    for _ in 0..count {
        let name = cursor.read_fixed_string(MAX_QPATH)?;
        let origin = cursor.read_vec3()?;
        let axis = [cursor.read_vec3()?, cursor.read_vec3()?, cursor.read_vec3()?];
        tags.push(Tag { name, origin, axis });
    }
    Ok(tags)
}

/// Split a flat frame-major tag list into one bucket per frame.
pub fn group_tags(tags: Vec<Tag>, num_frames: usize, num_tags: usize) -> Vec<TagFrame> {
    let mut tags = tags.into_iter();
    (0..num_frames)
        .map(|_| TagFrame {
            tags: tags.by_ref().take(num_tags).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn tag_bytes(name: &str, x: f32) -> Vec<u8> {
        let mut out = vec![0u8; MAX_QPATH];
        out[..name.len()].copy_from_slice(name.as_bytes());
        for v in [x, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] {
            out.write_f32::<LittleEndian>(v).unwrap();
        }
        out
    }

    #[test]
    fn test_grouping_preserves_order() {
        let mut data = Vec::new();
        for frame in 0..3 {
            data.extend(tag_bytes("tag_head", frame as f32));
            data.extend(tag_bytes("tag_weapon", frame as f32 + 0.5));
        }
        let flat = read_tags(&mut BinaryCursor::new(&data), 3, 2).unwrap();
        assert_eq!(flat.len(), 6);

        let frames = group_tags(flat, 3, 2);
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.tags.len(), 2);
            assert_eq!(frame.tags[0].name, "tag_head");
            assert_eq!(frame.tags[1].name, "tag_weapon");
            assert_eq!(frame.tags[0].origin[0], i as f32);
        }
        assert_eq!(frames[2].tags[1].axis[2], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_zero_tags_gives_empty_buckets() {
        let frames = group_tags(Vec::new(), 4, 0);
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.tags.is_empty()));
    }

    #[test]
    fn test_truncated_table() {
        let data = tag_bytes("tag_torso", 0.0);
        let err = read_tags(&mut BinaryCursor::new(&data[..100]), 1, 1).unwrap_err();
        assert!(matches!(err, Error::TruncatedData { needed: 112, available: 100, .. }));
    }
}
