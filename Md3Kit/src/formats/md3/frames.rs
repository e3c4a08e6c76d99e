//! Frame table

use super::cursor::BinaryCursor;
use super::types::Frame;
use super::{FRAME_NAME_SIZE, FRAME_SIZE};
use crate::error::Result;

/// Read `count` frame records starting at the cursor position.
///
/// # Errors
/// Returns [`Error::TruncatedData`](crate::Error::TruncatedData) if the
/// buffer ends inside the table; nothing is allocated in that case.
pub fn read_frames(cursor: &mut BinaryCursor<'_>, count: usize) -> Result<Vec<Frame>> {
    cursor.ensure(count * FRAME_SIZE)?;

    let mut frames = Vec::with_capacity(count);
    for _ in 0..count {
        frames.push(Frame {
            min_bounds: cursor.read_vec3()?,
            max_bounds: cursor.read_vec3()?,
            local_origin: cursor.read_vec3()?,
            radius: cursor.read_f32()?,
            name: cursor.read_fixed_string(FRAME_NAME_SIZE)?,
        });
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn frame_bytes(radius: f32, name: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for v in [-1.0f32, -2.0, -3.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.5] {
            out.write_f32::<LittleEndian>(v).unwrap();
        }
        out.write_f32::<LittleEndian>(radius).unwrap();
        let mut padded = [0u8; FRAME_NAME_SIZE];
        padded[..name.len()].copy_from_slice(name);
        out.extend_from_slice(&padded);
        out
    }

    #[test]
    fn test_read_two_frames() {
        let mut data = frame_bytes(4.0, b"idle01");
        data.extend(frame_bytes(5.0, b""));
        let frames = read_frames(&mut BinaryCursor::new(&data), 2).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].min_bounds, [-1.0, -2.0, -3.0]);
        assert_eq!(frames[0].max_bounds, [1.0, 2.0, 3.0]);
        assert_eq!(frames[0].local_origin, [0.0, 0.0, 0.5]);
        assert_eq!(frames[0].name, "idle01");
        assert_eq!(frames[1].radius, 5.0);
        assert_eq!(frames[1].name, "");
    }

    #[test]
    fn test_truncated_table() {
        let data = frame_bytes(4.0, b"a");
        let err = read_frames(&mut BinaryCursor::new(&data), 2).unwrap_err();
        assert!(matches!(err, Error::TruncatedData { needed: 112, available: 56, .. }));
    }
}
