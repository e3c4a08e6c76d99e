//! MD3 decoding
//!
//! The assembler reads the header, locates each table through its absolute
//! offset, and walks the chain of surface blocks. Decoding is fail-fast: the
//! first structural violation aborts with an error annotated with the
//! section and offset it was found at.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::cursor::BinaryCursor;
use super::frames::read_frames;
use super::header::Md3Header;
use super::layout::{Span, check_overlaps, seek_declared};
use super::options::ReadOptions;
use super::surface::read_surface;
use super::tags::{group_tags, read_tags};
use super::types::Md3Model;
use super::{FRAME_SIZE, HEADER_SIZE, SURFACE_HEADER_SIZE, TAG_SIZE};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::{Result, Section};

/// Read an .md3 file from disk
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read, or any
/// decode error from [`parse_md3_bytes`].
///
/// [`Error::Io`]: crate::Error::Io
pub fn read_md3<P: AsRef<Path>>(path: P) -> Result<Md3Model> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_md3_bytes(&buffer)
}

/// Parse .md3 data from bytes with default options, logging diagnostics
/// through `tracing`.
///
/// # Errors
///
/// Returns the first structural violation found.
pub fn parse_md3_bytes(data: &[u8]) -> Result<Md3Model> {
    parse_md3_bytes_with(data, &ReadOptions::default(), &mut TracingSink)
}

/// Parse .md3 data from bytes, reporting diagnostics to `sink`.
///
/// On failure an error-severity diagnostic describing the error is reported
/// before the error is returned.
///
/// # Errors
///
/// Returns the first structural violation found.
pub fn parse_md3_bytes_with(
    data: &[u8],
    options: &ReadOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<Md3Model> {
    decode(data, options, sink).inspect_err(|err| {
        sink.report(Diagnostic::error(err.to_string(), err.offset().unwrap_or(0)));
    })
}

fn decode(data: &[u8], options: &ReadOptions, sink: &mut dyn DiagnosticSink) -> Result<Md3Model> {
    let mut cursor = BinaryCursor::new(data);

    let header = Md3Header::read(&mut cursor).map_err(|e| e.at(Section::Header, 0))?;
    let declared_end = header.ofs_end.max(0) as usize;
    let extent = declared_end.max(data.len());
    header.check_layout(extent).map_err(|e| e.at(Section::Header, 0))?;

    let num_frames = header.num_frames as usize;
    let num_tags = header.num_tags as usize;
    let num_surfaces = header.num_surfaces as usize;

    tracing::debug!(
        "MD3 '{}': {num_frames} frames, {num_tags} tags, {num_surfaces} surfaces, {} bytes",
        header.name,
        data.len()
    );

    // Structures end here when there are no surfaces
    let mut data_end = HEADER_SIZE;

    let frames = if num_frames > 0 {
        let offset = header.ofs_frames as usize;
        let frames = seek_declared(&mut cursor, offset as i64, extent as i64)
            .and_then(|()| read_frames(&mut cursor, num_frames))
            .map_err(|e| e.at(Section::Frames, offset))?;
        data_end = data_end.max(offset + frames.len() * FRAME_SIZE);
        frames
    } else {
        Vec::new()
    };

    let tags = if num_frames * num_tags > 0 {
        let offset = header.ofs_tags as usize;
        let tags = seek_declared(&mut cursor, offset as i64, extent as i64)
            .and_then(|()| read_tags(&mut cursor, num_frames, num_tags))
            .map_err(|e| e.at(Section::Tags, offset))?;
        data_end = data_end.max(offset + tags.len() * TAG_SIZE);
        tags
    } else {
        Vec::new()
    };
    let tag_frames = group_tags(tags, num_frames, num_tags);

    // Each block's ofs_end is the distance to the next one
    let mut surfaces = Vec::new();
    let mut offset = header.ofs_surfaces.max(0) as usize;
    if num_surfaces > 0 {
        // At least one block header per surface must be present
        seek_declared(&mut cursor, offset as i64, extent as i64)
            .and_then(|()| cursor.ensure(num_surfaces * SURFACE_HEADER_SIZE))
            .map_err(|e| e.at(Section::Surface { index: 0 }, offset))?;
        surfaces.reserve_exact(num_surfaces);
    }
    for index in 0..num_surfaces {
        seek_declared(&mut cursor, offset as i64, extent as i64)
            .map_err(|e| e.at(Section::Surface { index }, offset))?;
        let (surface, end) = read_surface(&mut cursor, index, num_frames, options, sink)?;

        // The block may run past the headers reserved for it by check_layout
        let mut spans = header.fixed_spans().to_vec();
        spans.push(Span::new("surface block", offset as i64, end - offset));
        check_overlaps(&spans).map_err(|e| e.at(Section::Surface { index }, offset))?;

        surfaces.push(surface);
        offset = end;
    }
    if num_surfaces > 0 {
        data_end = data_end.max(offset);
    }

    if declared_end != data_end {
        sink.report(Diagnostic::warning(
            format!("header declares end of data at {declared_end:#x}, structures end at {data_end:#x}"),
            data_end,
        ));
    }
    if options.report_trailing_bytes && data.len() > data_end {
        sink.report(Diagnostic::warning(
            format!("{} trailing bytes after the last structure", data.len() - data_end),
            data_end,
        ));
    }

    Ok(Md3Model {
        ident: header.ident,
        version: header.version,
        name: header.name,
        flags: header.flags,
        num_frames,
        num_tags,
        num_surfaces,
        num_skins: header.num_skins,
        frames,
        tag_frames,
        surfaces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::error::Error;
    use crate::formats::md3::writer::{encode_md3, write_frame, write_surface, write_tag};
    use crate::formats::md3::{
        Frame, MD3_IDENT, MD3_VERSION, PackedNormal, Shader, Surface, Tag, TagFrame, TexCoord,
        Triangle, Vertex,
    };
    use pretty_assertions::assert_eq;

    fn frame(i: usize) -> Frame {
        Frame {
            min_bounds: [-1.0; 3],
            max_bounds: [1.0; 3],
            local_origin: [0.0; 3],
            radius: 1.5,
            name: format!("frame{i}"),
        }
    }

    fn surface(name: &str, frames: usize) -> Surface {
        Surface::new(
            name,
            frames,
            vec![Shader { name: format!("{name}.tga"), index: 0 }],
            vec![Triangle { indexes: [0, 1, 2] }],
            vec![TexCoord { u: 0.5, v: 0.5 }; 3],
            vec![Vertex::from_raw([64, 0, -64], PackedNormal { lat: 0, lng: 0 }); frames * 3],
        )
    }

    fn model() -> Md3Model {
        let tag = |name: &str| Tag {
            name: name.to_string(),
            origin: [0.0; 3],
            axis: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        };
        Md3Model::new(
            "models/test.md3",
            vec![frame(0), frame(1)],
            vec![
                TagFrame { tags: vec![tag("tag_head")] },
                TagFrame { tags: vec![tag("tag_head")] },
            ],
            vec![surface("a", 2), surface("b", 2), surface("c", 2)],
        )
    }

    fn decode_collect(data: &[u8], options: &ReadOptions) -> (Result<Md3Model>, Vec<Diagnostic>) {
        let mut sink = Vec::new();
        let result = parse_md3_bytes_with(data, options, &mut sink);
        (result, sink)
    }

    fn patch_i32(data: &mut [u8], at: usize, value: i32) {
        data[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn offset_at(data: &[u8], at: usize) -> usize {
        let value = i32::from_le_bytes(data[at..at + 4].try_into().unwrap());
        usize::try_from(value).unwrap()
    }

    // Header field offsets
    const OFS_FRAMES: usize = 92;
    const OFS_TAGS: usize = 96;
    const OFS_SURFACES: usize = 100;
    const OFS_END: usize = 104;

    // Surface header field offsets
    const SURFACE_OFS_XYZ: usize = 100;
    const SURFACE_OFS_END: usize = 104;

    #[test]
    fn test_surface_chain() {
        let original = model();
        let data = encode_md3(&original).unwrap();

        let (result, diagnostics) = decode_collect(&data, &ReadOptions::default());
        let decoded = result.unwrap();
        assert_eq!(decoded, original);
        let names: Vec<&str> = decoded.surfaces.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    /// Surfaces, then tags, then frames.
    fn reversed_layout(original: &Md3Model) -> Vec<u8> {
        let mut surfaces = Vec::new();
        for s in &original.surfaces {
            write_surface(&mut surfaces, s).unwrap();
        }
        let mut tags = Vec::new();
        for t in original.tag_frames.iter().flat_map(|f| &f.tags) {
            write_tag(&mut tags, t).unwrap();
        }
        let mut frames = Vec::new();
        for f in &original.frames {
            write_frame(&mut frames, f).unwrap();
        }

        let ofs_surfaces = HEADER_SIZE;
        let ofs_tags = ofs_surfaces + surfaces.len();
        let ofs_frames = ofs_tags + tags.len();
        let ofs_end = ofs_frames + frames.len();
        let header = Md3Header {
            ident: MD3_IDENT,
            version: MD3_VERSION,
            name: original.name.clone(),
            flags: 0,
            num_frames: 2,
            num_tags: 1,
            num_surfaces: 3,
            num_skins: 0,
            ofs_frames: i32::try_from(ofs_frames).unwrap(),
            ofs_tags: i32::try_from(ofs_tags).unwrap(),
            ofs_surfaces: i32::try_from(ofs_surfaces).unwrap(),
            ofs_end: i32::try_from(ofs_end).unwrap(),
        };
        let mut data = Vec::new();
        header.write(&mut data).unwrap();
        data.extend(surfaces);
        data.extend(tags);
        data.extend(frames);
        data
    }

    #[test]
    fn test_tables_in_reverse_order() {
        let original = model();
        let data = reversed_layout(&original);

        let (result, diagnostics) = decode_collect(&data, &ReadOptions::default());
        assert_eq!(result.unwrap(), original);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_surface_block_running_into_tag_table() {
        let mut data = reversed_layout(&model());
        let ofs_tags = offset_at(&data, OFS_TAGS);
        let block = (ofs_tags - HEADER_SIZE) / 3;
        let last = HEADER_SIZE + 2 * block;

        // Grow the last block by one record into the tags that follow it
        patch_i32(&mut data, last + SURFACE_OFS_END, i32::try_from(block + 8).unwrap());

        let (result, _) = decode_collect(&data, &ReadOptions::default());
        let err = result.unwrap_err();
        assert!(matches!(
            err.root(),
            Error::OverlappingTables { first: "surface block", second: "tag table" }
        ));
        assert_eq!(err.section(), Some(Section::Surface { index: 2 }));
        assert_eq!(err.offset(), Some(last));
    }

    #[test]
    fn test_surface_table_reading_into_next_block() {
        let mut data = encode_md3(&model()).unwrap();
        let first = offset_at(&data, OFS_SURFACES);
        let block_len = offset_at(&data, first + SURFACE_OFS_END);

        // Vertex table of surface 0 starts on the header of surface 1
        patch_i32(&mut data, first + SURFACE_OFS_XYZ, i32::try_from(block_len).unwrap());

        let (result, _) = decode_collect(&data, &ReadOptions::default());
        let err = result.unwrap_err();
        assert!(matches!(err.root(), Error::InvalidCount { field: "vertex", max: 0, .. }));
        assert_eq!(err.section(), Some(Section::Surface { index: 0 }));
    }

    #[test]
    fn test_trailing_bytes_warning() {
        let mut data = encode_md3(&model()).unwrap();
        let end = data.len();
        data.extend([0u8; 4]);

        let (result, diagnostics) = decode_collect(&data, &ReadOptions::default());
        assert!(result.is_ok());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].offset, end);
        assert!(diagnostics[0].message.contains("4 trailing bytes"));

        let options = ReadOptions::default().with_report_trailing_bytes(false);
        let (_, diagnostics) = decode_collect(&data, &options);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_declared_end_mismatch_warning() {
        let mut data = encode_md3(&model()).unwrap();
        let real_end = i32::try_from(data.len()).unwrap();
        patch_i32(&mut data, OFS_END, real_end - 8);

        let (result, diagnostics) = decode_collect(&data, &ReadOptions::default());
        assert!(result.is_ok());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("declares end of data"));
    }

    #[test]
    fn test_failure_reports_error_diagnostic() {
        let mut data = encode_md3(&model()).unwrap();
        data[0] = b'X';

        let (result, diagnostics) = decode_collect(&data, &ReadOptions::default());
        let err = result.unwrap_err();
        assert!(matches!(err.root(), Error::BadMagic { .. }));
        assert_eq!(err.section(), Some(Section::Header));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].message, err.to_string());
    }

    #[test]
    fn test_offset_past_file_and_declared_end() {
        let mut data = encode_md3(&model()).unwrap();
        patch_i32(&mut data, OFS_FRAMES, 1 << 24);

        let (result, _) = decode_collect(&data, &ReadOptions::default());
        assert!(matches!(
            result.unwrap_err().root(),
            Error::OffsetOutOfRange { offset, .. } if *offset == 1 << 24
        ));
    }

    #[test]
    fn test_surface_offset_into_frames_overlaps() {
        let mut data = encode_md3(&model()).unwrap();
        patch_i32(&mut data, OFS_SURFACES, 108 + 8);

        let (result, _) = decode_collect(&data, &ReadOptions::default());
        assert!(matches!(
            result.unwrap_err().root(),
            Error::OverlappingTables { first: "frame table", second: "surface blocks" }
        ));
    }

    #[test]
    fn test_second_surface_error_carries_its_index() {
        let mut original = model();
        original.surfaces[1].shaders[0].index = 7;
        let data = encode_md3(&original).unwrap();

        let (result, _) = decode_collect(&data, &ReadOptions::default());
        let err = result.unwrap_err();
        assert_eq!(err.section(), Some(Section::Shaders { surface: 1 }));

        let (result, diagnostics) = decode_collect(&data, &ReadOptions::lenient());
        assert_eq!(result.unwrap().surfaces[1].shaders[0].index, 7);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_zero_counts() {
        let empty = Md3Model::new("empty", Vec::new(), Vec::new(), Vec::new());
        let data = encode_md3(&empty).unwrap();

        let (result, diagnostics) = decode_collect(&data, &ReadOptions::default());
        let decoded = result.unwrap();
        assert!(decoded.frames.is_empty());
        assert!(decoded.tag_frames.is_empty());
        assert!(decoded.surfaces.is_empty());
        assert!(diagnostics.is_empty());
    }
}
