//! Surface blocks
//!
//! A surface block starts with its own 108-byte header. Every offset in that
//! header is relative to the start of the block, not the file, and
//! `ofs_end` is the distance to the next block.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::cursor::BinaryCursor;
use super::header::check_count;
use super::layout::{Span, check_overlaps, seek_declared};
use super::normal::PackedNormal;
use super::options::ReadOptions;
use super::types::{Shader, Surface, TexCoord, Triangle, Vertex};
use super::writer::write_name;
use super::{
    MAX_QPATH, MD3_IDENT, SHADER_SIZE, SURFACE_HEADER_SIZE, TEXCOORD_SIZE, TRIANGLE_SIZE,
    VERTEX_SIZE,
};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, Result, Section};

/// A surface block header, with counts and block-relative offsets as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceHeader {
    pub ident: [u8; 4],
    pub name: String,
    pub flags: i32,
    pub num_frames: i32,
    pub num_shaders: i32,
    pub num_verts: i32,
    pub num_triangles: i32,
    pub ofs_triangles: i32,
    pub ofs_shaders: i32,
    pub ofs_st: i32,
    pub ofs_xyz_normals: i32,
    /// Size of the whole block
    pub ofs_end: i32,
}

/// One sub-table as located by a surface header.
struct TableRef {
    name: &'static str,
    field: &'static str,
    offset: i32,
    count: i64,
    record: usize,
}

impl SurfaceHeader {
    /// Read the raw header at the cursor position. No validation.
    ///
    /// # Errors
    /// Returns [`Error::TruncatedData`] if fewer than 108 bytes remain.
    pub fn read(cursor: &mut BinaryCursor<'_>) -> Result<Self> {
        cursor.ensure(SURFACE_HEADER_SIZE)?;
        Ok(Self {
            ident: cursor.read_array::<4>()?,
            name: cursor.read_fixed_string(MAX_QPATH)?,
            flags: cursor.read_i32()?,
            num_frames: cursor.read_i32()?,
            num_shaders: cursor.read_i32()?,
            num_verts: cursor.read_i32()?,
            num_triangles: cursor.read_i32()?,
            ofs_triangles: cursor.read_i32()?,
            ofs_shaders: cursor.read_i32()?,
            ofs_st: cursor.read_i32()?,
            ofs_xyz_normals: cursor.read_i32()?,
            ofs_end: cursor.read_i32()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.ident)?;
        write_name(writer, &self.name, MAX_QPATH)?;
        for value in [
            self.flags,
            self.num_frames,
            self.num_shaders,
            self.num_verts,
            self.num_triangles,
            self.ofs_triangles,
            self.ofs_shaders,
            self.ofs_st,
            self.ofs_xyz_normals,
            self.ofs_end,
        ] {
            writer.write_i32::<LittleEndian>(value)?;
        }
        Ok(())
    }

    fn tables(&self) -> [TableRef; 4] {
        [
            TableRef {
                name: "shader table",
                field: "shader",
                offset: self.ofs_shaders,
                count: i64::from(self.num_shaders),
                record: SHADER_SIZE,
            },
            TableRef {
                name: "triangle table",
                field: "triangle",
                offset: self.ofs_triangles,
                count: i64::from(self.num_triangles),
                record: TRIANGLE_SIZE,
            },
            TableRef {
                name: "texcoord table",
                field: "texcoord",
                offset: self.ofs_st,
                count: i64::from(self.num_verts),
                record: TEXCOORD_SIZE,
            },
            TableRef {
                name: "vertex table",
                field: "vertex",
                offset: self.ofs_xyz_normals,
                count: i64::from(self.num_frames) * i64::from(self.num_verts),
                record: VERTEX_SIZE,
            },
        ]
    }

    /// Check the header against the model and lay out its sub-tables.
    ///
    /// Every non-empty sub-table must lie between the end of the block
    /// header and the block's own `ofs_end`. Whether those bytes are
    /// actually present in the buffer is left to the reader.
    ///
    /// # Errors
    /// Returns [`Error::BadMagic`], [`Error::InvalidCount`],
    /// [`Error::InconsistentFrameCount`], [`Error::OffsetOutOfRange`] or
    /// [`Error::OverlappingTables`] for the first violation.
    pub fn validate(&self, index: usize, model_frames: usize) -> Result<()> {
        if self.ident != MD3_IDENT {
            return Err(Error::BadMagic { found: self.ident });
        }
        for (field, count) in [
            ("frame", self.num_frames),
            ("shader", self.num_shaders),
            ("vertex", self.num_verts),
            ("triangle", self.num_triangles),
        ] {
            if count < 0 {
                return Err(Error::InvalidCount { field, count: i64::from(count), max: 0 });
            }
        }
        if self.num_frames as usize != model_frames {
            return Err(Error::InconsistentFrameCount {
                surface: index,
                expected: model_frames,
                found: i64::from(self.num_frames),
            });
        }
        if self.ofs_end < 0 || (self.ofs_end as usize) < SURFACE_HEADER_SIZE {
            return Err(Error::OffsetOutOfRange {
                offset: i64::from(self.ofs_end),
                len: SURFACE_HEADER_SIZE,
            });
        }

        let extent = self.ofs_end as usize;
        let mut spans = vec![Span::new("surface header", 0, SURFACE_HEADER_SIZE)];
        for table in self.tables() {
            if table.count == 0 {
                continue;
            }
            if table.offset < 0 || table.offset as usize > extent {
                return Err(Error::OffsetOutOfRange {
                    offset: i64::from(table.offset),
                    len: extent,
                });
            }
            let room = extent - table.offset as usize;
            check_count(table.field, table.count, table.record, room)?;
            spans.push(Span::new(
                table.name,
                i64::from(table.offset),
                table.count as usize * table.record,
            ));
        }
        check_overlaps(&spans)
    }
}

/// Decode the surface block starting at the cursor position.
///
/// Returns the surface and the absolute offset where the block ends
/// according to its `ofs_end`.
///
/// # Errors
/// Returns the first structural violation, wrapped with the section and
/// offset it was found at.
pub fn read_surface(
    cursor: &mut BinaryCursor<'_>,
    index: usize,
    model_frames: usize,
    options: &ReadOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<(Surface, usize)> {
    let base = cursor.position();
    let section = Section::Surface { index };

    let header = SurfaceHeader::read(cursor).map_err(|e| e.at(section, base))?;
    header
        .validate(index, model_frames)
        .map_err(|e| e.at(section, base))?;
    let block_end = (base + header.ofs_end as usize) as i64;

    let num_verts = header.num_verts as usize;
    let num_frames = header.num_frames as usize;

    tracing::debug!(
        "surface {index} '{}' @ {base:#x}: {num_verts} verts, {} triangles, {} shaders",
        header.name,
        header.num_triangles,
        header.num_shaders
    );

    // Shaders
    let table = base + header.ofs_shaders.max(0) as usize;
    let section = Section::Shaders { surface: index };
    let count = header.num_shaders as usize;
    let mut shaders = Vec::new();
    if count > 0 {
        seek_declared(cursor, table as i64, block_end).map_err(|e| e.at(section, table))?;
        cursor.ensure(count * SHADER_SIZE).map_err(|e| e.at(section, table))?;
        shaders.reserve_exact(count);
        for position in 0..count {
            let record = cursor.position();
            let name = cursor.read_fixed_string(MAX_QPATH)?;
            let declared = cursor.read_i32()?;
            if i64::from(declared) != position as i64 {
                let err = Error::ShaderIndexMismatch { position, declared };
                if options.strict_shader_indices {
                    return Err(err.at(section, record));
                }
                sink.report(Diagnostic::warning(format!("surface {index}: {err}"), record));
            }
            shaders.push(Shader { name, index: declared });
        }
    }

    // Triangles
    let table = base + header.ofs_triangles.max(0) as usize;
    let section = Section::Triangles { surface: index };
    let count = header.num_triangles as usize;
    let mut triangles = Vec::new();
    if count > 0 {
        seek_declared(cursor, table as i64, block_end).map_err(|e| e.at(section, table))?;
        cursor.ensure(count * TRIANGLE_SIZE).map_err(|e| e.at(section, table))?;
        triangles.reserve_exact(count);
        for triangle in 0..count {
            let record = cursor.position();
            let mut indexes = [0u32; 3];
            for slot in &mut indexes {
                let vertex = cursor.read_i32()?;
                if vertex < 0 || vertex as usize >= num_verts {
                    return Err(Error::IndexOutOfRange {
                        triangle,
                        index: vertex,
                        vertex_count: num_verts,
                    }
                    .at(section, record));
                }
                *slot = vertex as u32;
            }
            triangles.push(Triangle { indexes });
        }
    }

    // Texture coordinates
    let table = base + header.ofs_st.max(0) as usize;
    let section = Section::TexCoords { surface: index };
    let mut tex_coords = Vec::new();
    if num_verts > 0 {
        seek_declared(cursor, table as i64, block_end).map_err(|e| e.at(section, table))?;
        cursor.ensure(num_verts * TEXCOORD_SIZE).map_err(|e| e.at(section, table))?;
        tex_coords.reserve_exact(num_verts);
        for _ in 0..num_verts {
            let u = cursor.read_f32()?;
            let v = cursor.read_f32()?;
            tex_coords.push(TexCoord { u, v });
        }
    }

    // Per-frame vertices, frame-major
    let table = base + header.ofs_xyz_normals.max(0) as usize;
    let section = Section::Vertices { surface: index };
    let count = num_frames * num_verts;
    let mut vertices = Vec::new();
    if count > 0 {
        seek_declared(cursor, table as i64, block_end).map_err(|e| e.at(section, table))?;
        cursor.ensure(count * VERTEX_SIZE).map_err(|e| e.at(section, table))?;
        vertices.reserve_exact(count);
        for _ in 0..count {
            let xyz = [cursor.read_i16()?, cursor.read_i16()?, cursor.read_i16()?];
            let normal = PackedNormal::from_u16(cursor.read_u16()?);
            vertices.push(Vertex::from_raw(xyz, normal));
        }
    }

    let surface = Surface {
        name: header.name,
        flags: header.flags,
        num_frames,
        num_verts,
        num_triangles: triangles.len(),
        num_shaders: shaders.len(),
        shaders,
        triangles,
        tex_coords,
        vertices,
    };
    Ok((surface, base + header.ofs_end as usize))
}
