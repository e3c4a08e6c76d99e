//! MD3 encoding
//!
//! Models are written in the canonical layout: header, frames, tags, then
//! each surface block as header, shaders, triangles, texture coordinates
//! and vertices.

#![allow(clippy::cast_sign_loss)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::header::Md3Header;
use super::surface::SurfaceHeader;
use super::types::{Frame, Md3Model, Shader, Surface, Tag, TexCoord, Triangle, Vertex};
use super::{
    FRAME_NAME_SIZE, FRAME_SIZE, HEADER_SIZE, MAX_QPATH, MD3_IDENT, MD3_VERSION, SHADER_SIZE,
    SURFACE_HEADER_SIZE, TAG_SIZE, TEXCOORD_SIZE, TRIANGLE_SIZE, VERTEX_SIZE,
};
use crate::error::{Error, Result};

/// Write an `.md3` file to disk
///
/// # Errors
/// Returns an error if the model is structurally invalid or writing fails.
pub fn write_md3<P: AsRef<Path>>(path: P, model: &Md3Model) -> Result<()> {
    let data = encode_md3(model)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

/// Encode a model to bytes.
///
/// The model is validated first; counts and offsets are recomputed from the
/// collections, so the stored `ofs_*` values of a decoded model are not
/// carried over.
///
/// # Errors
/// Returns the same error a decoder would raise for the first structural
/// violation, or [`Error::InvalidCount`] if a table does not fit the
/// format's 32-bit offsets.
pub fn encode_md3(model: &Md3Model) -> Result<Vec<u8>> {
    model.validate()?;

    let surface_headers = model
        .surfaces
        .iter()
        .map(surface_header)
        .collect::<Result<Vec<_>>>()?;

    let ofs_frames = HEADER_SIZE;
    let ofs_tags = ofs_frames + model.frames.len() * FRAME_SIZE;
    let ofs_surfaces = ofs_tags + model.num_frames * model.num_tags * TAG_SIZE;
    let surfaces_len: usize = surface_headers.iter().map(|h| h.ofs_end as usize).sum();
    let ofs_end = ofs_surfaces + surfaces_len;

    let header = Md3Header {
        ident: MD3_IDENT,
        version: MD3_VERSION,
        name: model.name.clone(),
        flags: model.flags,
        num_frames: to_i32("frame", model.num_frames)?,
        num_tags: to_i32("tag", model.num_tags)?,
        num_surfaces: to_i32("surface", model.num_surfaces)?,
        num_skins: model.num_skins,
        ofs_frames: to_i32("frame table offset", ofs_frames)?,
        ofs_tags: to_i32("tag table offset", ofs_tags)?,
        ofs_surfaces: to_i32("surface offset", ofs_surfaces)?,
        ofs_end: to_i32("file size", ofs_end)?,
    };

    let mut out = Vec::with_capacity(ofs_end);
    header.write(&mut out)?;
    for frame in &model.frames {
        write_frame(&mut out, frame)?;
    }
    for tag_frame in &model.tag_frames {
        for tag in &tag_frame.tags {
            write_tag(&mut out, tag)?;
        }
    }
    for (surface, header) in model.surfaces.iter().zip(&surface_headers) {
        write_surface_with(&mut out, surface, header)?;
    }

    tracing::debug!("encoded '{}': {} bytes", model.name, out.len());
    Ok(out)
}

/// Write a null-padded name field of exactly `width` bytes. Longer names
/// are cut at the last character boundary that fits.
pub(super) fn write_name<W: Write>(writer: &mut W, name: &str, width: usize) -> Result<()> {
    let mut len = name.len().min(width);
    while !name.is_char_boundary(len) {
        len -= 1;
    }
    let mut buf = vec![0u8; width];
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    writer.write_all(&buf)?;
    Ok(())
}

fn to_i32(field: &'static str, value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidCount {
        field,
        count: i64::try_from(value).unwrap_or(i64::MAX),
        max: i32::MAX as usize,
    })
}

fn write_vec3<W: Write>(writer: &mut W, v: [f32; 3]) -> Result<()> {
    for c in v {
        writer.write_f32::<LittleEndian>(c)?;
    }
    Ok(())
}

pub(super) fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    write_vec3(writer, frame.min_bounds)?;
    write_vec3(writer, frame.max_bounds)?;
    write_vec3(writer, frame.local_origin)?;
    writer.write_f32::<LittleEndian>(frame.radius)?;
    write_name(writer, &frame.name, FRAME_NAME_SIZE)
}

pub(super) fn write_tag<W: Write>(writer: &mut W, tag: &Tag) -> Result<()> {
    write_name(writer, &tag.name, MAX_QPATH)?;
    write_vec3(writer, tag.origin)?;
    for row in tag.axis {
        write_vec3(writer, row)?;
    }
    Ok(())
}

/// The canonical header for a surface block: sub-tables packed right after
/// the header in shader, triangle, texcoord, vertex order.
pub(super) fn surface_header(surface: &Surface) -> Result<SurfaceHeader> {
    let ofs_shaders = SURFACE_HEADER_SIZE;
    let ofs_triangles = ofs_shaders + surface.shaders.len() * SHADER_SIZE;
    let ofs_st = ofs_triangles + surface.triangles.len() * TRIANGLE_SIZE;
    let ofs_xyz_normals = ofs_st + surface.tex_coords.len() * TEXCOORD_SIZE;
    let ofs_end = ofs_xyz_normals + surface.vertices.len() * VERTEX_SIZE;

    Ok(SurfaceHeader {
        ident: MD3_IDENT,
        name: surface.name.clone(),
        flags: surface.flags,
        num_frames: to_i32("frame", surface.num_frames)?,
        num_shaders: to_i32("shader", surface.num_shaders)?,
        num_verts: to_i32("vertex", surface.num_verts)?,
        num_triangles: to_i32("triangle", surface.num_triangles)?,
        ofs_triangles: to_i32("triangle table offset", ofs_triangles)?,
        ofs_shaders: to_i32("shader table offset", ofs_shaders)?,
        ofs_st: to_i32("texcoord table offset", ofs_st)?,
        ofs_xyz_normals: to_i32("vertex table offset", ofs_xyz_normals)?,
        ofs_end: to_i32("surface size", ofs_end)?,
    })
}

/// Write one surface block in the canonical layout.
pub(super) fn write_surface<W: Write>(writer: &mut W, surface: &Surface) -> Result<()> {
    let header = surface_header(surface)?;
    write_surface_with(writer, surface, &header)
}

fn write_surface_with<W: Write>(writer: &mut W, surface: &Surface, header: &SurfaceHeader) -> Result<()> {
    header.write(writer)?;
    write_shaders(writer, &surface.shaders)?;
    write_triangles(writer, &surface.triangles)?;
    write_tex_coords(writer, &surface.tex_coords)?;
    write_vertices(writer, &surface.vertices)
}

pub(super) fn write_shaders<W: Write>(writer: &mut W, shaders: &[Shader]) -> Result<()> {
    for shader in shaders {
        write_name(writer, &shader.name, MAX_QPATH)?;
        writer.write_i32::<LittleEndian>(shader.index)?;
    }
    Ok(())
}

pub(super) fn write_triangles<W: Write>(writer: &mut W, triangles: &[Triangle]) -> Result<()> {
    for triangle in triangles {
        for index in triangle.indexes {
            writer.write_u32::<LittleEndian>(index)?;
        }
    }
    Ok(())
}

pub(super) fn write_tex_coords<W: Write>(writer: &mut W, tex_coords: &[TexCoord]) -> Result<()> {
    for st in tex_coords {
        writer.write_f32::<LittleEndian>(st.u)?;
        writer.write_f32::<LittleEndian>(st.v)?;
    }
    Ok(())
}

pub(super) fn write_vertices<W: Write>(writer: &mut W, vertices: &[Vertex]) -> Result<()> {
    for vertex in vertices {
        for c in vertex.xyz {
            writer.write_i16::<LittleEndian>(c)?;
        }
        writer.write_u16::<LittleEndian>(vertex.packed_normal.to_u16())?;
    }
    Ok(())
}
