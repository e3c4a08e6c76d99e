//! Decoded MD3 data structures.

#![allow(clippy::cast_possible_wrap)]

use glam::{Mat3, Mat4, Vec3};
use serde::Serialize;

use super::normal::PackedNormal;
use super::{MD3_IDENT, MD3_VERSION, MD3_XYZ_SCALE};
use crate::error::{Error, Result};

/// Per-frame bounds and origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub min_bounds: [f32; 3],
    pub max_bounds: [f32; 3],
    pub local_origin: [f32; 3],
    pub radius: f32,
    pub name: String,
}

/// A named attachment point for one frame.
///
/// `axis` holds three row vectors (forward, left, up) of a left-handed
/// basis. No handedness conversion is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    pub origin: [f32; 3],
    pub axis: [[f32; 3]; 3],
}

impl Tag {
    pub fn forward(&self) -> Vec3 {
        Vec3::from_array(self.axis[0])
    }

    pub fn left(&self) -> Vec3 {
        Vec3::from_array(self.axis[1])
    }

    pub fn up(&self) -> Vec3 {
        Vec3::from_array(self.axis[2])
    }

    /// The orientation with forward, left, and up as matrix rows.
    pub fn axis_matrix(&self) -> Mat3 {
        Mat3::from_cols(self.forward(), self.left(), self.up()).transpose()
    }

    /// Tag-space to model-space transform: a point `p` attached to the tag
    /// lands at `origin + p.x * forward + p.y * left + p.z * up`.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_cols(
            self.forward().extend(0.0),
            self.left().extend(0.0),
            self.up().extend(0.0),
            Vec3::from_array(self.origin).extend(1.0),
        )
    }
}

/// All tags of one frame, in file order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagFrame {
    pub tags: Vec<Tag>,
}

/// A material reference on a surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shader {
    pub name: String,
    /// Declared index; equals the shader's position in its table.
    pub index: i32,
}

/// Three vertex indices into the owning surface, each `< num_verts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Triangle {
    pub indexes: [u32; 3],
}

/// Unscaled texture coordinate for one vertex, shared by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

/// One vertex of one frame.
///
/// The stored (quantized) values are kept next to the decoded ones so a
/// decoded model re-encodes bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vertex {
    /// Stored coordinates, in 1/64 units.
    pub xyz: [i16; 3],
    pub packed_normal: PackedNormal,
    /// `xyz` scaled to model units.
    pub position: [f32; 3],
    /// `packed_normal` decoded to a unit vector.
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn from_raw(xyz: [i16; 3], packed_normal: PackedNormal) -> Self {
        Self {
            xyz,
            packed_normal,
            position: [
                f32::from(xyz[0]) * MD3_XYZ_SCALE,
                f32::from(xyz[1]) * MD3_XYZ_SCALE,
                f32::from(xyz[2]) * MD3_XYZ_SCALE,
            ],
            normal: packed_normal.decode().to_array(),
        }
    }

    /// Quantize a position and normal the way the format stores them.
    /// Coordinates outside the `i16` range saturate.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_position(position: Vec3, normal: Vec3) -> Self {
        let q = (position / MD3_XYZ_SCALE).round();
        let clamp = |c: f32| c.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
        Self::from_raw([clamp(q.x), clamp(q.y), clamp(q.z)], PackedNormal::encode(normal))
    }
}

/// One mesh of the model with its own per-frame vertex animation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    pub name: String,
    pub flags: i32,
    pub num_frames: usize,
    pub num_verts: usize,
    pub num_triangles: usize,
    pub num_shaders: usize,
    pub shaders: Vec<Shader>,
    pub triangles: Vec<Triangle>,
    /// One per unique vertex (`num_verts` entries).
    pub tex_coords: Vec<TexCoord>,
    /// Frame-major: `num_frames * num_verts` entries.
    pub vertices: Vec<Vertex>,
}

impl Surface {
    /// Build a surface, taking the counts from the collections.
    /// `num_verts` is the number of texture coordinates.
    pub fn new(
        name: impl Into<String>,
        num_frames: usize,
        shaders: Vec<Shader>,
        triangles: Vec<Triangle>,
        tex_coords: Vec<TexCoord>,
        vertices: Vec<Vertex>,
    ) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            num_frames,
            num_verts: tex_coords.len(),
            num_triangles: triangles.len(),
            num_shaders: shaders.len(),
            shaders,
            triangles,
            tex_coords,
            vertices,
        }
    }

    /// The vertices of a single frame.
    pub fn frame_vertices(&self, frame: usize) -> Option<&[Vertex]> {
        if frame >= self.num_frames {
            return None;
        }
        let start = frame * self.num_verts;
        self.vertices.get(start..start + self.num_verts)
    }

    /// The texture coordinates at a triangle's three corners.
    pub fn triangle_tex_coords(&self, triangle: usize) -> Option<[TexCoord; 3]> {
        let tri = self.triangles.get(triangle)?;
        let corner = |i: usize| self.tex_coords.get(tri.indexes[i] as usize).copied();
        Some([corner(0)?, corner(1)?, corner(2)?])
    }

    /// Check counts against collection lengths and triangle indices.
    /// Shader indices are left alone so leniently decoded models re-encode.
    ///
    /// # Errors
    /// Returns the matching taxonomy error for the first violation.
    pub fn validate(&self, index: usize, model_frames: usize) -> Result<()> {
        if self.num_frames != model_frames {
            return Err(Error::InconsistentFrameCount {
                surface: index,
                expected: model_frames,
                found: self.num_frames as i64,
            });
        }
        check_len("shader", self.num_shaders, self.shaders.len())?;
        check_len("triangle", self.num_triangles, self.triangles.len())?;
        check_len("texcoord", self.num_verts, self.tex_coords.len())?;
        check_len("vertex", self.num_frames * self.num_verts, self.vertices.len())?;

        for (t, tri) in self.triangles.iter().enumerate() {
            if let Some(&bad) = tri.indexes.iter().find(|&&i| i as usize >= self.num_verts) {
                return Err(Error::IndexOutOfRange {
                    triangle: t,
                    index: i32::try_from(bad).unwrap_or(i32::MAX),
                    vertex_count: self.num_verts,
                });
            }
        }
        Ok(())
    }
}

fn check_len(field: &'static str, declared: usize, actual: usize) -> Result<()> {
    if declared != actual {
        return Err(Error::InvalidCount {
            field,
            count: declared as i64,
            max: actual,
        });
    }
    Ok(())
}

/// A decoded MD3 model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Md3Model {
    pub ident: [u8; 4],
    pub version: i32,
    pub name: String,
    pub flags: i32,
    pub num_frames: usize,
    pub num_tags: usize,
    pub num_surfaces: usize,
    /// Stored but unused by the format.
    pub num_skins: i32,
    pub frames: Vec<Frame>,
    /// `num_frames` buckets of `num_tags` tags each.
    pub tag_frames: Vec<TagFrame>,
    pub surfaces: Vec<Surface>,
}

impl Md3Model {
    /// Build a model, taking the counts from the collections.
    pub fn new(
        name: impl Into<String>,
        frames: Vec<Frame>,
        tag_frames: Vec<TagFrame>,
        surfaces: Vec<Surface>,
    ) -> Self {
        let num_tags = tag_frames.first().map_or(0, |f| f.tags.len());
        Self {
            ident: MD3_IDENT,
            version: MD3_VERSION,
            name: name.into(),
            flags: 0,
            num_frames: frames.len(),
            num_tags,
            num_surfaces: surfaces.len(),
            num_skins: 0,
            frames,
            tag_frames,
            surfaces,
        }
    }

    pub fn tags_for_frame(&self, frame: usize) -> Option<&[Tag]> {
        self.tag_frames.get(frame).map(|f| f.tags.as_slice())
    }

    pub fn tag(&self, frame: usize, tag: usize) -> Option<&Tag> {
        self.tags_for_frame(frame)?.get(tag)
    }

    /// One tag followed through every frame.
    pub fn tag_track(&self, tag: usize) -> impl Iterator<Item = &Tag> + '_ {
        self.tag_frames.iter().filter_map(move |f| f.tags.get(tag))
    }

    /// Tag names as they appear in the first frame.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags_for_frame(0)
            .map(|tags| tags.iter().map(|t| t.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn surface_by_name(&self, name: &str) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.name == name)
    }

    /// Union of all frame bounding boxes, or `None` without frames.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.frames.iter().fold(None, |acc, f| {
            let (min, max) = (Vec3::from_array(f.min_bounds), Vec3::from_array(f.max_bounds));
            Some(match acc {
                Some((lo, hi)) => (min.min(lo), max.max(hi)),
                None => (min, max),
            })
        })
    }

    /// Check every structural invariant a decoded model guarantees.
    ///
    /// # Errors
    /// Returns the matching taxonomy error for the first violation.
    pub fn validate(&self) -> Result<()> {
        check_len("frame", self.num_frames, self.frames.len())?;
        check_len("tag frame", self.num_frames, self.tag_frames.len())?;
        for tag_frame in &self.tag_frames {
            check_len("tag", self.num_tags, tag_frame.tags.len())?;
        }
        check_len("surface", self.num_surfaces, self.surfaces.len())?;
        for (index, surface) in self.surfaces.iter().enumerate() {
            surface.validate(index, self.num_frames)?;
        }
        Ok(())
    }

    /// The whole model as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`Error::JsonError`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Log the full structure at debug level.
    pub fn log_summary(&self) {
        tracing::debug!(
            name = %self.name,
            version = self.version,
            flags = self.flags,
            frames = self.num_frames,
            tags = self.num_tags,
            surfaces = self.num_surfaces,
            skins = self.num_skins,
            "MD3 model"
        );
        for (i, frame) in self.frames.iter().enumerate() {
            tracing::debug!(
                "  frame {i} '{}': min {:?} max {:?} origin {:?} radius {}",
                frame.name, frame.min_bounds, frame.max_bounds, frame.local_origin, frame.radius
            );
        }
        for (i, name) in self.tag_names().iter().enumerate() {
            tracing::debug!("  tag {i}: {name}");
        }
        for (i, surface) in self.surfaces.iter().enumerate() {
            tracing::debug!(
                "  surface {i} '{}': {} verts, {} triangles, {} shaders",
                surface.name, surface.num_verts, surface.num_triangles, surface.num_shaders
            );
            for shader in &surface.shaders {
                tracing::debug!("    shader {}: {}", shader.index, shader.name);
            }
        }
    }
}
