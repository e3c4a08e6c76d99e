//! MD3 file inspection utilities
//!
//! Summaries of decoded models for display or JSON export, and checks
//! against the limits the reference engine enforces at load time.

use std::path::Path;

use serde::Serialize;

use super::limits::{MAX_FRAMES, MAX_SHADERS, MAX_SURFACES, MAX_TAGS, MAX_TRIANGLES, MAX_VERTS};
use super::{HEADER_SIZE, Md3Model, read_md3};
use crate::diagnostics::Diagnostic;
use crate::error::Result;

/// Summary of a decoded model.
#[derive(Debug, Clone, Serialize)]
pub struct Md3Info {
    pub name: String,
    pub version: i32,
    pub flags: i32,
    pub num_frames: usize,
    pub num_tags: usize,
    pub num_surfaces: usize,
    pub num_skins: i32,
    pub tag_names: Vec<String>,
    /// Union of all frame bounds as `[min, max]`, if there are frames.
    pub bounds: Option<[[f32; 3]; 2]>,
    pub surfaces: Vec<SurfaceInfo>,
}

/// Summary of one surface.
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceInfo {
    pub index: usize,
    pub name: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub shaders: Vec<String>,
}

impl Md3Info {
    pub fn from_model(model: &Md3Model) -> Self {
        let surfaces = model
            .surfaces
            .iter()
            .enumerate()
            .map(|(index, s)| SurfaceInfo {
                index,
                name: s.name.clone(),
                vertex_count: s.num_verts,
                triangle_count: s.num_triangles,
                shaders: s.shaders.iter().map(|sh| sh.name.clone()).collect(),
            })
            .collect();

        Self {
            name: model.name.clone(),
            version: model.version,
            flags: model.flags,
            num_frames: model.num_frames,
            num_tags: model.num_tags,
            num_surfaces: model.num_surfaces,
            num_skins: model.num_skins,
            tag_names: model.tag_names().into_iter().map(str::to_string).collect(),
            bounds: model.bounds().map(|(min, max)| [min.to_array(), max.to_array()]),
            surfaces,
        }
    }

    /// Total vertices across all surfaces, per frame.
    pub fn total_vertices(&self) -> usize {
        self.surfaces.iter().map(|s| s.vertex_count).sum()
    }

    pub fn total_triangles(&self) -> usize {
        self.surfaces.iter().map(|s| s.triangle_count).sum()
    }
}

/// Decode a file and summarize it.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn inspect_md3<P: AsRef<Path>>(path: P) -> Result<Md3Info> {
    let model = read_md3(path)?;
    Ok(Md3Info::from_model(&model))
}

/// Warn about every count above what the reference engine accepts.
///
/// The format itself has no such limits, so these are warnings; a model
/// over any of them decodes fine but will not load in the engine.
pub fn check_engine_limits(model: &Md3Model) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let mut check = |what: String, count: usize, max: usize| {
        if count > max {
            out.push(Diagnostic::warning(
                format!("{what}: {count} exceeds engine limit of {max}"),
                HEADER_SIZE,
            ));
        }
    };

    check("frames".to_string(), model.num_frames, MAX_FRAMES);
    check("tags".to_string(), model.num_tags, MAX_TAGS);
    check("surfaces".to_string(), model.num_surfaces, MAX_SURFACES);
    for (i, s) in model.surfaces.iter().enumerate() {
        check(format!("surface {i} '{}' shaders", s.name), s.num_shaders, MAX_SHADERS);
        check(format!("surface {i} '{}' vertices", s.name), s.num_verts, MAX_VERTS);
        check(format!("surface {i} '{}' triangles", s.name), s.num_triangles, MAX_TRIANGLES);
    }
    out
}
