//! `md3kit inspect`

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::formats::md3::inspect::{Md3Info, check_engine_limits};
use crate::formats::md3::parse_md3_bytes_with;

#[derive(Serialize)]
struct InspectReport<'a> {
    #[serde(flatten)]
    info: &'a Md3Info,
    diagnostics: &'a [Diagnostic],
}

/// Inspect an MD3 file and display its structure.
pub fn execute(path: &Path, json: bool, lenient: bool) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let result = parse_md3_bytes_with(&data, &super::read_options(lenient), &mut diagnostics);
    let model = match result {
        Ok(model) => model,
        Err(e) => {
            for d in &diagnostics {
                eprintln!("{d}");
            }
            return Err(e).with_context(|| format!("decoding {}", path.display()));
        }
    };
    diagnostics.extend(check_engine_limits(&model));
    let info = Md3Info::from_model(&model);

    if json {
        let report = InspectReport { info: &info, diagnostics: &diagnostics };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("MD3 File Information");
    println!("====================");
    println!("Name:        {}", info.name);
    println!("Version:     {}", info.version);
    println!("Flags:       {:#x}", info.flags);
    println!("File size:   {} bytes", data.len());
    println!("Frames:      {}", info.num_frames);
    println!("Tags:        {}", info.num_tags);
    println!("Surfaces:    {}", info.num_surfaces);
    println!("Skins:       {}", info.num_skins);
    if let Some([min, max]) = info.bounds {
        println!("Bounds:      {min:?} .. {max:?}");
    }

    if !info.tag_names.is_empty() {
        println!();
        println!("Tags:");
        println!("-----");
        for (i, name) in info.tag_names.iter().enumerate() {
            println!("  [{i:2}] {name}");
        }
    }

    if !info.surfaces.is_empty() {
        println!();
        println!("Surfaces:");
        println!("---------");
        for surface in &info.surfaces {
            println!(
                "  [{:2}] {:20} | {:>5} verts | {:>5} triangles",
                surface.index, surface.name, surface.vertex_count, surface.triangle_count
            );
            for shader in &surface.shaders {
                println!("         shader: {shader}");
            }
        }
        println!();
        println!(
            "Total: {} vertices per frame, {} triangles",
            info.total_vertices(),
            info.total_triangles()
        );
    }

    if !diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        println!("------------");
        for d in &diagnostics {
            println!("  {d}");
        }
    }

    Ok(())
}
