//! # Md3Kit
//!
//! A pure-Rust decoder for id Tech 3 `.md3` animated models.
//!
//! An MD3 file holds one or more triangle-mesh surfaces with per-frame
//! vertex animation, per-frame bounds, and named attachment points (tags)
//! used to connect models to each other. Md3Kit decodes the whole file into
//! an owned [`Md3Model`](formats::md3::Md3Model), validating every count,
//! offset and index on the way, and can encode a model back to bytes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use md3kit::formats::md3::read_md3;
//!
//! let model = read_md3("models/players/visor/upper.md3")?;
//! println!("{} frames, {} surfaces", model.num_frames, model.num_surfaces);
//!
//! // Where the weapon attaches in frame 0
//! if let Some(tag) = model.tags_for_frame(0).and_then(|t| t.iter().find(|t| t.name == "tag_weapon")) {
//!     println!("tag_weapon at {:?}", tag.origin);
//! }
//! # Ok::<(), md3kit::Error>(())
//! ```
//!
//! ### Collecting diagnostics
//!
//! ```
//! use md3kit::prelude::*;
//!
//! let model = Md3Model::new("empty", Vec::new(), Vec::new(), Vec::new());
//! let mut data = encode_md3(&model)?;
//! data.extend([0u8; 4]);
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! let decoded = parse_md3_bytes_with(&data, &ReadOptions::default(), &mut diagnostics)?;
//! assert_eq!(decoded.name, "empty");
//! assert_eq!(diagnostics.len(), 1); // 4 trailing bytes
//! # Ok::<(), md3kit::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `md3kit` command-line binary

pub mod batch;
pub mod diagnostics;
pub mod error;
pub mod formats;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity, TracingSink};
    pub use crate::error::{Error, Result, Section};
    pub use crate::formats::md3::{
        Frame, Md3Model, PackedNormal, ReadOptions, Shader, Surface, Tag, TagFrame, TexCoord,
        Triangle, Vertex, encode_md3, parse_md3_bytes, parse_md3_bytes_with, read_md3, write_md3,
    };
    pub use crate::formats::md3::inspect::{Md3Info, check_engine_limits};

    pub use crate::batch::{BatchValidateResult, find_md3_files, validate_files};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
