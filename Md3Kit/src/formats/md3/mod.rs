//! .md3 model file format
//!
//! Binary format for id Tech 3 animated models: one or more triangle-mesh
//! surfaces with per-frame vertex data, frame bounds, and named attachment
//! points (tags). Every table is located through an absolute offset in the
//! file header, and every surface block locates its own sub-tables relative
//! to the start of that block.

mod cursor;
mod frames;
mod header;
mod layout;
mod normal;
mod options;
mod reader;
mod surface;
mod tags;
mod types;
mod writer;

pub mod inspect;

pub use cursor::BinaryCursor;
pub use frames::read_frames;
pub use header::Md3Header;
pub use normal::PackedNormal;
pub use options::ReadOptions;
pub use reader::{parse_md3_bytes, parse_md3_bytes_with, read_md3};
pub use surface::{SurfaceHeader, read_surface};
pub use tags::{group_tags, read_tags};
pub use types::{Frame, Md3Model, Shader, Surface, Tag, TagFrame, TexCoord, Triangle, Vertex};
pub use writer::{encode_md3, write_md3};

/// "IDP3" ident, shared by the file header and every surface block
pub const MD3_IDENT: [u8; 4] = *b"IDP3";

/// The only supported format version
pub const MD3_VERSION: i32 = 15;

/// Multiplier from stored `i16` coordinates to model units
pub const MD3_XYZ_SCALE: f32 = 1.0 / 64.0;

/// Size of the fixed-length name fields in the header, tags, surfaces and shaders
pub const MAX_QPATH: usize = 64;

/// Size of the frame name field
pub const FRAME_NAME_SIZE: usize = 16;

/// File header size (4 + 4 + 64 + 4 + 8 * 4)
pub const HEADER_SIZE: usize = 108;

/// Frame record size (3 * 12 + 4 + 16)
pub const FRAME_SIZE: usize = 56;

/// Tag record size (64 + 12 + 36)
pub const TAG_SIZE: usize = 112;

/// Surface header size (4 + 64 + 4 + 4 * 4 + 5 * 4)
pub const SURFACE_HEADER_SIZE: usize = 108;

/// Shader record size (64 + 4)
pub const SHADER_SIZE: usize = 68;

/// Triangle record size (3 * 4)
pub const TRIANGLE_SIZE: usize = 12;

/// Texture coordinate record size (2 * 4)
pub const TEXCOORD_SIZE: usize = 8;

/// Vertex record size (3 * 2 + 2)
pub const VERTEX_SIZE: usize = 8;

/// Limits enforced by the reference engine at load time.
///
/// The decoder does not reject models beyond these; see
/// [`inspect::check_engine_limits`].
pub mod limits {
    pub const MAX_FRAMES: usize = 1024;
    pub const MAX_TAGS: usize = 16;
    pub const MAX_SURFACES: usize = 32;
    pub const MAX_SHADERS: usize = 256;
    pub const MAX_VERTS: usize = 4096;
    pub const MAX_TRIANGLES: usize = 8192;
}
