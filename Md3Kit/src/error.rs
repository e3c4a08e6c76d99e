//! Error types for `Md3Kit`

use std::fmt;

use thiserror::Error;

/// The part of an MD3 file a decode step was working on when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// The fixed 108-byte file header.
    Header,
    /// The frame table.
    Frames,
    /// The tag table.
    Tags,
    /// A surface block header.
    Surface { index: usize },
    /// A surface's shader table.
    Shaders { surface: usize },
    /// A surface's triangle table.
    Triangles { surface: usize },
    /// A surface's texture coordinate table.
    TexCoords { surface: usize },
    /// A surface's per-frame vertex table.
    Vertices { surface: usize },
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Header => write!(f, "header"),
            Section::Frames => write!(f, "frame table"),
            Section::Tags => write!(f, "tag table"),
            Section::Surface { index } => write!(f, "surface {index}"),
            Section::Shaders { surface } => write!(f, "surface {surface} shader table"),
            Section::Triangles { surface } => write!(f, "surface {surface} triangle table"),
            Section::TexCoords { surface } => write!(f, "surface {surface} texcoord table"),
            Section::Vertices { surface } => write!(f, "surface {surface} vertex table"),
        }
    }
}

/// The error type for `Md3Kit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== MD3 Format Errors ====================
    /// The buffer ends before a field or record is complete.
    #[error("truncated data: {needed} bytes needed at offset {offset}, {available} available")]
    TruncatedData {
        /// Offset the read started at.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes left in the buffer.
        available: usize,
    },

    /// A seek target lies outside the buffer.
    #[error("offset {offset} out of range (buffer is {len} bytes)")]
    OffsetOutOfRange {
        /// The requested absolute offset.
        offset: i64,
        /// Length of the buffer (or declared block) the offset was checked against.
        len: usize,
    },

    /// The file or surface ident is not `IDP3`.
    #[error("invalid MD3 magic: expected IDP3, found {found:?}")]
    BadMagic {
        /// The four bytes found in place of the magic.
        found: [u8; 4],
    },

    /// The header version is not the supported one.
    #[error("unsupported MD3 version: {version} (supported: 15)")]
    UnsupportedVersion {
        /// The version number found in the file.
        version: i32,
    },

    /// A count is negative or cannot fit in the space the file declares for it.
    #[error("invalid {field} count: {count} (room for at most {max})")]
    InvalidCount {
        /// Name of the count field.
        field: &'static str,
        /// The count as stored in the file.
        count: i64,
        /// Largest count the declared extent could hold.
        max: usize,
    },

    /// A surface declares a different number of frames than the model.
    #[error("surface {surface} has {found} frames, model has {expected}")]
    InconsistentFrameCount {
        /// Surface index.
        surface: usize,
        /// The model's frame count.
        expected: usize,
        /// The surface's frame count.
        found: i64,
    },

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index} (surface has {vertex_count} vertices)")]
    IndexOutOfRange {
        /// Triangle index within its surface.
        triangle: usize,
        /// The offending vertex index.
        index: i32,
        /// The surface's vertex count.
        vertex_count: usize,
    },

    /// A shader record's declared index differs from its table position.
    #[error("shader at position {position} declares index {declared}")]
    ShaderIndexMismatch {
        /// Position of the shader in its table.
        position: usize,
        /// Index stored in the record.
        declared: i32,
    },

    /// Two non-empty tables claim the same bytes.
    #[error("{first} and {second} overlap")]
    OverlappingTables {
        /// The first table.
        first: &'static str,
        /// The second table.
        second: &'static str,
    },

    // ==================== Parsing Errors ====================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ==================== Context ====================
    /// An error annotated with where in the file it happened.
    #[error("{section} at offset {offset}: {source}")]
    At {
        /// The section being decoded.
        section: Section,
        /// Absolute byte offset of the section or record.
        offset: usize,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach positional context. An error that already carries context keeps
    /// its innermost (most precise) location.
    #[must_use]
    pub fn at(self, section: Section, offset: usize) -> Self {
        match self {
            Error::At { .. } => self,
            other => Error::At {
                section,
                offset,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any positional context stripped.
    pub fn root(&self) -> &Error {
        match self {
            Error::At { source, .. } => source.root(),
            other => other,
        }
    }

    /// The section the error was raised in, if known.
    pub fn section(&self) -> Option<Section> {
        match self {
            Error::At { section, .. } => Some(*section),
            _ => None,
        }
    }

    /// The byte offset the error was raised at, if known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::At { offset, .. } => Some(*offset),
            Error::TruncatedData { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// A specialized Result type for `Md3Kit` operations.
pub type Result<T> = std::result::Result<T, Error>;
