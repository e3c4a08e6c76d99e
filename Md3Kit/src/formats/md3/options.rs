//! Decode options

/// Options controlling how strictly a model is decoded.
///
/// # Example
///
/// ```
/// use md3kit::formats::md3::ReadOptions;
///
/// // Accept files whose exporter left every shader index at zero
/// let options = ReadOptions::new().with_strict_shader_indices(false);
/// assert!(!options.strict_shader_indices);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Fail with `ShaderIndexMismatch` when a shader's declared index differs
    /// from its table position. When false the mismatch is a warning.
    /// Default: true
    pub strict_shader_indices: bool,

    /// Report bytes left over after the last surface as a warning.
    /// Default: true
    pub report_trailing_bytes: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadOptions {
    /// Strict decoding with every diagnostic enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strict_shader_indices: true,
            report_trailing_bytes: true,
        }
    }

    /// Lenient decoding: shader index mismatches become warnings.
    #[must_use]
    pub fn lenient() -> Self {
        Self::new().with_strict_shader_indices(false)
    }

    /// Set whether shader index mismatches are fatal.
    #[must_use]
    pub fn with_strict_shader_indices(mut self, strict: bool) -> Self {
        self.strict_shader_indices = strict;
        self
    }

    /// Set whether trailing bytes are reported.
    #[must_use]
    pub fn with_report_trailing_bytes(mut self, report: bool) -> Self {
        self.report_trailing_bytes = report;
        self
    }
}
