//! Batch MD3 validation
//!
//! Discovery of `.md3` files in a directory tree and parallel decoding of
//! many files. Every file is decoded independently; nothing is shared
//! between decodes except the read options.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::diagnostics::{Diagnostic, Severity};
use crate::formats::md3::inspect::check_engine_limits;
use crate::formats::md3::{ReadOptions, parse_md3_bytes_with};

/// Progress update for a batch operation
#[derive(Debug, Clone)]
pub struct ValidateProgress {
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// File being processed
    pub current_file: Option<String>,
}

/// Outcome of validating one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Decode diagnostics followed by engine limit warnings
    pub diagnostics: Vec<Diagnostic>,
    /// The decode or read error, if the file failed
    pub error: Option<String>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

/// Result of a batch validation
#[derive(Debug, Clone, Serialize)]
pub struct BatchValidateResult {
    /// Number of files that decoded
    pub success_count: usize,
    /// Number of files that failed to read or decode
    pub fail_count: usize,
    /// One report per input file, in input order
    pub results: Vec<FileReport>,
}

/// Collect every model under `dir`, such as a mod's `models/` tree.
///
/// Symlinked directories are followed. The `.md3` extension is matched
/// without regard to case, since older archives often store `.MD3`.
/// Paths come back sorted so reports are stable between runs.
pub fn find_md3_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("md3")))
        .collect();

    files.sort();
    files
}

/// Read and decode a single file, collecting every diagnostic.
pub fn validate_file(path: &Path, options: &ReadOptions) -> FileReport {
    let mut diagnostics = Vec::new();
    let error = match std::fs::read(path) {
        Ok(data) => match parse_md3_bytes_with(&data, options, &mut diagnostics) {
            Ok(model) => {
                diagnostics.extend(check_engine_limits(&model));
                None
            }
            Err(e) => Some(e.to_string()),
        },
        Err(e) => Some(format!("failed to read file: {e}")),
    };

    FileReport {
        path: path.to_path_buf(),
        diagnostics,
        error,
    }
}

/// Validate files in parallel
pub fn validate_files(files: &[PathBuf], options: &ReadOptions) -> BatchValidateResult {
    validate_files_with_progress(files, options, |_| {})
}

/// Validate files in parallel with a progress callback
///
/// The callback runs on worker threads, once per file, as the file is
/// picked up.
pub fn validate_files_with_progress<F>(
    files: &[PathBuf],
    options: &ReadOptions,
    progress: F,
) -> BatchValidateResult
where
    F: Fn(&ValidateProgress) + Send + Sync,
{
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let results: Vec<FileReport> = files
        .par_iter()
        .map(|path| {
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&ValidateProgress {
                current,
                total,
                current_file: Some(path.to_string_lossy().to_string()),
            });

            let report = validate_file(path, options);
            if report.is_ok() {
                success_counter.fetch_add(1, Ordering::SeqCst);
            } else {
                tracing::debug!("{}: {}", path.display(), report.error.as_deref().unwrap_or_default());
                fail_counter.fetch_add(1, Ordering::SeqCst);
            }
            report
        })
        .collect();

    BatchValidateResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    }
}
