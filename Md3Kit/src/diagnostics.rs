//! Structured decode diagnostics
//!
//! The decoder reports non-fatal findings (and the fatal error, just before it
//! returns) as [`Diagnostic`] events through a [`DiagnosticSink`]. Collect them
//! into a `Vec<Diagnostic>` or forward them to `tracing` with [`TracingSink`].

use std::fmt;

use serde::Serialize;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Absolute byte offset the event refers to.
    pub offset: usize,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>, offset: usize) -> Self {
        Self { severity: Severity::Info, message: message.into(), offset }
    }

    pub fn warning(message: impl Into<String>, offset: usize) -> Self {
        Self { severity: Severity::Warning, message: message.into(), offset }
    }

    pub fn error(message: impl Into<String>, offset: usize) -> Self {
        Self { severity: Severity::Error, message: message.into(), offset }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:#x}: {}", self.severity, self.offset, self.message)
    }
}

/// Receiver for decode diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let Diagnostic { severity, message, offset } = diagnostic;
        match severity {
            Severity::Info => tracing::info!(offset, "{message}"),
            Severity::Warning => tracing::warn!(offset, "{message}"),
            Severity::Error => tracing::error!(offset, "{message}"),
        }
    }
}
