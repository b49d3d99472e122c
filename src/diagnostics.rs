//! Warnings and soft errors accumulated during conversion.
//!
//! Conversion is fail-soft: malformed content is reported and skipped
//! rather than aborting the run. Callers receive the full ordered list of
//! messages alongside the output.

use std::collections::HashSet;
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A single message produced while reading or converting a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Ordered diagnostic collector.
///
/// Deduplicates by (severity, message): repeated messages (e.g. the same
/// unrecognised element appearing hundreds of times) are recorded once, in
/// first-seen order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    seen: HashSet<Diagnostic>,
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.seen.insert(diagnostic.clone()) {
            self.messages.push(diagnostic);
        }
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::warning(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::error(message));
    }

    /// Merge another collector's messages into this one, preserving order
    /// and deduplication.
    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.messages {
            self.push(diagnostic);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.messages
    }
}
