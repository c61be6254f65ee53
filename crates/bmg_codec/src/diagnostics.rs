//! Structured diagnostics collected alongside parse/build results.
//!
//! Recoverable degradations (truncated strings, short index rows,
//! unmapped pointers) do not abort the operation. They are appended to
//! a [`Diagnostics`] list so batch callers can assert on them, and
//! mirrored to `tracing` for interactive use.

use serde::Serialize;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note, no data was lost.
    Info,
    /// Best-effort degradation; the result may differ from the input's
    /// intent.
    Warning,
}

/// One collected diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Severity of the event.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Where in the file the event happened (section, row, offset).
    pub context: String,
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it to the log.
    pub fn warn(&mut self, context: impl Into<String>, message: impl Into<String>) {
        let context = context.into();
        let message = message.into();
        tracing::warn!(context = %context, "{message}");
        self.0.push(Diagnostic {
            severity: Severity::Warning,
            message,
            context,
        });
    }

    /// Record an informational note.
    pub fn info(&mut self, context: impl Into<String>, message: impl Into<String>) {
        let context = context.into();
        let message = message.into();
        tracing::debug!(context = %context, "{message}");
        self.0.push(Diagnostic {
            severity: Severity::Info,
            message,
            context,
        });
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the recorded diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Append everything from another collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_order() {
        let mut diags = Diagnostics::new();
        diags.warn("DAT1", "first");
        diags.info("MID1 row 3", "second");
        assert_eq!(diags.len(), 2);
        let all: Vec<_> = diags.iter().collect();
        assert_eq!(all[0].severity, Severity::Warning);
        assert_eq!(all[0].message, "first");
        assert_eq!(all[1].severity, Severity::Info);
        assert_eq!(all[1].context, "MID1 row 3");
    }
}
