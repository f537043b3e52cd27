//! Diagnostics collected during a conversion pass
//!
//! Recoverable conditions never abort the pass. Each one is logged at `warn`
//! level when it is recorded and returned to the caller with the output, so
//! the surrounding tool can surface it without blocking the write.

use serde::{Deserialize, Serialize};

use crate::model::{RationalBeat, TrackId};

/// Kind of recoverable condition
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A free-rhythm note was closed automatically
    OrphanedFreeNote,
    /// A note computed to zero or negative ticks and was stretched to one
    ZeroDurationNote,
    /// Free rhythm was entered again while notes were still open
    FreeRhythmReentered,
}

/// A recoverable condition at a specific score location
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Score position the condition refers to
    pub position: RationalBeat,
    pub track: Option<TrackId>,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, position: RationalBeat, message: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            track: None,
            message: message.into(),
        }
    }

    pub fn with_track(mut self, track: TrackId) -> Self {
        self.track = Some(track);
        self
    }
}

/// Collection of diagnostics for one pass
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Record (and log) a diagnostic
    pub fn add(&mut self, diagnostic: Diagnostic) {
        log::warn!(
            "{:?} at beat {} (track {:?}): {}",
            diagnostic.kind,
            diagnostic.position,
            diagnostic.track,
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of diagnostics of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::whole;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::new(DiagnosticKind::ZeroDurationNote, whole(3), "stretched").with_track(2);

        assert_eq!(diag.kind, DiagnosticKind::ZeroDurationNote);
        assert_eq!(diag.position, whole(3));
        assert_eq!(diag.track, Some(2));
        assert_eq!(diag.message, "stretched");
    }

    #[test]
    fn test_diagnostics_count_by_kind() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());

        diags.add(Diagnostic::new(DiagnosticKind::OrphanedFreeNote, whole(0), "a"));
        diags.add(Diagnostic::new(DiagnosticKind::OrphanedFreeNote, whole(1), "b"));
        diags.add(Diagnostic::new(DiagnosticKind::ZeroDurationNote, whole(1), "c"));

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(DiagnosticKind::OrphanedFreeNote), 2);
        assert_eq!(diags.count(DiagnosticKind::FreeRhythmReentered), 0);
    }
}
