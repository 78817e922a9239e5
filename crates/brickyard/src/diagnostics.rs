//! Non-fatal import diagnostics.

use std::fmt;

use crate::error::RecordError;

/// Why a record was skipped or left incomplete.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// The placement line could not be parsed. No node was created.
    MalformedRecord(RecordError),
    /// No geometry for the part. No node was created.
    MissingPart {
        /// Part identifier from the file.
        part_id: String,
        /// Geometry key that was looked up.
        key: String,
    },
    /// No material for the color code. The node was created without one.
    MissingMaterial {
        /// Color code from the file.
        color: i32,
        /// Material key that was looked up.
        key: String,
    },
}

/// A diagnostic tied to a source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line: usize,
    /// What went wrong.
    pub kind: DiagnosticKind,
}

impl DiagnosticKind {
    /// Short label for structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedRecord(_) => "malformed",
            DiagnosticKind::MissingPart { .. } => "missing_part",
            DiagnosticKind::MissingMaterial { .. } => "missing_material",
        }
    }
}

impl Diagnostic {
    /// Whether the record was dropped entirely.
    pub fn skipped_node(&self) -> bool {
        !matches!(self.kind, DiagnosticKind::MissingMaterial { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::MalformedRecord(e) => write!(f, "line {}: malformed placement: {e}", self.line),
            DiagnosticKind::MissingPart { part_id, key } => {
                write!(f, "line {}: no geometry for part '{part_id}' ({key})", self.line)
            }
            DiagnosticKind::MissingMaterial { color, key } => {
                write!(f, "line {}: color {color} is not defined ({key})", self.line)
            }
        }
    }
}

/// Receives warnings during import.
pub trait DiagnosticSink {
    /// Report one diagnostic.
    fn warn(&mut self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&mut self, diagnostic: &Diagnostic) {
        tracing::warn!(line = diagnostic.line, kind = diagnostic.kind.label(), "{diagnostic}");
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn warn(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic {
            line: 3,
            kind: DiagnosticKind::MissingPart {
                part_id: "3005".to_string(),
                key: "Prefabs/3005".to_string(),
            },
        };
        assert_eq!(d.to_string(), "line 3: no geometry for part '3005' (Prefabs/3005)");
        assert!(d.skipped_node());

        let d = Diagnostic {
            line: 1,
            kind: DiagnosticKind::MalformedRecord(RecordError::TooFewTokens { found: 4 }),
        };
        assert_eq!(
            d.to_string(),
            "line 1: malformed placement: expected at least 15 tokens, found 4"
        );
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let d = Diagnostic {
            line: 9,
            kind: DiagnosticKind::MissingMaterial {
                color: 99,
                key: "LegoColor_99".to_string(),
            },
        };
        sink.warn(&d);
        assert_eq!(sink, vec![d.clone()]);
        assert!(!d.skipped_node());
    }

    #[test]
    fn test_kind_labels() {
        let malformed = DiagnosticKind::MalformedRecord(RecordError::EmptyPartId);
        let part = DiagnosticKind::MissingPart {
            part_id: "3005".to_string(),
            key: "Prefabs/3005".to_string(),
        };
        let material = DiagnosticKind::MissingMaterial {
            color: 99,
            key: "LegoColor_99".to_string(),
        };
        assert_eq!(malformed.label(), "malformed");
        assert_eq!(part.label(), "missing_part");
        assert_eq!(material.label(), "missing_material");
    }
}
