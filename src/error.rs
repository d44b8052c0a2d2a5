//! Error types and parse diagnostics.

use serde::Serialize;
use thiserror::Error;

/// Result type for presentation parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Fatal errors that abort a presentation parse.
///
/// Only these two conditions propagate out of the top-level entry point.
/// Everything else in the taxonomy is recorded as a [`Diagnostic`] on the
/// result and the offending shape, slide, or sub-parse is skipped.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The ZIP header or central directory is invalid.
    #[error("archive corrupt: {0}")]
    ArchiveCorrupt(String),

    /// `ppt/presentation.xml` is absent from the package.
    #[error("presentation part missing: {0}")]
    PresentationMissing(String),
}

impl From<zip::result::ZipError> for ParseError {
    fn from(err: zip::result::ZipError) -> Self {
        ParseError::ArchiveCorrupt(err.to_string())
    }
}

/// Category of a non-fatal parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// A part's XML failed to parse; the tree yields no matches.
    XmlSyntax,
    /// A relationship id did not resolve; the consuming shape was omitted.
    RelationshipMissing,
    /// A referenced part is absent; the shape or sub-parse was omitted.
    PartMissing,
    /// A recognized but unimplemented feature was ignored.
    UnsupportedFeature,
    /// A whole slide failed to lay out and was emitted with no shapes.
    LayoutFailure,
}

/// A non-fatal condition observed during parsing.
///
/// Diagnostics are data, not log lines: the parser appends them to the
/// result so callers can surface or ignore them.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// What the diagnostic is about: a part path, relationship id, or slide id.
    pub identifier: String,
    pub message: String,
}

/// Append-only collection of diagnostics threaded through the parse.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, identifier: impl Into<String>, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            kind,
            identifier: identifier.into(),
            message: message.into(),
        });
    }

    pub fn xml_syntax(&mut self, identifier: impl Into<String>, message: impl Into<String>) {
        self.push(DiagnosticKind::XmlSyntax, identifier, message);
    }

    pub fn relationship_missing(&mut self, source_part: impl Into<String>, rel_id: &str) {
        let source_part = source_part.into();
        self.push(
            DiagnosticKind::RelationshipMissing,
            rel_id,
            format!("relationship '{rel_id}' of '{source_part}' does not resolve"),
        );
    }

    pub fn part_missing(&mut self, path: impl Into<String>) {
        let path = path.into();
        let message = format!("part '{path}' is not in the package");
        self.push(DiagnosticKind::PartMissing, path, message);
    }

    pub fn unsupported(&mut self, identifier: impl Into<String>, detail: impl Into<String>) {
        self.push(DiagnosticKind::UnsupportedFeature, identifier, detail);
    }

    pub fn layout_failure(&mut self, slide_id: impl Into<String>, message: impl Into<String>) {
        self.push(DiagnosticKind::LayoutFailure, slide_id, message);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
