//! The diagnostics system.

use span::{SourceMap, Span, Spanning};
use std::{collections::BTreeSet, path::PathBuf};
use utility::Str;

pub use code::{Code, Stage};
pub use reporter::Reporter;

mod code;
mod format;
pub mod error;
pub mod reporter;

/// A complex diagnostic message, optionally with source locations.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
#[must_use]
pub struct Diagnostic {
    bare: BareDiagnostic,
}

impl Diagnostic {
    fn new(severity: Severity) -> Self {
        Self { bare: Box::new(UnboxedBareDiagnostic::new(severity)) }
    }

    /// Create a diagnostic for an internal compiler error.
    pub fn bug() -> Self {
        Self::new(Severity::Bug)
    }

    /// Create a diagnostic for a user error.
    pub fn error() -> Self {
        Self::new(Severity::Error)
    }

    /// Create a diagnostic for a warning.
    pub fn warning() -> Self {
        Self::new(Severity::Warning)
    }

    pub fn code(mut self, code: Code) -> Self {
        self.bare.code = Some(code);
        self
    }

    /// Add a text message describing the issue.
    ///
    /// The message should not contain line breaks, should not start with an
    /// upper-case letter and should not end in a punctuation mark. Surround
    /// source code snippets with directional single quotation marks.
    pub fn message(mut self, message: impl Into<Str>) -> Self {
        self.bare.message = Some(message.into());
        self
    }

    fn span(mut self, spanning: impl Spanning, label: Option<Str>, role: Role) -> Self {
        self.bare.highlights.insert(Highlight { span: spanning.span(), label, role });
        self
    }

    /// Reference a code snippet as one of the focal points of the diagnostic.
    pub fn primary_span(self, spanning: impl Spanning) -> Self {
        self.span(spanning, None, Role::Primary)
    }

    /// Reference and label a code snippet as one of the focal points of the diagnostic.
    pub fn labeled_primary_span(self, spanning: impl Spanning, label: impl Into<Str>) -> Self {
        self.span(spanning, Some(label.into()), Role::Primary)
    }

    /// Reference a code snippet as auxiliary information for the diagnostic.
    pub fn secondary_span(self, spanning: impl Spanning) -> Self {
        self.span(spanning, None, Role::Secondary)
    }

    /// Reference and label a code snippet as auxiliary information for the diagnostic.
    pub fn labeled_secondary_span(self, spanning: impl Spanning, label: impl Into<Str>) -> Self {
        self.span(spanning, Some(label.into()), Role::Secondary)
    }

    fn subdiagnostic(mut self, severity: Subseverity, message: Str) -> Self {
        self.bare.subdiagnostics.push(Subdiagnostic { severity, message });
        self
    }

    /// Add further clarifying information.
    pub fn note(self, message: impl Into<Str>) -> Self {
        self.subdiagnostic(Subseverity::Note, message.into())
    }

    /// Add steps or tips to solve the diagnosed issue.
    pub fn help(self, message: impl Into<Str>) -> Self {
        self.subdiagnostic(Subseverity::Help, message.into())
    }

    pub fn path(mut self, path: PathBuf) -> Self {
        self.bare.path = Some(path);
        self
    }

    pub fn with(self, builder: impl FnOnce(Self) -> Self) -> Self {
        builder(self)
    }

    /// Report the diagnostic.
    pub fn report(self, reporter: &Reporter) -> error::ErasedReportedError {
        reporter.report(self.bare)
    }
}

pub type BareDiagnostic = Box<UnboxedBareDiagnostic>;

/// Highlights come first so that the derived ordering places diagnostics
/// close to source order when they sit in a sorted buffer.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
pub struct UnboxedBareDiagnostic {
    pub highlights: BTreeSet<Highlight>,
    pub path: Option<PathBuf>,
    pub subdiagnostics: Vec<Subdiagnostic>,
    pub code: Option<Code>,
    pub message: Option<Str>,
    pub severity: Severity,
}

impl UnboxedBareDiagnostic {
    fn new(severity: Severity) -> Self {
        Self {
            highlights: BTreeSet::new(),
            path: None,
            subdiagnostics: Vec::new(),
            code: None,
            message: None,
            severity,
        }
    }

    pub fn format(&self, map: Option<&SourceMap>) -> String {
        format::format(self, map)
    }
}

/// Part of a [complex error message](Diagnostic) providing extra text messages.
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord)]
pub struct Subdiagnostic {
    pub severity: Subseverity,
    pub message: Str,
}

/// Level of severity of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum Severity {
    /// An internal compiler error.
    Bug,
    /// A user error.
    Error,
    Warning,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum Subseverity {
    /// An auxiliary note.
    Note,
    /// A message containing steps to solve an issue.
    Help,
}

impl Subseverity {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Help => "help",
        }
    }
}

/// A highlighted code snippet.
#[derive(PartialEq, Eq, Debug, Clone, PartialOrd, Ord)]
pub struct Highlight {
    pub span: Span,
    pub role: Role,
    pub label: Option<Str>,
}

/// The role of a highlighted code snippet — focal point or auxiliary note.
#[derive(PartialEq, Eq, Debug, Clone, Copy, PartialOrd, Ord)]
pub enum Role {
    /// A focal point of the diagnostic.
    Primary,
    /// An auxiliary note of the diagnostic.
    Secondary,
}
