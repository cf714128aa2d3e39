//! Structured diagnostic messages with severity, codes, and locations.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured diagnostic message.
///
/// The location is free-form because spec sources have no shared notion of a
/// span: an OpenAPI finding points at `GET /users`, a CLI finding at the
/// command line, an instructions finding at a section name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Where the issue was found, if it can be named.
    pub location: Option<String>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
    /// Actionable suggestions.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message)
    }

    /// Sets the location of this diagnostic.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_warning() {
        let code = DiagnosticCode::new(Category::Source, 101);
        let diag = Diagnostic::warning(code, "missing description");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.message, "missing description");
        assert!(diag.location.is_none());
    }

    #[test]
    fn display_with_location() {
        let code = DiagnosticCode::new(Category::Source, 101);
        let diag = Diagnostic::warning(code, "missing description").at("GET /users");
        assert_eq!(diag.to_string(), "GET /users: missing description");
    }

    #[test]
    fn display_without_location() {
        let code = DiagnosticCode::new(Category::Instructions, 1);
        let diag = Diagnostic::warning(code, "no Product section");
        assert_eq!(diag.to_string(), "no Product section");
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Error, 1);
        let diag = Diagnostic::error(code, "bad")
            .with_note("context")
            .with_help("fix it");
        assert_eq!(diag.notes, vec!["context"]);
        assert_eq!(diag.help, vec!["fix it"]);
    }
}
