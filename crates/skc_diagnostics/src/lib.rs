//! Diagnostic creation, severity management, and terminal rendering.
//!
//! Spec plugins and the instructions validator report non-fatal problems as
//! structured [`Diagnostic`] values. The thread-safe [`DiagnosticSink`]
//! accumulates them across sources, and [`TerminalRenderer`] formats them for
//! stderr.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
