//! The intermediate representation shared by every spec source.
//!
//! Spec plugins normalize OpenAPI documents, CLI help trees, and codebase
//! scans into an [`IntermediateRepr`] fragment. The registry merges fragments
//! in source order into one aggregate IR, and the pipeline fingerprints its
//! canonical JSON form.

#![warn(missing_docs)]

pub mod auth;
pub mod ir;
pub mod operation;
pub mod project;
pub mod types;

pub use auth::AuthScheme;
pub use ir::{Group, IntermediateRepr};
pub use operation::{Operation, Parameter, RequestBody, Response};
pub use project::{Excerpt, FileEntry, KeyFile, ProjectStructure, StackInfo};
pub use types::{TypeDef, TypeField};
