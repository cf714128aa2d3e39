//! Spec-source plugins and the registry that merges them into one IR.
//!
//! Each [`SpecPlugin`] turns one kind of source into an
//! [`IntermediateRepr`](skc_ir::IntermediateRepr) fragment through four
//! stages: detect, fetch, parse, validate. The [`Registry`] picks the first
//! plugin whose `detect` accepts a source, runs the remaining stages, and
//! merges fragments in source order. Fetch and parse failures abort the
//! whole run; validation findings are collected as warnings.

#![warn(missing_docs)]

pub mod cli;
pub mod codebase;
pub mod error;
pub mod help;
pub mod openapi;
pub mod plugin;
pub mod registry;

pub use error::{PluginError, SpecError};
pub use plugin::{Plugin, SpecPlugin};
pub use registry::{Processed, Registry};
