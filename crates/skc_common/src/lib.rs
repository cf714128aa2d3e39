//! Shared foundational types used across the skillc toolchain.
//!
//! This crate provides the SHA-256 content hash used to fingerprint artifact
//! inputs and outputs.

#![warn(missing_docs)]

pub mod hash;

pub use hash::{ContentHash, HashBuilder, ParseHashError};
