//! Text-generation providers.
//!
//! The pipeline talks to a [`Provider`] only through [`GenerateRequest`] and
//! [`GenerateResponse`]. Two HTTP implementations ship: [`AnthropicProvider`]
//! (Messages API) and [`OpenAiProvider`] (Chat Completions, also used for
//! compatible self-hosted endpoints). [`build`] picks one from resolved
//! settings.

#![warn(missing_docs)]

pub mod anthropic;
pub mod error;
pub mod factory;
pub mod openai;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use error::ProviderError;
pub use factory::{build, DEFAULT_ANTHROPIC_MODEL, DEFAULT_OPENAI_MODEL};
pub use openai::OpenAiProvider;
pub use provider::{GenerateRequest, GenerateResponse, Provider};
