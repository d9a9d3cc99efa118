//! Gemini outbound adapter.
//!
//! Thin reqwest implementation of the `AnswerGenerator` port.

mod dto;
mod http_generator;

pub use http_generator::{
    DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, GeminiHttpGenerator, GeminiSetupError,
};
