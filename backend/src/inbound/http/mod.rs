//! HTTP inbound adapter exposing REST endpoints.

pub mod answers;
pub mod auth;
pub mod error;
pub mod health;
pub mod questions;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::{ApiResult, json_error_handler};
