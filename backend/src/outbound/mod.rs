//! Outbound adapters implementing the driven ports.

pub mod firebase;
pub mod gemini;
pub mod live;
pub mod memory;
