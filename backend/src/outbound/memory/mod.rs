//! In-process adapters for development and tests.
//!
//! These implement the same driven ports as the Firebase adapters so the
//! service can run without external collaborators. State lives only as long
//! as the process.

mod auth;
mod store;

pub use auth::{MIN_PASSWORD_LEN, MemoryAuthProvider};
pub use store::MemoryStore;
