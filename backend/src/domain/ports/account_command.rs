//! Driving port for sign-up, sign-in and sign-out.

use async_trait::async_trait;

use crate::domain::{Error, SignInCredentials, SignUpCredentials, User, UserId};

/// Account use-cases consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account and set its display name.
    async fn sign_up(&self, credentials: SignUpCredentials) -> Result<User, Error>;

    /// Sign in with email and password.
    async fn sign_in(&self, credentials: SignInCredentials) -> Result<User, Error>;

    /// End the user's provider session.
    async fn sign_out(&self, user_id: &UserId) -> Result<(), Error>;
}
