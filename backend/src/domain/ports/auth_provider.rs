//! Driven port for the external identity provider.
//!
//! Provider failures carry messages that are safe to show to the user; the
//! account service surfaces them verbatim.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{AuthStateChange, DisplayName, Email, SignInCredentials, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by auth provider adapters.
    pub enum AuthProviderError {
        /// Email and password did not match an account.
        InvalidCredentials => "Invalid email or password.",
        /// Sign-up used an email that already has an account.
        EmailExists => "An account with this email already exists.",
        /// The provider rejected the email address.
        InvalidEmail => "Please enter a valid email address.",
        /// The provider rejected the password.
        WeakPassword { message: String } => "{message}",
        /// The user is not signed in with this provider instance.
        NotSignedIn { id: String } => "User {id} is not signed in.",
        /// Any other rejection reported by the provider.
        Rejected { message: String } => "{message}",
        /// The provider could not be reached.
        Connection { message: String } => "auth provider unavailable: {message}",
    }
}

/// Port for account creation, sign-in and current-user notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account and sign it in. The returned user has no display
    /// name yet.
    async fn create_account(&self, email: &Email, password: &str)
    -> Result<User, AuthProviderError>;

    /// Set the display name of a signed-in user and return the updated
    /// profile.
    async fn update_display_name(
        &self,
        user_id: &UserId,
        display_name: &DisplayName,
    ) -> Result<User, AuthProviderError>;

    /// Sign in with email and password.
    async fn sign_in(&self, credentials: &SignInCredentials) -> Result<User, AuthProviderError>;

    /// End the user's provider session.
    async fn sign_out(&self, user_id: &UserId) -> Result<(), AuthProviderError>;

    /// Stream of current-user changes.
    fn auth_state_changes(&self) -> broadcast::Receiver<AuthStateChange>;
}
