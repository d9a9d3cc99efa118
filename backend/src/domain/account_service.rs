//! Account service: sign-up, sign-in and sign-out through the auth provider.
//!
//! Provider messages are shown to the user unchanged. Sign-up is two provider
//! calls (create, then set the display name); if the second fails the account
//! still exists and the error is surfaced.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::domain::ports::{AccountCommand, AuthProvider, AuthProviderError};
use crate::domain::{Error, SignInCredentials, SignUpCredentials, User, UserId};

/// Account service implementing [`AccountCommand`].
pub struct AccountService<P: ?Sized> {
    provider: Arc<P>,
}

impl<P: ?Sized> Clone for AccountService<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: ?Sized> AccountService<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

fn map_provider_error(err: AuthProviderError) -> Error {
    match err {
        AuthProviderError::InvalidCredentials | AuthProviderError::NotSignedIn { .. } => {
            Error::unauthorized(err.to_string())
        }
        AuthProviderError::EmailExists
        | AuthProviderError::InvalidEmail
        | AuthProviderError::WeakPassword { .. }
        | AuthProviderError::Rejected { .. } => Error::invalid_request(err.to_string()),
        AuthProviderError::Connection { message } => {
            error!(error = %message, "auth provider unavailable");
            Error::service_unavailable("Authentication is unavailable. Please try again.")
        }
    }
}

#[async_trait]
impl<P> AccountCommand for AccountService<P>
where
    P: AuthProvider + ?Sized,
{
    async fn sign_up(&self, credentials: SignUpCredentials) -> Result<User, Error> {
        let created = self
            .provider
            .create_account(credentials.email(), credentials.password())
            .await
            .map_err(map_provider_error)?;
        let user = self
            .provider
            .update_display_name(created.id(), credentials.display_name())
            .await
            .map_err(|err| {
                warn!(user_id = %created.id(), error = %err, "display name update failed after sign-up");
                map_provider_error(err)
            })?;
        info!(user_id = %user.id(), "account created");
        Ok(user)
    }

    async fn sign_in(&self, credentials: SignInCredentials) -> Result<User, Error> {
        let user = self
            .provider
            .sign_in(&credentials)
            .await
            .map_err(map_provider_error)?;
        info!(user_id = %user.id(), "user signed in");
        Ok(user)
    }

    async fn sign_out(&self, user_id: &UserId) -> Result<(), Error> {
        match self.provider.sign_out(user_id).await {
            Ok(()) | Err(AuthProviderError::NotSignedIn { .. }) => {
                info!(user_id = %user_id, "user signed out");
                Ok(())
            }
            Err(err) => Err(map_provider_error(err)),
        }
    }
}
