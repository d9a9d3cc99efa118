//! Firebase Authentication via the Identity Toolkit REST API.
//!
//! The provider keeps the id token of every user signed in through this
//! process so that profile updates can be authorised later. Signing out
//! forgets the token; Identity Toolkit has no server-side sign-out call.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use tracing::warn;
use zeroize::Zeroizing;

use crate::domain::ports::{AuthProvider, AuthProviderError};
use crate::domain::{AuthStateChange, DisplayName, Email, SignInCredentials, User, UserId};

pub(super) const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";

const EVENT_BUFFER: usize = 64;
const DEFAULT_WEAK_PASSWORD: &str = "Password should be at least 6 characters.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

impl AccountResponse {
    fn into_user(self) -> Result<(User, Option<String>), AuthProviderError> {
        let id = UserId::new(self.local_id)
            .map_err(|err| AuthProviderError::rejected(err.to_string()))?;
        // Profiles created elsewhere may not satisfy local validation; drop
        // what does not parse rather than failing the sign-in.
        let email = self.email.and_then(|raw| Email::new(raw).ok());
        let display_name = self
            .display_name
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| DisplayName::new(raw).ok());
        Ok((User::new(id, email, display_name), self.id_token))
    }
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Map an Identity Toolkit error code onto a user-facing provider error.
///
/// Codes arrive as `CODE` or `CODE : detail`.
fn map_error_code(raw: &str) -> AuthProviderError {
    let (code, detail) = match raw.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (raw.trim(), None),
    };
    match code {
        "EMAIL_EXISTS" => AuthProviderError::EmailExists,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "EMAIL_NOT_FOUND" => {
            AuthProviderError::InvalidCredentials
        }
        "INVALID_EMAIL" => AuthProviderError::InvalidEmail,
        "WEAK_PASSWORD" => AuthProviderError::weak_password(
            detail
                .filter(|text| !text.is_empty())
                .unwrap_or(DEFAULT_WEAK_PASSWORD),
        ),
        "USER_DISABLED" => AuthProviderError::rejected("This account has been disabled."),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            AuthProviderError::rejected("Too many attempts. Please try again later.")
        }
        "OPERATION_NOT_ALLOWED" => {
            AuthProviderError::rejected("Email and password sign-in is disabled.")
        }
        other => AuthProviderError::rejected(format!("Authentication failed ({other}).")),
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AuthProviderError {
    if status.is_server_error() {
        return AuthProviderError::connection(format!("identity toolkit returned {status}"));
    }
    match serde_json::from_slice::<ApiErrorEnvelope>(body) {
        Ok(envelope) => map_error_code(&envelope.error.message),
        Err(_) => AuthProviderError::rejected(format!("Authentication failed ({status}).")),
    }
}

/// Auth provider backed by Firebase Authentication.
pub struct FirebaseAuthProvider {
    http: Client,
    accounts_url: String,
    api_key: Zeroizing<String>,
    tokens: RwLock<HashMap<UserId, Zeroizing<String>>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl FirebaseAuthProvider {
    pub(super) fn new(http: Client, endpoint: &str, api_key: Zeroizing<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            http,
            accounts_url: format!("{}/v1/accounts", endpoint.trim_end_matches('/')),
            api_key,
            tokens: RwLock::new(HashMap::new()),
            events,
        }
    }

    async fn call<B: Serialize + Sync>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<AccountResponse, AuthProviderError> {
        let response = self
            .http
            .post(format!("{}:{operation}", self.accounts_url))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| AuthProviderError::connection(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AuthProviderError::connection(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        serde_json::from_slice(bytes.as_ref()).map_err(|err| {
            warn!(error = %err, operation, "identity toolkit response did not parse");
            AuthProviderError::connection(format!("malformed identity response: {err}"))
        })
    }

    async fn remember(&self, user: &User, token: Option<String>) {
        if let Some(token) = token {
            self.tokens
                .write()
                .await
                .insert(user.id().clone(), Zeroizing::new(token));
        }
    }

    fn emit(&self, change: AuthStateChange) {
        let _ = self.events.send(change);
    }

    async fn password_call(
        &self,
        operation: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthProviderError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let (user, token) = self.call(operation, &request).await?.into_user()?;
        self.remember(&user, token).await;
        self.emit(AuthStateChange::SignedIn(user.clone()));
        Ok(user)
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuthProvider {
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<User, AuthProviderError> {
        self.password_call("signUp", email.as_ref(), password).await
    }

    async fn update_display_name(
        &self,
        user_id: &UserId,
        display_name: &DisplayName,
    ) -> Result<User, AuthProviderError> {
        let token = self
            .tokens
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| AuthProviderError::not_signed_in(user_id.to_string()))?;
        let request = UpdateProfileRequest {
            id_token: token.as_str(),
            display_name: display_name.as_ref(),
            return_secure_token: true,
        };
        let response = match self.call("update", &request).await {
            Err(AuthProviderError::Rejected { message })
                if message.contains("INVALID_ID_TOKEN") || message.contains("TOKEN_EXPIRED") =>
            {
                self.tokens.write().await.remove(user_id);
                return Err(AuthProviderError::not_signed_in(user_id.to_string()));
            }
            other => other?,
        };
        let (user, refreshed) = response.into_user()?;
        self.remember(&user, refreshed).await;
        self.emit(AuthStateChange::ProfileUpdated(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, credentials: &SignInCredentials) -> Result<User, AuthProviderError> {
        self.password_call(
            "signInWithPassword",
            credentials.email().as_ref(),
            credentials.password(),
        )
        .await
    }

    async fn sign_out(&self, user_id: &UserId) -> Result<(), AuthProviderError> {
        if self.tokens.write().await.remove(user_id).is_none() {
            return Err(AuthProviderError::not_signed_in(user_id.to_string()));
        }
        self.emit(AuthStateChange::SignedOut(user_id.clone()));
        Ok(())
    }

    fn auth_state_changes(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}
