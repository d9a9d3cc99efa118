//! In-process auth provider for development and tests.
//!
//! Passwords are stored as salted SHA-256 digests. Provider rules mirror the
//! managed provider closely enough for the UI flows: emails are unique
//! (case-insensitive), passwords need at least six characters, and profile
//! updates require a signed-in session.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::domain::ports::{AuthProvider, AuthProviderError};
use crate::domain::{AuthStateChange, DisplayName, Email, SignInCredentials, User, UserId};

/// Shortest password the provider accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

const EVENT_BUFFER: usize = 64;

struct Account {
    user: User,
    salt: [u8; 16],
    digest: String,
}

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn email_key(email: &Email) -> String {
    email.as_ref().to_lowercase()
}

#[derive(Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    ids: HashMap<UserId, String>,
    sessions: HashSet<UserId>,
}

/// Auth provider holding accounts in memory.
pub struct MemoryAuthProvider {
    accounts: RwLock<Accounts>,
    events: broadcast::Sender<AuthStateChange>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            accounts: RwLock::new(Accounts::default()),
            events,
        }
    }

    fn emit(&self, change: AuthStateChange) {
        // No listeners is fine; events are only relevant to live sessions.
        let _ = self.events.send(change);
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<User, AuthProviderError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthProviderError::weak_password(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        let key = email_key(email);
        let user = {
            let mut accounts = self.accounts.write().await;
            if accounts.by_email.contains_key(&key) {
                return Err(AuthProviderError::EmailExists);
            }
            let id = UserId::new(Uuid::new_v4().simple().to_string())
                .map_err(|err| AuthProviderError::rejected(err.to_string()))?;
            let mut salt = [0_u8; 16];
            rand::thread_rng().fill_bytes(&mut salt);
            let user = User::new(id.clone(), Some(email.clone()), None);
            accounts.by_email.insert(
                key.clone(),
                Account {
                    user: user.clone(),
                    salt,
                    digest: digest(&salt, password),
                },
            );
            accounts.ids.insert(id.clone(), key);
            accounts.sessions.insert(id);
            user
        };
        self.emit(AuthStateChange::SignedIn(user.clone()));
        Ok(user)
    }

    async fn update_display_name(
        &self,
        user_id: &UserId,
        display_name: &DisplayName,
    ) -> Result<User, AuthProviderError> {
        let user = {
            let mut accounts = self.accounts.write().await;
            if !accounts.sessions.contains(user_id) {
                return Err(AuthProviderError::not_signed_in(user_id.to_string()));
            }
            let key = accounts
                .ids
                .get(user_id)
                .cloned()
                .ok_or_else(|| AuthProviderError::not_signed_in(user_id.to_string()))?;
            let account = accounts
                .by_email
                .get_mut(&key)
                .ok_or_else(|| AuthProviderError::not_signed_in(user_id.to_string()))?;
            account.user = account.user.clone().with_display_name(display_name.clone());
            account.user.clone()
        };
        self.emit(AuthStateChange::ProfileUpdated(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, credentials: &SignInCredentials) -> Result<User, AuthProviderError> {
        let user = {
            let mut accounts = self.accounts.write().await;
            let account = accounts
                .by_email
                .get(&email_key(credentials.email()))
                .ok_or(AuthProviderError::InvalidCredentials)?;
            if digest(&account.salt, credentials.password()) != account.digest {
                return Err(AuthProviderError::InvalidCredentials);
            }
            let user = account.user.clone();
            accounts.sessions.insert(user.id().clone());
            user
        };
        self.emit(AuthStateChange::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self, user_id: &UserId) -> Result<(), AuthProviderError> {
        let removed = self.accounts.write().await.sessions.remove(user_id);
        if !removed {
            return Err(AuthProviderError::not_signed_in(user_id.to_string()));
        }
        self.emit(AuthStateChange::SignedOut(user_id.clone()));
        Ok(())
    }

    fn auth_state_changes(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}
