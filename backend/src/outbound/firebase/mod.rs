//! Firebase adapters: Firestore documents and Identity Toolkit accounts.
//!
//! Both talk to the public REST endpoints with the project's web API key.
//! Firestore access is therefore governed by the project's security rules.

mod firestore;
mod identity;
mod query;
mod store;
mod value;

use std::time::Duration;

use reqwest::Client;
use zeroize::Zeroizing;

pub use identity::FirebaseAuthProvider;
pub use store::FirestoreStore;

/// Connection settings shared by the Firebase adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_key: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub firestore_endpoint: String,
    pub identity_endpoint: String,
}

impl FirebaseConfig {
    /// Settings pointing at the public Google endpoints.
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            firestore_endpoint: firestore::DEFAULT_FIRESTORE_ENDPOINT.to_owned(),
            identity_endpoint: identity::DEFAULT_IDENTITY_ENDPOINT.to_owned(),
        }
    }
}

/// Build the store and auth provider over one shared HTTP client.
///
/// # Errors
///
/// Returns the client builder error when TLS setup fails.
pub fn connect(
    config: &FirebaseConfig,
) -> Result<(FirestoreStore, FirebaseAuthProvider), reqwest::Error> {
    let http = Client::builder().timeout(config.request_timeout).build()?;
    let client = firestore::FirestoreClient::new(
        http.clone(),
        &config.firestore_endpoint,
        &config.project_id,
        Zeroizing::new(config.api_key.clone()),
    );
    let store = FirestoreStore::new(client, config.poll_interval);
    let auth = FirebaseAuthProvider::new(
        http,
        &config.identity_endpoint,
        Zeroizing::new(config.api_key.clone()),
    );
    Ok((store, auth))
}
