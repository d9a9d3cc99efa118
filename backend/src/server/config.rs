//! Application settings and the server configuration object.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;

use quorum::domain::DEFAULT_FEED_LIMIT;
use quorum::inbound::http::session_config::SessionSettings;
use quorum::inbound::ws::state::{AllowedOrigins, OriginParseError};
use quorum::outbound::firebase::FirebaseConfig;
use quorum::outbound::gemini::DEFAULT_GEMINI_MODEL;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_WS_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Which adapters back the document store and auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store; data lives as long as the process.
    Memory,
    /// Cloud Firestore and Identity Toolkit.
    Firebase(FirebaseConfig),
}

/// Errors raised while interpreting [`AppSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address `{value}`: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("unknown store backend `{0}`; expected memory|firebase")]
    UnknownBackend(String),
    #[error("the firebase backend requires QUORUM_FIREBASE_PROJECT_ID and QUORUM_FIREBASE_API_KEY")]
    MissingFirebaseCredentials,
    #[error("feed limit must be positive")]
    ZeroFeedLimit,
    #[error("poll interval must be at least 1 ms")]
    ZeroPollInterval,
    #[error(transparent)]
    Origin(#[from] OriginParseError),
}

/// Process settings loaded via OrthoConfig from `QUORUM_*` variables, CLI
/// flags, or a config file.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "QUORUM")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// `memory` (default) or `firebase`.
    pub backend: Option<String>,
    /// Firebase project id.
    pub firebase_project_id: Option<String>,
    /// Firebase web API key.
    pub firebase_api_key: Option<String>,
    /// Gemini API key; AI answers explain they are unavailable when absent.
    pub gemini_api_key: Option<String>,
    /// Gemini model name.
    pub gemini_model: Option<String>,
    /// Maximum number of questions in the feed and search results.
    pub feed_limit: Option<usize>,
    /// Firestore live-query poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Comma-separated WebSocket origin allow-list.
    pub ws_origins: Option<String>,
}

impl AppSettings {
    /// Parse the bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn feed_limit(&self) -> Result<usize, SettingsError> {
        match self.feed_limit {
            Some(0) => Err(SettingsError::ZeroFeedLimit),
            Some(limit) => Ok(limit),
            None => Ok(DEFAULT_FEED_LIMIT),
        }
    }

    /// Firestore poll interval; zero is rejected.
    pub fn poll_interval(&self) -> Result<Duration, SettingsError> {
        match self.poll_interval_ms {
            Some(0) => Err(SettingsError::ZeroPollInterval),
            Some(ms) => Ok(Duration::from_millis(ms)),
            None => Ok(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)),
        }
    }

    /// Resolve the store backend, requiring credentials for Firebase.
    pub fn store_backend(&self) -> Result<StoreBackend, SettingsError> {
        let backend = self
            .backend
            .as_deref()
            .map_or_else(|| "memory".to_owned(), |raw| raw.trim().to_ascii_lowercase());
        match backend.as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "firebase" => {
                let (Some(project), Some(key)) = (
                    non_blank(self.firebase_project_id.as_deref()),
                    non_blank(self.firebase_api_key.as_deref()),
                ) else {
                    return Err(SettingsError::MissingFirebaseCredentials);
                };
                let mut config = FirebaseConfig::new(project, key);
                config.poll_interval = self.poll_interval()?;
                Ok(StoreBackend::Firebase(config))
            }
            _ => Err(SettingsError::UnknownBackend(backend)),
        }
    }

    /// Gemini credential, if one is configured.
    pub fn gemini_api_key(&self) -> Option<&str> {
        non_blank(self.gemini_api_key.as_deref())
    }

    pub fn gemini_model(&self) -> &str {
        non_blank(self.gemini_model.as_deref()).unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn allowed_origins(&self) -> Result<AllowedOrigins, SettingsError> {
        let raw = self.ws_origins.as_deref().unwrap_or(DEFAULT_WS_ORIGINS);
        let entries = raw.split(',').map(str::trim).filter(|entry| !entry.is_empty());
        Ok(AllowedOrigins::parse(entries)?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) session_ttl: Duration,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) backend: StoreBackend,
    pub(crate) gemini_api_key: Option<String>,
    pub(crate) gemini_model: String,
    pub(crate) feed_limit: usize,
    pub(crate) allowed_origins: AllowedOrigins,
}

impl ServerConfig {
    /// Construct a configuration from validated session settings and the
    /// application settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when any application setting is invalid.
    pub fn new(session: SessionSettings, settings: &AppSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            key: session.key,
            cookie_secure: session.cookie_secure,
            same_site: session.same_site,
            session_ttl: session.max_age,
            bind_addr: settings.bind_addr()?,
            backend: settings.store_backend()?,
            gemini_api_key: settings.gemini_api_key().map(str::to_owned),
            gemini_model: settings.gemini_model().to_owned(),
            feed_limit: settings.feed_limit()?,
            allowed_origins: settings.allowed_origins()?,
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
