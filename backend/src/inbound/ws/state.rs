//! Shared WebSocket adapter state.
//!
//! WebSocket entry points depend on the [`LiveUpdates`] port rather than on
//! stores, so sessions can be driven by test doubles.

use std::sync::Arc;

use url::{Origin, Url};

use crate::domain::ports::LiveUpdates;
use crate::inbound::http::session::SessionLinks;

/// Origin allow-list entry that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid WebSocket origin `{entry}`: {reason}")]
pub struct OriginParseError {
    entry: String,
    reason: String,
}

impl OriginParseError {
    fn new(entry: &str, reason: impl ToString) -> Self {
        Self {
            entry: entry.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Origins permitted to open a live session.
///
/// Entries are full origins (`https://app.example.com`,
/// `http://localhost:3000`) or a scheme plus wildcard subdomain
/// (`https://*.example.com`), which matches subdomains but not the apex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedOrigins {
    exact: Vec<Origin>,
    wildcard: Vec<(String, String)>,
}

impl AllowedOrigins {
    /// Parse allow-list entries.
    ///
    /// # Examples
    /// ```
    /// use quorum::inbound::ws::state::AllowedOrigins;
    /// use url::Url;
    ///
    /// let allowed = AllowedOrigins::parse(["https://*.example.com"]).unwrap();
    /// assert!(allowed.allows(&Url::parse("https://app.example.com").unwrap()));
    /// assert!(!allowed.allows(&Url::parse("https://example.com").unwrap()));
    /// ```
    pub fn parse<I, S>(entries: I) -> Result<Self, OriginParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if let Some((scheme, host)) = entry.split_once("://*.") {
                if scheme.is_empty() || host.is_empty() || host.contains(['/', ':']) {
                    return Err(OriginParseError::new(entry, "malformed wildcard"));
                }
                allowed
                    .wildcard
                    .push((scheme.to_ascii_lowercase(), format!(".{}", host.to_ascii_lowercase())));
                continue;
            }
            let url = Url::parse(entry).map_err(|err| OriginParseError::new(entry, err))?;
            let origin = url.origin();
            if !origin.is_tuple() {
                return Err(OriginParseError::new(entry, "opaque origin"));
            }
            allowed.exact.push(origin);
        }
        Ok(allowed)
    }

    /// Whether `origin` may connect.
    pub fn allows(&self, origin: &Url) -> bool {
        if self.exact.contains(&origin.origin()) {
            return true;
        }
        let Some(host) = origin.host_str() else {
            return false;
        };
        self.wildcard.iter().any(|(scheme, suffix)| {
            origin.scheme() == scheme
                && host
                    .strip_suffix(suffix.as_str())
                    .is_some_and(|label| !label.is_empty())
        })
    }
}

/// Dependency bundle for the WebSocket endpoint and its sessions.
#[derive(Clone)]
pub struct WsState {
    pub live: Arc<dyn LiveUpdates>,
    pub feed_limit: usize,
    pub allowed_origins: Arc<AllowedOrigins>,
    pub session_links: SessionLinks,
}

impl WsState {
    pub fn new(live: Arc<dyn LiveUpdates>, feed_limit: usize, allowed_origins: AllowedOrigins) -> Self {
        Self {
            live,
            feed_limit,
            allowed_origins: Arc::new(allowed_origins),
            session_links: SessionLinks::new(),
        }
    }

    #[must_use]
    pub fn with_session_links(mut self, links: SessionLinks) -> Self {
        self.session_links = links;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn allowed() -> AllowedOrigins {
        AllowedOrigins::parse(["http://localhost:3000", "https://*.quorum.example"])
            .expect("allow-list")
    }

    #[rstest]
    #[case("http://localhost:3000", true)]
    #[case("http://localhost:3000/", true)]
    #[case("http://localhost:4000", false)]
    #[case("https://localhost:3000", false)]
    #[case("https://app.quorum.example", true)]
    #[case("https://quorum.example", false)]
    #[case("http://app.quorum.example", false)]
    #[case("https://quorum.example.evil.com", false)]
    fn evaluates_allow_list(#[case] origin: &str, #[case] expected: bool) {
        let parsed = Url::parse(origin).expect("url");
        assert_eq!(allowed().allows(&parsed), expected);
    }

    #[rstest]
    #[case("not a url")]
    #[case("https://*./")]
    #[case("data:text/plain,hi")]
    fn rejects_malformed_entries(#[case] entry: &str) {
        assert!(AllowedOrigins::parse([entry]).is_err());
    }
}
