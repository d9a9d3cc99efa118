//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::DEFAULT_FEED_LIMIT;
use crate::domain::ports::{
    AccountCommand, AnswersCommand, AnswersQuery, QuestionsCommand, QuestionsQuery,
};
use crate::inbound::http::session::SessionLinks;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountCommand>,
    pub questions: Arc<dyn QuestionsCommand>,
    pub questions_query: Arc<dyn QuestionsQuery>,
    pub answers: Arc<dyn AnswersCommand>,
    pub answers_query: Arc<dyn AnswersQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub questions: Arc<dyn QuestionsCommand>,
    pub questions_query: Arc<dyn QuestionsQuery>,
    pub answers: Arc<dyn AnswersCommand>,
    pub answers_query: Arc<dyn AnswersQuery>,
    /// Maximum number of questions returned by the feed and by searches.
    pub feed_limit: usize,
    /// Sign-ins announced to live sockets sharing the cookie.
    pub session_links: SessionLinks,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports, DEFAULT_FEED_LIMIT)
    }
}

impl HttpState {
    /// Construct state from a ports bundle and the feed size.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use quorum::domain::ports::UnconfiguredAnswerGenerator;
    /// use quorum::domain::{AccountService, AnswerService, QuestionService};
    /// use quorum::inbound::http::state::{HttpState, HttpStatePorts};
    /// use quorum::outbound::memory::{MemoryAuthProvider, MemoryStore};
    ///
    /// let store = Arc::new(MemoryStore::new(Arc::new(DefaultClock)));
    /// let questions = Arc::new(QuestionService::new(store.clone()));
    /// let answers = Arc::new(AnswerService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     Arc::new(UnconfiguredAnswerGenerator),
    /// ));
    /// let state = HttpState::new(
    ///     HttpStatePorts {
    ///         accounts: Arc::new(AccountService::new(Arc::new(MemoryAuthProvider::default()))),
    ///         questions: questions.clone(),
    ///         questions_query: questions,
    ///         answers: answers.clone(),
    ///         answers_query: answers,
    ///     },
    ///     20,
    /// );
    /// assert_eq!(state.feed_limit, 20);
    /// ```
    pub fn new(ports: HttpStatePorts, feed_limit: usize) -> Self {
        let HttpStatePorts {
            accounts,
            questions,
            questions_query,
            answers,
            answers_query,
        } = ports;
        Self {
            accounts,
            questions,
            questions_query,
            answers,
            answers_query,
            feed_limit,
            session_links: SessionLinks::new(),
        }
    }

    /// Share `links` with the WebSocket state so live sockets hear about
    /// sign-ins made over HTTP.
    #[must_use]
    pub fn with_session_links(mut self, links: SessionLinks) -> Self {
        self.session_links = links;
        self
    }
}
