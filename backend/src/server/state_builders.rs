//! Builders wiring outbound adapters into the HTTP and WebSocket state.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};

use quorum::domain::ports::{
    AnswerGenerator, AnswerRepository, AuthProvider, LiveQueries, QuestionRepository,
    UnconfiguredAnswerGenerator,
};
use quorum::domain::{AccountService, AnswerService, LiveService, QuestionService};
use quorum::inbound::http::session::SessionLinks;
use quorum::inbound::http::state::{HttpState, HttpStatePorts};
use quorum::inbound::ws::state::WsState;
use quorum::outbound::firebase;
use quorum::outbound::gemini::{DEFAULT_GEMINI_ENDPOINT, GeminiHttpGenerator};
use quorum::outbound::memory::{MemoryAuthProvider, MemoryStore};

use super::{ServerConfig, StoreBackend};

const GEMINI_TIMEOUT: Duration = Duration::from_secs(30);

/// Driven-port implementations selected by configuration.
pub(crate) struct Adapters {
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    live: Arc<dyn LiveQueries>,
    auth: Arc<dyn AuthProvider>,
    generator: Arc<dyn AnswerGenerator>,
    session_links: SessionLinks,
}

fn build_store(
    backend: &StoreBackend,
    generator: Arc<dyn AnswerGenerator>,
) -> std::io::Result<Adapters> {
    match backend {
        StoreBackend::Memory => {
            info!("using in-process store and auth provider");
            let store = Arc::new(MemoryStore::new(Arc::new(DefaultClock)));
            Ok(Adapters {
                questions: store.clone(),
                answers: store.clone(),
                live: store,
                auth: Arc::new(MemoryAuthProvider::new()),
                generator,
                session_links: SessionLinks::new(),
            })
        }
        StoreBackend::Firebase(config) => {
            info!(project = %config.project_id, "using Firebase store and auth provider");
            let (store, auth) = firebase::connect(config).map_err(|err| {
                std::io::Error::other(format!("failed to build Firebase client: {err}"))
            })?;
            let store = Arc::new(store);
            Ok(Adapters {
                questions: store.clone(),
                answers: store.clone(),
                live: store,
                auth: Arc::new(auth),
                generator,
                session_links: SessionLinks::new(),
            })
        }
    }
}

fn build_generator(api_key: Option<&str>, model: &str) -> std::io::Result<Arc<dyn AnswerGenerator>> {
    let Some(api_key) = api_key else {
        warn!("no Gemini API key configured; AI answers will report that they are unavailable");
        return Ok(Arc::new(UnconfiguredAnswerGenerator));
    };
    let generator = GeminiHttpGenerator::new(DEFAULT_GEMINI_ENDPOINT, model, api_key, GEMINI_TIMEOUT)
        .map_err(|err| std::io::Error::other(format!("failed to build Gemini client: {err}")))?;
    info!(model, "AI answers enabled");
    Ok(Arc::new(generator))
}

/// Select adapters for the configured backend and AI credential.
///
/// # Errors
///
/// Returns [`std::io::Error`] when an HTTP client cannot be constructed.
pub(crate) fn build_adapters(config: &ServerConfig) -> std::io::Result<Adapters> {
    let generator = build_generator(config.gemini_api_key.as_deref(), &config.gemini_model)?;
    build_store(&config.backend, generator)
}

/// Build the HTTP handler state from the selected adapters.
pub(crate) fn build_http_state(adapters: &Adapters, feed_limit: usize) -> web::Data<HttpState> {
    let questions = Arc::new(QuestionService::new(adapters.questions.clone()));
    let answers = Arc::new(AnswerService::new(
        adapters.questions.clone(),
        adapters.answers.clone(),
        adapters.generator.clone(),
    ));
    let accounts = Arc::new(AccountService::new(adapters.auth.clone()));
    web::Data::new(
        HttpState::new(
            HttpStatePorts {
                accounts,
                questions: questions.clone(),
                questions_query: questions,
                answers: answers.clone(),
                answers_query: answers,
            },
            feed_limit,
        )
        .with_session_links(adapters.session_links.clone()),
    )
}

/// Build the WebSocket state from the selected adapters.
pub(crate) fn build_ws_state(adapters: &Adapters, config: &ServerConfig) -> web::Data<WsState> {
    let live = LiveService::new(adapters.live.clone(), adapters.auth.clone());
    web::Data::new(
        WsState::new(
            Arc::new(live),
            config.feed_limit,
            config.allowed_origins.clone(),
        )
        .with_session_links(adapters.session_links.clone()),
    )
}
