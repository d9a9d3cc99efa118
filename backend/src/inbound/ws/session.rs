//! Per-connection live session.
//!
//! Each connection owns one [`AppState`]. Client actions mutate it, after
//! which the open live queries are reconciled against
//! [`AppState::desired_subscriptions`]: subscriptions whose parameters no
//! longer match are closed and replacements opened. The public contract pings
//! every 5s and considers a connection idle after 10s without client traffic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use futures_util::StreamExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ports::LiveUpdates;
use crate::domain::{
    Answer, AppState, AuthStateChange, Error, Question, QuestionId, QuestionListQuery, Snapshot,
    Subscription, User,
};
use crate::inbound::http::session::LinkedSignIn;
use crate::inbound::ws::messages::{ClientMessage, ServerMessage};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// The cookie link this connection answers to and the feed of sign-ins.
pub(super) struct LinkListener {
    pub(super) link: String,
    pub(super) events: broadcast::Receiver<LinkedSignIn>,
}

pub(super) async fn handle_ws_session(
    live: Arc<dyn LiveUpdates>,
    feed_limit: usize,
    user: Option<User>,
    link: LinkListener,
    session: Session,
    stream: MessageStream,
) {
    LiveSession::new(live, feed_limit, link)
        .run(user, session, stream)
        .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

/// Something the session loop woke up for.
enum Wake {
    Heartbeat,
    Client(Option<Result<Message, ProtocolError>>),
    Questions(Option<Snapshot<Question>>),
    Answers(Option<Snapshot<Answer>>),
    Auth(Result<AuthStateChange, RecvError>),
    Linked(Result<LinkedSignIn, RecvError>),
}

type OpenQuery<K, T> = Option<(K, Subscription<T>)>;

async fn next_snapshot<K, T>(slot: &mut OpenQuery<K, T>) -> Option<Snapshot<T>> {
    match slot {
        Some((_, subscription)) => subscription.next().await,
        None => std::future::pending().await,
    }
}

async fn next_event<T: Clone>(events: &mut Option<broadcast::Receiver<T>>) -> Result<T, RecvError> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Unwrap a broadcast result, dropping the receiver once its sender is gone.
fn received<T>(slot: &mut Option<broadcast::Receiver<T>>, result: Result<T, RecvError>) -> Option<T> {
    match result {
        Ok(event) => Some(event),
        Err(RecvError::Lagged(skipped)) => {
            warn!(skipped, "live session missed events");
            None
        }
        Err(RecvError::Closed) => {
            *slot = None;
            None
        }
    }
}

fn close<K, T>(slot: &mut OpenQuery<K, T>) {
    if let Some((_, mut subscription)) = slot.take() {
        subscription.close();
    }
}

struct LiveSession {
    live: Arc<dyn LiveUpdates>,
    state: AppState,
    questions: OpenQuery<QuestionListQuery, Question>,
    answers: OpenQuery<QuestionId, Answer>,
    loaded: Vec<Question>,
    auth_events: Option<broadcast::Receiver<AuthStateChange>>,
    link: String,
    sign_ins: Option<broadcast::Receiver<LinkedSignIn>>,
}

impl LiveSession {
    fn new(live: Arc<dyn LiveUpdates>, feed_limit: usize, link: LinkListener) -> Self {
        let auth_events = Some(live.auth_events());
        Self {
            live,
            state: AppState::new(feed_limit),
            questions: None,
            answers: None,
            loaded: Vec::new(),
            auth_events,
            link: link.link,
            sign_ins: Some(link.events),
        }
    }

    async fn run(mut self, user: Option<User>, mut session: Session, mut stream: MessageStream) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        self.state.on_auth_changed(user);
        self.reconcile();
        let mut result = self.send_state(&mut session).await;

        while result.is_ok() {
            let wake = tokio::select! {
                _ = heartbeat.tick() => Wake::Heartbeat,
                message = stream.recv() => Wake::Client(message),
                snapshot = next_snapshot(&mut self.questions) => Wake::Questions(snapshot),
                snapshot = next_snapshot(&mut self.answers) => Wake::Answers(snapshot),
                change = next_event(&mut self.auth_events) => Wake::Auth(change),
                sign_in = next_event(&mut self.sign_ins) => Wake::Linked(sign_in),
            };
            result = self.handle_wake(&mut session, &mut last_heartbeat, wake).await;
        }

        close(&mut self.questions);
        close(&mut self.answers);
        if let Err(error) = result {
            log_shutdown_reason(&error);
            close_session_if_needed(session, close_action_for(&error)).await;
        }
    }

    async fn handle_wake(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        wake: Wake,
    ) -> Result<(), SessionError> {
        match wake {
            Wake::Heartbeat => {
                if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
                    return Err(SessionError::HeartbeatTimeout);
                }
                session.ping(b"").await.map_err(SessionError::Network)
            }
            Wake::Client(None) => Err(SessionError::StreamClosed),
            Wake::Client(Some(Err(error))) => Err(SessionError::Protocol(error)),
            Wake::Client(Some(Ok(message))) => {
                *last_heartbeat = Instant::now();
                self.handle_message(session, message).await
            }
            Wake::Questions(snapshot) => self.handle_questions(session, snapshot).await,
            Wake::Answers(snapshot) => self.handle_answers(session, snapshot).await,
            Wake::Auth(change) => self.handle_auth_event(session, change).await,
            Wake::Linked(sign_in) => self.handle_linked_sign_in(session, sign_in).await,
        }
    }

    async fn handle_message(
        &mut self,
        session: &mut Session,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => self.handle_text_message(session, text.as_ref()).await,
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &mut self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let action = match serde_json::from_str::<ClientMessage>(text) {
            Ok(action) => action,
            Err(error) => {
                warn!(error = %error, "Rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };
        debug!(?action, "live session action");
        if let Err(error) = self.apply(action) {
            send_json(session, &ServerMessage::from(&error))
                .await
                .map_err(SessionError::Network)?;
        }
        self.reconcile();
        self.send_state(session).await
    }

    fn apply(&mut self, action: ClientMessage) -> Result<(), Error> {
        match action {
            ClientMessage::Search { term } => self.state.search(term),
            ClientMessage::OpenQuestion { question_id } => {
                let id = QuestionId::new(question_id)
                    .map_err(|err| Error::invalid_request(format!("invalid question id: {err}")))?;
                if !self.state.select_question(&id, &self.loaded) {
                    return Err(Error::not_found("Question not found."));
                }
            }
            ClientMessage::BackToFeed => self.state.back_to_feed(),
            ClientMessage::AskQuestion => self.state.request_ask_question(),
            ClientMessage::Login => self.state.request_login(),
            ClientMessage::CloseModal => self.state.close_modal(),
        }
        Ok(())
    }

    /// Close subscriptions the view no longer needs and open missing ones.
    fn reconcile(&mut self) {
        let desired = self.state.desired_subscriptions();

        let keep_questions = matches!(
            (&desired.questions, &self.questions),
            (Some(wanted), Some((open, _))) if wanted == open
        );
        if !keep_questions {
            close(&mut self.questions);
            if let Some(query) = desired.questions {
                self.questions = Some((query.clone(), self.live.questions(query)));
            }
        }

        let keep_answers = matches!(
            (&desired.answers, &self.answers),
            (Some(wanted), Some((open, _))) if wanted == open
        );
        if !keep_answers {
            close(&mut self.answers);
            if let Some(question_id) = desired.answers {
                self.answers = Some((question_id.clone(), self.live.answers(question_id)));
            }
        }
    }

    async fn handle_questions(
        &mut self,
        session: &mut Session,
        snapshot: Option<Snapshot<Question>>,
    ) -> Result<(), SessionError> {
        let message = match snapshot {
            Some(Ok(questions)) => {
                self.loaded.clone_from(&questions);
                ServerMessage::Questions { questions }
            }
            Some(Err(error)) => ServerMessage::from(&error),
            None => {
                debug!("question subscription ended");
                self.questions = None;
                return Ok(());
            }
        };
        send_json(session, &message).await.map_err(SessionError::Network)
    }

    async fn handle_answers(
        &mut self,
        session: &mut Session,
        snapshot: Option<Snapshot<Answer>>,
    ) -> Result<(), SessionError> {
        let Some((question_id, _)) = &self.answers else {
            return Ok(());
        };
        let message = match snapshot {
            Some(Ok(answers)) => ServerMessage::Answers {
                question_id: question_id.clone(),
                answers,
            },
            Some(Err(error)) => ServerMessage::from(&error),
            None => {
                debug!("answer subscription ended");
                self.answers = None;
                return Ok(());
            }
        };
        send_json(session, &message).await.map_err(SessionError::Network)
    }

    /// Follow changes to this connection's user; other users' events are
    /// ignored.
    async fn handle_auth_event(
        &mut self,
        session: &mut Session,
        change: Result<AuthStateChange, RecvError>,
    ) -> Result<(), SessionError> {
        let Some(change) = received(&mut self.auth_events, change) else {
            return Ok(());
        };
        let concerns_us = self
            .state
            .user()
            .is_some_and(|user| user.id() == change.user_id());
        if !concerns_us {
            return Ok(());
        }
        info!(user_id = %change.user_id(), "live session user changed");
        self.state.apply_auth_event(&change);
        self.reconcile();
        self.send_state(session).await
    }

    /// Adopt a user who signed in over HTTP with this connection's cookie.
    async fn handle_linked_sign_in(
        &mut self,
        session: &mut Session,
        sign_in: Result<LinkedSignIn, RecvError>,
    ) -> Result<(), SessionError> {
        let Some(LinkedSignIn { link, user }) = received(&mut self.sign_ins, sign_in) else {
            return Ok(());
        };
        if link != self.link {
            return Ok(());
        }
        info!(user_id = %user.id(), "live session adopted cookie sign-in");
        self.state.on_auth_changed(Some(user));
        self.reconcile();
        self.send_state(session).await
    }

    async fn send_state(&self, session: &mut Session) -> Result<(), SessionError> {
        send_json(session, &ServerMessage::from(&self.state))
            .await
            .map_err(SessionError::Network)
    }
}

async fn send_json(session: &mut Session, payload: &ServerMessage) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "Failed to serialize WebSocket payload");
            Ok(())
        }
    }
}

fn log_shutdown_reason(error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => {
            warn!("WebSocket heartbeat timeout; closing connection");
        }
        SessionError::Protocol(error) => {
            warn!(error = %error, "WebSocket protocol error");
        }
        SessionError::Network(error) => {
            warn!(error = %error, "WebSocket send failed; closing connection");
        }
        SessionError::InvalidPayload | SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
    }
}

fn close_action_for(error: &SessionError) -> CloseAction {
    match error {
        SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("heartbeat timeout".to_owned()),
        })),
        SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Protocol,
            description: Some("protocol error".to_owned()),
        })),
        SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Policy,
            description: Some("invalid payload".to_owned()),
        })),
        SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
        SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
    }
}

async fn close_session_if_needed(session: Session, close_action: CloseAction) {
    if let CloseAction::Close(reason) = close_action {
        if let Err(error) = session.close(reason).await {
            warn!(error = %error, "Failed to close WebSocket session");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
