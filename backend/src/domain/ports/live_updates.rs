//! Driving port for live sessions.
//!
//! Live adapters (the WebSocket endpoint) open snapshot streams and follow
//! auth changes through this port.

use tokio::sync::broadcast;

use crate::domain::{Answer, AuthStateChange, Question, QuestionId, QuestionListQuery, Subscription};

/// Live-session use-cases consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
pub trait LiveUpdates: Send + Sync {
    /// Open a live question list.
    fn questions(&self, query: QuestionListQuery) -> Subscription<Question>;

    /// Open a live answer list for one question.
    fn answers(&self, question_id: QuestionId) -> Subscription<Answer>;

    /// Follow current-user changes.
    fn auth_events(&self) -> broadcast::Receiver<AuthStateChange>;
}
