//! Live-session service backing [`LiveUpdates`].

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::domain::ports::{AuthProvider, LiveQueries, LiveUpdates};
use crate::domain::{Answer, AuthStateChange, Question, QuestionId, QuestionListQuery, Subscription};

/// Forwards live queries and auth events to inbound live adapters.
pub struct LiveService<L: ?Sized, P: ?Sized> {
    queries: Arc<L>,
    provider: Arc<P>,
}

impl<L: ?Sized, P: ?Sized> LiveService<L, P> {
    pub fn new(queries: Arc<L>, provider: Arc<P>) -> Self {
        Self { queries, provider }
    }
}

impl<L, P> LiveUpdates for LiveService<L, P>
where
    L: LiveQueries + ?Sized,
    P: AuthProvider + ?Sized,
{
    fn questions(&self, query: QuestionListQuery) -> Subscription<Question> {
        tracing::debug!(?query, "opening question subscription");
        self.queries.subscribe_questions(query)
    }

    fn answers(&self, question_id: QuestionId) -> Subscription<Answer> {
        tracing::debug!(%question_id, "opening answer subscription");
        self.queries.subscribe_answers(question_id)
    }

    fn auth_events(&self) -> broadcast::Receiver<AuthStateChange> {
        self.provider.auth_state_changes()
    }
}
