//! Driven port for live (continuously updated) queries.
//!
//! Each call opens a [`Subscription`] whose first item is the current
//! snapshot. Adapters decide how change is detected: the in-process store
//! pushes on every write, remote stores may poll.

use crate::domain::{Answer, Question, QuestionId, QuestionListQuery, Subscription};

use super::define_port_error;

define_port_error! {
    /// Errors delivered through a live query stream.
    pub enum LiveQueryError {
        /// The store could not be reached.
        Connection { message: String } =>
            "live query connection failed: {message}",
        /// The query was rejected or its results could not be decoded.
        Query { message: String } =>
            "live query failed: {message}",
    }
}

/// Port for opening live queries.
#[cfg_attr(test, mockall::automock)]
pub trait LiveQueries: Send + Sync {
    /// Questions selected by `query`, in query order.
    fn subscribe_questions(&self, query: QuestionListQuery) -> Subscription<Question>;

    /// Answers to `question_id`, in display order.
    fn subscribe_answers(&self, question_id: QuestionId) -> Subscription<Answer>;
}

/// Fixture that emits a single empty snapshot per subscription.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLiveQueries;

impl LiveQueries for FixtureLiveQueries {
    fn subscribe_questions(&self, _query: QuestionListQuery) -> Subscription<Question> {
        Subscription::spawn(|mut tx| async move {
            let _ = tx.publish(Vec::new()).await;
        })
    }

    fn subscribe_answers(&self, _question_id: QuestionId) -> Subscription<Answer> {
        Subscription::spawn(|mut tx| async move {
            let _ = tx.publish(Vec::new()).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn fixture_emits_empty_snapshot_then_ends() {
        let mut sub = FixtureLiveQueries.subscribe_questions(QuestionListQuery::default());
        assert_eq!(sub.next().await, Some(Ok(Vec::new())));
        assert_eq!(sub.next().await, None);
    }
}
