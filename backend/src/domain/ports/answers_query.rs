//! Driving port for reading answers.

use async_trait::async_trait;

use crate::domain::{Answer, Error, QuestionId};

/// Answer read use-cases consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswersQuery: Send + Sync {
    /// Answers to a question in display order; `NotFound` when the question
    /// is missing.
    async fn list_for_question(&self, question_id: &QuestionId) -> Result<Vec<Answer>, Error>;
}
