//! Driving port for posting questions.

use async_trait::async_trait;

use crate::domain::{Error, Question, QuestionDraft, User};

/// Question write use-cases consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionsCommand: Send + Sync {
    /// Post a validated question on behalf of `author`.
    async fn post_question(&self, author: &User, draft: QuestionDraft) -> Result<Question, Error>;
}
