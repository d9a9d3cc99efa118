//! Driving port for reading questions.

use async_trait::async_trait;

use crate::domain::{Error, Question, QuestionId, QuestionListQuery};

/// Question read use-cases consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionsQuery: Send + Sync {
    /// Feed or prefix search results.
    async fn list(&self, query: &QuestionListQuery) -> Result<Vec<Question>, Error>;

    /// A single question; `NotFound` when missing.
    async fn get(&self, id: &QuestionId) -> Result<Question, Error>;
}
