//! Driven port for question documents.
//!
//! Adapters assign the document id and the creation timestamp ("server
//! timestamp"). The answer counter is only ever changed through
//! [`QuestionRepository::increment_answer_count`], which must be atomic in the
//! backing store.

use async_trait::async_trait;

use crate::domain::{NewQuestion, Question, QuestionId, QuestionListQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by question store adapters.
    pub enum QuestionRepositoryError {
        /// The store could not be reached.
        Connection { message: String } =>
            "question store connection failed: {message}",
        /// A read or write was rejected or could not be decoded.
        Query { message: String } =>
            "question store query failed: {message}",
        /// The targeted question does not exist.
        NotFound { id: String } =>
            "question {id} not found",
    }
}

/// Port for reading and writing questions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Create a question with `answer_count = 0` and a store-assigned
    /// timestamp.
    async fn insert(&self, question: NewQuestion) -> Result<Question, QuestionRepositoryError>;

    /// Fetch a question by id.
    async fn find_by_id(
        &self,
        id: &QuestionId,
    ) -> Result<Option<Question>, QuestionRepositoryError>;

    /// Atomically add one to the question's answer counter.
    ///
    /// Returns [`QuestionRepositoryError::NotFound`] when the question is
    /// missing.
    async fn increment_answer_count(&self, id: &QuestionId)
    -> Result<(), QuestionRepositoryError>;

    /// One-shot evaluation of a list query.
    async fn query(
        &self,
        query: &QuestionListQuery,
    ) -> Result<Vec<Question>, QuestionRepositoryError>;
}

/// Fixture store that holds nothing and accepts every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureQuestionRepository;

#[async_trait]
impl QuestionRepository for FixtureQuestionRepository {
    async fn insert(&self, question: NewQuestion) -> Result<Question, QuestionRepositoryError> {
        Ok(Question::from_new(
            QuestionId::random(),
            question,
            chrono::Utc::now(),
        ))
    }

    async fn find_by_id(
        &self,
        _id: &QuestionId,
    ) -> Result<Option<Question>, QuestionRepositoryError> {
        Ok(None)
    }

    async fn increment_answer_count(
        &self,
        id: &QuestionId,
    ) -> Result<(), QuestionRepositoryError> {
        Err(QuestionRepositoryError::not_found(id.to_string()))
    }

    async fn query(
        &self,
        _query: &QuestionListQuery,
    ) -> Result<Vec<Question>, QuestionRepositoryError> {
        Ok(Vec::new())
    }
}
