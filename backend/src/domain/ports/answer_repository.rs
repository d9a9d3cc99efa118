//! Driven port for answer documents with revision-checked tally writes.
//!
//! Every read of a single answer returns a [`Revision`]. A tally write names
//! the revision it was computed from and fails with
//! [`AnswerRepositoryError::RevisionMismatch`] when the stored answer has
//! moved on, which lets the caller re-read and recompute.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Answer, AnswerId, NewAnswer, QuestionId, VoteTally};

use super::define_port_error;

define_port_error! {
    /// Errors raised by answer store adapters.
    pub enum AnswerRepositoryError {
        /// The store could not be reached.
        Connection { message: String } =>
            "answer store connection failed: {message}",
        /// A read or write was rejected or could not be decoded.
        Query { message: String } =>
            "answer store query failed: {message}",
        /// The targeted answer does not exist.
        NotFound { id: String } =>
            "answer {id} not found",
        /// The answer changed since it was read.
        RevisionMismatch { expected: String } =>
            "revision mismatch: expected {expected}",
    }
}

/// Opaque version token of a stored answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl AsRef<str> for Revision {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An answer together with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAnswer {
    pub answer: Answer,
    pub revision: Revision,
}

/// Port for reading and writing answers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Create an answer with an empty tally and a store-assigned timestamp.
    async fn insert(&self, answer: NewAnswer) -> Result<Answer, AnswerRepositoryError>;

    /// Fetch an answer and its current revision.
    async fn find_by_id(&self, id: &AnswerId)
    -> Result<Option<StoredAnswer>, AnswerRepositoryError>;

    /// Replace the tally if the stored revision still equals `expected`.
    ///
    /// Returns the new revision on success.
    async fn save_tally(
        &self,
        id: &AnswerId,
        tally: &VoteTally,
        expected: &Revision,
    ) -> Result<Revision, AnswerRepositoryError>;

    /// All answers to a question in display order.
    async fn list_for_question(
        &self,
        question_id: &QuestionId,
    ) -> Result<Vec<Answer>, AnswerRepositoryError>;
}

/// Fixture store that holds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAnswerRepository;

#[async_trait]
impl AnswerRepository for FixtureAnswerRepository {
    async fn insert(&self, answer: NewAnswer) -> Result<Answer, AnswerRepositoryError> {
        Ok(Answer::from_new(AnswerId::random(), answer, chrono::Utc::now()))
    }

    async fn find_by_id(
        &self,
        _id: &AnswerId,
    ) -> Result<Option<StoredAnswer>, AnswerRepositoryError> {
        Ok(None)
    }

    async fn save_tally(
        &self,
        id: &AnswerId,
        _tally: &VoteTally,
        _expected: &Revision,
    ) -> Result<Revision, AnswerRepositoryError> {
        Err(AnswerRepositoryError::not_found(id.to_string()))
    }

    async fn list_for_question(
        &self,
        _question_id: &QuestionId,
    ) -> Result<Vec<Answer>, AnswerRepositoryError> {
        Ok(Vec::new())
    }
}
