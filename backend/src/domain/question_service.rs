//! Question domain service.
//!
//! Implements [`QuestionsCommand`] and [`QuestionsQuery`] on top of a
//! [`QuestionRepository`]. Store failures are logged and surfaced with a
//! generic message; there is no automatic retry.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::domain::ports::{
    QuestionRepository, QuestionRepositoryError, QuestionsCommand, QuestionsQuery,
};
use crate::domain::{Error, NewQuestion, Question, QuestionDraft, QuestionId, QuestionListQuery, User};

const POST_FAILED: &str = "Failed to post question. Please try again.";
const LOAD_FAILED: &str = "Failed to load questions. Please try again.";

/// Question service implementing the question driving ports.
pub struct QuestionService<Q: ?Sized> {
    questions: Arc<Q>,
}

impl<Q: ?Sized> Clone for QuestionService<Q> {
    fn clone(&self) -> Self {
        Self {
            questions: Arc::clone(&self.questions),
        }
    }
}

impl<Q: ?Sized> QuestionService<Q> {
    pub fn new(questions: Arc<Q>) -> Self {
        Self { questions }
    }
}

pub(crate) fn map_question_error(err: QuestionRepositoryError, message: &str) -> Error {
    match err {
        QuestionRepositoryError::NotFound { .. } => Error::not_found("Question not found."),
        QuestionRepositoryError::Connection { message: cause } => {
            error!(error = %cause, "question store unavailable");
            Error::service_unavailable(message)
        }
        QuestionRepositoryError::Query { message: cause } => {
            error!(error = %cause, "question store query failed");
            Error::internal(message)
        }
    }
}

#[async_trait]
impl<Q> QuestionsCommand for QuestionService<Q>
where
    Q: QuestionRepository + ?Sized,
{
    async fn post_question(&self, author: &User, draft: QuestionDraft) -> Result<Question, Error> {
        let question = self
            .questions
            .insert(NewQuestion::from_draft(draft, author))
            .await
            .map_err(|err| map_question_error(err, POST_FAILED))?;
        info!(question_id = %question.id, author_id = %question.author_id, "question posted");
        Ok(question)
    }
}

#[async_trait]
impl<Q> QuestionsQuery for QuestionService<Q>
where
    Q: QuestionRepository + ?Sized,
{
    async fn list(&self, query: &QuestionListQuery) -> Result<Vec<Question>, Error> {
        self.questions
            .query(query)
            .await
            .map_err(|err| map_question_error(err, LOAD_FAILED))
    }

    async fn get(&self, id: &QuestionId) -> Result<Question, Error> {
        self.questions
            .find_by_id(id)
            .await
            .map_err(|err| map_question_error(err, LOAD_FAILED))?
            .ok_or_else(|| Error::not_found("Question not found."))
    }
}
