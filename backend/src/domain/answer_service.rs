//! Answer domain service: posting, AI answers and the vote transaction.
//!
//! Votes are an optimistic read-modify-write: read the answer and its
//! revision, apply [`VoteTally::apply`], then write the tally conditioned on
//! the revision. A revision mismatch means another writer won, so the service
//! re-reads and recomputes, up to [`MAX_VOTE_ATTEMPTS`] times.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::domain::insight::{GENERATION_FAILED_NOTICE, NOT_CONFIGURED_NOTICE, ai_author};
use crate::domain::ports::{
    AnswerGenerator, AnswerGeneratorError, AnswerRepository, AnswerRepositoryError,
    AnswersCommand, AnswersQuery, QuestionRepository, VoteResult,
};
use crate::domain::question_service::map_question_error;
use crate::domain::{
    Answer, AnswerBody, AnswerId, Error, GenerationRequest, NewAnswer, Question, QuestionId, User,
    UserId, VoteDirection,
};

/// Attempts made before a contended vote is reported as a conflict.
pub const MAX_VOTE_ATTEMPTS: u32 = 5;

const POST_FAILED: &str = "Failed to post answer. Please try again.";
const LOAD_FAILED: &str = "Failed to load answers. Please try again.";
const VOTE_FAILED: &str = "Failed to record vote. Please try again.";

/// Answer service implementing the answer driving ports.
pub struct AnswerService<Q: ?Sized, A: ?Sized, G: ?Sized> {
    questions: Arc<Q>,
    answers: Arc<A>,
    generator: Arc<G>,
}

impl<Q: ?Sized, A: ?Sized, G: ?Sized> Clone for AnswerService<Q, A, G> {
    fn clone(&self) -> Self {
        Self {
            questions: Arc::clone(&self.questions),
            answers: Arc::clone(&self.answers),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<Q: ?Sized, A: ?Sized, G: ?Sized> AnswerService<Q, A, G> {
    pub fn new(questions: Arc<Q>, answers: Arc<A>, generator: Arc<G>) -> Self {
        Self {
            questions,
            answers,
            generator,
        }
    }
}

fn map_answer_error(err: AnswerRepositoryError, message: &str) -> Error {
    match err {
        AnswerRepositoryError::NotFound { .. } => Error::not_found("Answer not found."),
        AnswerRepositoryError::RevisionMismatch { expected } => {
            Error::conflict(message).with_details(json!({
                "code": "revision_mismatch",
                "expectedRevision": expected,
            }))
        }
        AnswerRepositoryError::Connection { message: cause } => {
            error!(error = %cause, "answer store unavailable");
            Error::service_unavailable(message)
        }
        AnswerRepositoryError::Query { message: cause } => {
            error!(error = %cause, "answer store query failed");
            Error::internal(message)
        }
    }
}

/// Body posted in place of generated text when generation fails.
fn fallback_notice(err: &AnswerGeneratorError) -> &'static str {
    match err {
        AnswerGeneratorError::NotConfigured => NOT_CONFIGURED_NOTICE,
        _ => GENERATION_FAILED_NOTICE,
    }
}

impl<Q, A, G> AnswerService<Q, A, G>
where
    Q: QuestionRepository + ?Sized,
    A: AnswerRepository + ?Sized,
    G: AnswerGenerator + ?Sized,
{
    async fn load_question(&self, id: &QuestionId, message: &str) -> Result<Question, Error> {
        self.questions
            .find_by_id(id)
            .await
            .map_err(|err| map_question_error(err, message))?
            .ok_or_else(|| Error::not_found("Question not found."))
    }

    async fn insert_and_count(&self, new: NewAnswer) -> Result<Answer, Error> {
        let question_id = new.question_id.clone();
        let answer = self
            .answers
            .insert(new)
            .await
            .map_err(|err| map_answer_error(err, POST_FAILED))?;
        self.questions
            .increment_answer_count(&question_id)
            .await
            .map_err(|err| {
                error!(
                    answer_id = %answer.id,
                    question_id = %question_id,
                    error = %err,
                    "answer stored but answer count not incremented"
                );
                map_question_error(err, POST_FAILED)
            })?;
        info!(answer_id = %answer.id, question_id = %question_id, "answer posted");
        Ok(answer)
    }

    async fn generate_body(&self, question: &Question) -> Result<AnswerBody, Error> {
        let request = GenerationRequest::for_question(&question.title);
        let text = match self.generator.generate(&request).await {
            Ok(text) => text,
            Err(err) => {
                warn!(question_id = %question.id, error = %err, "answer generation failed");
                fallback_notice(&err).to_owned()
            }
        };
        AnswerBody::generated(&text)
            .or_else(|_| AnswerBody::generated(GENERATION_FAILED_NOTICE))
            .map_err(|err| Error::internal(format!("fallback notice rejected: {err}")))
    }
}

#[async_trait]
impl<Q, A, G> AnswersCommand for AnswerService<Q, A, G>
where
    Q: QuestionRepository + ?Sized,
    A: AnswerRepository + ?Sized,
    G: AnswerGenerator + ?Sized,
{
    async fn post_answer(
        &self,
        author: &User,
        question_id: &QuestionId,
        body: AnswerBody,
    ) -> Result<Answer, Error> {
        let question = self.load_question(question_id, POST_FAILED).await?;
        self.insert_and_count(NewAnswer::by_user(question.id, body, author))
            .await
    }

    async fn request_ai_answer(&self, question_id: &QuestionId) -> Result<Answer, Error> {
        let question = self.load_question(question_id, POST_FAILED).await?;
        let body = self.generate_body(&question).await?;
        self.insert_and_count(NewAnswer::by_user(question.id, body, &ai_author()))
            .await
    }

    async fn vote(
        &self,
        voter: &UserId,
        answer_id: &AnswerId,
        direction: VoteDirection,
    ) -> Result<VoteResult, Error> {
        for attempt in 1..=MAX_VOTE_ATTEMPTS {
            let stored = self
                .answers
                .find_by_id(answer_id)
                .await
                .map_err(|err| map_answer_error(err, VOTE_FAILED))?
                .ok_or_else(|| Error::not_found("Answer not found."))?;

            let mut tally = stored.answer.tally;
            let change = tally.apply(voter, direction);
            match self
                .answers
                .save_tally(answer_id, &tally, &stored.revision)
                .await
            {
                Ok(_) => {
                    debug!(answer_id = %answer_id, voter = %voter, ?change, attempt, "vote recorded");
                    return Ok(VoteResult {
                        answer_id: answer_id.clone(),
                        change,
                        tally,
                    });
                }
                Err(AnswerRepositoryError::RevisionMismatch { expected }) => {
                    debug!(answer_id = %answer_id, %expected, attempt, "vote raced; retrying");
                }
                Err(err) => return Err(map_answer_error(err, VOTE_FAILED)),
            }
        }
        warn!(answer_id = %answer_id, attempts = MAX_VOTE_ATTEMPTS, "vote abandoned after repeated conflicts");
        Err(Error::conflict(VOTE_FAILED).with_details(json!({
            "code": "vote_contention",
            "attempts": MAX_VOTE_ATTEMPTS,
        })))
    }
}

#[async_trait]
impl<Q, A, G> AnswersQuery for AnswerService<Q, A, G>
where
    Q: QuestionRepository + ?Sized,
    A: AnswerRepository + ?Sized,
    G: AnswerGenerator + ?Sized,
{
    async fn list_for_question(&self, question_id: &QuestionId) -> Result<Vec<Answer>, Error> {
        let question = self.load_question(question_id, LOAD_FAILED).await?;
        self.answers
            .list_for_question(&question.id)
            .await
            .map_err(|err| map_answer_error(err, LOAD_FAILED))
    }
}

#[cfg(test)]
mod tests;
