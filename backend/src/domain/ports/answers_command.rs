//! Driving port for posting answers and voting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Answer, AnswerBody, AnswerId, Error, QuestionId, User, UserId, VoteChange, VoteDirection,
    VoteTally,
};

/// Outcome of a vote toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    #[schema(value_type = String)]
    pub answer_id: AnswerId,
    pub change: VoteChange,
    pub tally: VoteTally,
}

/// Answer write use-cases consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswersCommand: Send + Sync {
    /// Post a human answer and bump the question's answer count.
    async fn post_answer(
        &self,
        author: &User,
        question_id: &QuestionId,
        body: AnswerBody,
    ) -> Result<Answer, Error>;

    /// Generate and post an AI answer for the question.
    async fn request_ai_answer(&self, question_id: &QuestionId) -> Result<Answer, Error>;

    /// Toggle `voter`'s vote on an answer.
    async fn vote(
        &self,
        voter: &UserId,
        answer_id: &AnswerId,
        direction: VoteDirection,
    ) -> Result<VoteResult, Error>;
}
