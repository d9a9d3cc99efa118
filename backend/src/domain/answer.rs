//! Answers and their ordering.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{AnswerId, QuestionId};
use super::user::{User, UserId};
use super::vote::VoteTally;

/// Minimum trimmed length of a human-written answer.
pub const ANSWER_MIN: usize = 15;

/// Validation errors for answer bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValidationError {
    BodyTooShort { min: usize },
    EmptyBody,
}

impl fmt::Display for AnswerValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyTooShort { min } => {
                write!(f, "Answer must be at least {min} characters long.")
            }
            Self::EmptyBody => write!(f, "Answer must not be empty."),
        }
    }
}

impl std::error::Error for AnswerValidationError {}

/// Answer text, stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnswerBody(String);

impl AnswerBody {
    /// Body of a human-written answer; at least [`ANSWER_MIN`] characters.
    pub fn new(body: impl AsRef<str>) -> Result<Self, AnswerValidationError> {
        let trimmed = body.as_ref().trim();
        if trimmed.chars().count() < ANSWER_MIN {
            return Err(AnswerValidationError::BodyTooShort { min: ANSWER_MIN });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Body produced by the answer generator; only needs to be non-empty.
    pub fn generated(body: impl AsRef<str>) -> Result<Self, AnswerValidationError> {
        let trimmed = body.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AnswerValidationError::EmptyBody);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for AnswerBody {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AnswerBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AnswerBody> for String {
    fn from(value: AnswerBody) -> Self {
        value.0
    }
}

// Stored bodies may come from the generator, so only emptiness is checked
// when reading them back.
impl TryFrom<String> for AnswerBody {
    type Error = AnswerValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::generated(value)
    }
}

/// Answer ready to be written; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub question_id: QuestionId,
    pub body: AnswerBody,
    pub author_id: UserId,
    pub author_name: String,
}

impl NewAnswer {
    pub fn by_user(question_id: QuestionId, body: AnswerBody, author: &User) -> Self {
        Self {
            question_id,
            body,
            author_id: author.id().clone(),
            author_name: author.author_name(),
        }
    }
}

/// Stored answer with its vote tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[schema(value_type = String)]
    pub id: AnswerId,
    #[schema(value_type = String)]
    pub question_id: QuestionId,
    #[schema(value_type = String)]
    pub body: AnswerBody,
    #[schema(value_type = String)]
    pub author_id: UserId,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub tally: VoteTally,
}

impl Answer {
    /// Materialise a stored answer with an empty tally.
    pub fn from_new(id: AnswerId, new: NewAnswer, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            question_id: new.question_id,
            body: new.body,
            author_id: new.author_id,
            author_name: new.author_name,
            created_at,
            tally: VoteTally::default(),
        }
    }

    pub fn score(&self) -> i64 {
        self.tally.score()
    }
}

/// Display order for answers: score descending, newer first on ties, then
/// id for a total order.
pub fn by_score(a: &Answer, b: &Answer) -> Ordering {
    b.score()
        .cmp(&a.score())
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort answers into display order.
pub fn sort_by_score(answers: &mut [Answer]) {
    answers.sort_by(by_score);
}
