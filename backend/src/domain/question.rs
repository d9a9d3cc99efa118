//! Questions and the validated draft used to create them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::QuestionId;
use super::user::{User, UserId};

/// Minimum trimmed title length.
pub const TITLE_MIN: usize = 10;
/// Maximum trimmed title length.
pub const TITLE_MAX: usize = 300;

/// Validation errors for question input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionValidationError {
    TitleTooShort { min: usize },
    TitleTooLong { max: usize },
}

impl fmt::Display for QuestionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleTooShort { min } => {
                write!(f, "Question title must be at least {min} characters long.")
            }
            Self::TitleTooLong { max } => {
                write!(f, "Question title must be at most {max} characters long.")
            }
        }
    }
}

impl std::error::Error for QuestionValidationError {}

/// Question title, stored trimmed.
///
/// # Examples
/// ```
/// use quorum::domain::QuestionTitle;
///
/// assert!(QuestionTitle::new("Too short").is_err());
/// assert_eq!(QuestionTitle::new("  Why is the sky blue?  ").unwrap().as_ref(), "Why is the sky blue?");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestionTitle(String);

impl QuestionTitle {
    pub fn new(title: impl AsRef<str>) -> Result<Self, QuestionValidationError> {
        let trimmed = title.as_ref().trim();
        let length = trimmed.chars().count();
        if length < TITLE_MIN {
            return Err(QuestionValidationError::TitleTooShort { min: TITLE_MIN });
        }
        if length > TITLE_MAX {
            return Err(QuestionValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for QuestionTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for QuestionTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<QuestionTitle> for String {
    fn from(value: QuestionTitle) -> Self {
        value.0
    }
}

impl TryFrom<String> for QuestionTitle {
    type Error = QuestionValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validated title and body, prior to attaching an author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    title: QuestionTitle,
    body: String,
}

impl QuestionDraft {
    /// Validate raw input. A missing body is stored as an empty string.
    pub fn try_from_parts(
        title: &str,
        body: Option<&str>,
    ) -> Result<Self, QuestionValidationError> {
        Ok(Self {
            title: QuestionTitle::new(title)?,
            body: body.map(str::trim).unwrap_or_default().to_owned(),
        })
    }

    pub fn title(&self) -> &QuestionTitle {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Question ready to be written; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: QuestionTitle,
    pub body: String,
    pub author_id: UserId,
    pub author_name: String,
}

impl NewQuestion {
    /// Attach the author's denormalised identity to a draft.
    pub fn from_draft(draft: QuestionDraft, author: &User) -> Self {
        Self {
            title: draft.title,
            body: draft.body,
            author_id: author.id().clone(),
            author_name: author.author_name(),
        }
    }
}

/// Stored question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[schema(value_type = String)]
    pub id: QuestionId,
    #[schema(value_type = String, example = "Why is the sky blue?")]
    pub title: QuestionTitle,
    pub body: String,
    #[schema(value_type = String)]
    pub author_id: UserId,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub answer_count: u32,
}

impl Question {
    /// Materialise a stored question from a freshly written draft.
    pub fn from_new(id: QuestionId, new: NewQuestion, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            body: new.body,
            author_id: new.author_id,
            author_name: new.author_name,
            created_at,
            answer_count: 0,
        }
    }
}
