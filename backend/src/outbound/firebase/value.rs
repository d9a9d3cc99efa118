//! Firestore typed-value codec.
//!
//! Firestore's REST surface wraps every field in a single-key object naming
//! its type (`{"stringValue": "..."}`). Integers travel as decimal strings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{
    Answer, AnswerBody, AnswerId, Question, QuestionId, QuestionTitle, UserId, VoteDirection,
    VoteTally,
};

pub(super) type Fields = BTreeMap<String, Value>;

/// A single Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(with = "integer_string")] i64),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct MapValue {
    #[serde(default)]
    pub(super) fields: Fields,
}

mod integer_string {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    pub(super) fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Raw::Number(number) => Ok(number),
        }
    }
}

impl Value {
    pub(super) fn string(value: impl Into<String>) -> Self {
        Self::StringValue(value.into())
    }

    pub(super) fn integer(value: impl Into<i64>) -> Self {
        Self::IntegerValue(value.into())
    }
}

/// A stored document as returned by GET, runQuery and commit reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Document {
    pub(super) name: String,
    #[serde(default)]
    pub(super) fields: Fields,
    pub(super) update_time: String,
}

impl Document {
    /// Trailing path segment of the resource name.
    pub(super) fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// Reason a document could not be mapped onto a domain type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field `{field}`: {problem}")]
pub(super) struct DecodeError {
    field: String,
    problem: String,
}

impl DecodeError {
    fn new(field: &str, problem: impl ToString) -> Self {
        Self {
            field: field.to_owned(),
            problem: problem.to_string(),
        }
    }
}

fn get<'a>(fields: &'a Fields, name: &str) -> Result<&'a Value, DecodeError> {
    fields
        .get(name)
        .ok_or_else(|| DecodeError::new(name, "missing"))
}

fn string<'a>(fields: &'a Fields, name: &str) -> Result<&'a str, DecodeError> {
    match get(fields, name)? {
        Value::StringValue(value) => Ok(value),
        other => Err(DecodeError::new(name, format!("expected string, got {other:?}"))),
    }
}

fn optional_string<'a>(fields: &'a Fields, name: &str) -> Result<&'a str, DecodeError> {
    match fields.get(name) {
        None | Some(Value::NullValue(())) => Ok(""),
        Some(_) => string(fields, name),
    }
}

fn counter(fields: &Fields, name: &str) -> Result<u32, DecodeError> {
    let raw = match fields.get(name) {
        None | Some(Value::NullValue(())) => 0,
        Some(Value::IntegerValue(value)) => *value,
        Some(other) => {
            return Err(DecodeError::new(name, format!("expected integer, got {other:?}")));
        }
    };
    u32::try_from(raw).map_err(|err| DecodeError::new(name, err))
}

fn timestamp(fields: &Fields, name: &str) -> Result<DateTime<Utc>, DecodeError> {
    match get(fields, name)? {
        Value::TimestampValue(value) => Ok(*value),
        other => Err(DecodeError::new(name, format!("expected timestamp, got {other:?}"))),
    }
}

fn direction(value: &Value) -> Option<VoteDirection> {
    match value {
        Value::StringValue(raw) if raw == "up" => Some(VoteDirection::Up),
        Value::StringValue(raw) if raw == "down" => Some(VoteDirection::Down),
        _ => None,
    }
}

fn direction_name(direction: VoteDirection) -> &'static str {
    match direction {
        VoteDirection::Up => "up",
        VoteDirection::Down => "down",
    }
}

/// Firestore field names.
pub(super) mod field {
    pub const TITLE: &str = "title";
    pub const BODY: &str = "body";
    pub const AUTHOR_ID: &str = "authorId";
    pub const AUTHOR_NAME: &str = "authorName";
    pub const TIMESTAMP: &str = "timestamp";
    pub const ANSWER_COUNT: &str = "answerCount";
    pub const QUESTION_ID: &str = "questionId";
    pub const UPVOTES: &str = "upvotes";
    pub const DOWNVOTES: &str = "downvotes";
    pub const VOTED_BY: &str = "votedBy";
}

pub(super) fn decode_question(document: &Document) -> Result<Question, DecodeError> {
    let fields = &document.fields;
    Ok(Question {
        id: QuestionId::new(document.id()).map_err(|err| DecodeError::new("name", err))?,
        title: QuestionTitle::new(string(fields, field::TITLE)?)
            .map_err(|err| DecodeError::new(field::TITLE, err))?,
        body: optional_string(fields, field::BODY)?.to_owned(),
        author_id: UserId::new(string(fields, field::AUTHOR_ID)?)
            .map_err(|err| DecodeError::new(field::AUTHOR_ID, err))?,
        author_name: string(fields, field::AUTHOR_NAME)?.to_owned(),
        created_at: timestamp(fields, field::TIMESTAMP)?,
        answer_count: counter(fields, field::ANSWER_COUNT)?,
    })
}

fn decode_voted_by(fields: &Fields) -> Result<VoteTally, DecodeError> {
    let mut tally = VoteTally {
        upvotes: counter(fields, field::UPVOTES)?,
        downvotes: counter(fields, field::DOWNVOTES)?,
        voted_by: BTreeMap::new(),
    };
    let entries = match fields.get(field::VOTED_BY) {
        None | Some(Value::NullValue(())) => return Ok(tally),
        Some(Value::MapValue(map)) => &map.fields,
        Some(other) => {
            return Err(DecodeError::new(
                field::VOTED_BY,
                format!("expected map, got {other:?}"),
            ));
        }
    };
    for (raw_user, value) in entries {
        let user = UserId::new(raw_user.as_str())
            .map_err(|err| DecodeError::new(field::VOTED_BY, err))?;
        let direction = direction(value)
            .ok_or_else(|| DecodeError::new(field::VOTED_BY, "unknown vote direction"))?;
        tally.voted_by.insert(user, direction);
    }
    Ok(tally)
}

pub(super) fn decode_answer(document: &Document) -> Result<Answer, DecodeError> {
    let fields = &document.fields;
    Ok(Answer {
        id: AnswerId::new(document.id()).map_err(|err| DecodeError::new("name", err))?,
        question_id: QuestionId::new(string(fields, field::QUESTION_ID)?)
            .map_err(|err| DecodeError::new(field::QUESTION_ID, err))?,
        body: AnswerBody::generated(string(fields, field::BODY)?)
            .map_err(|err| DecodeError::new(field::BODY, err))?,
        author_id: UserId::new(string(fields, field::AUTHOR_ID)?)
            .map_err(|err| DecodeError::new(field::AUTHOR_ID, err))?,
        author_name: string(fields, field::AUTHOR_NAME)?.to_owned(),
        created_at: timestamp(fields, field::TIMESTAMP)?,
        tally: decode_voted_by(fields)?,
    })
}

/// Fields written alongside a tally update; also the update mask.
pub(super) fn encode_tally(tally: &VoteTally) -> Fields {
    let voted_by = tally
        .voted_by
        .iter()
        .map(|(user, direction)| {
            (
                user.as_ref().to_owned(),
                Value::string(direction_name(*direction)),
            )
        })
        .collect();
    Fields::from([
        (field::UPVOTES.to_owned(), Value::integer(tally.upvotes)),
        (field::DOWNVOTES.to_owned(), Value::integer(tally.downvotes)),
        (
            field::VOTED_BY.to_owned(),
            Value::MapValue(MapValue { fields: voted_by }),
        ),
    ])
}
