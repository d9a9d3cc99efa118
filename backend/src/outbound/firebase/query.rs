//! Structured queries for the Firestore `runQuery` endpoint.

use serde_json::{Value as Json, json};

use super::value::{Value, field};
use crate::domain::{QuestionFilter, QuestionId, QuestionListQuery};

pub(super) const QUESTIONS: &str = "questions";
pub(super) const ANSWERS: &str = "answers";

fn field_filter(path: &str, op: &str, value: Value) -> Json {
    json!({
        "fieldFilter": {
            "field": {"fieldPath": path},
            "op": op,
            "value": value,
        }
    })
}

fn order(path: &str, direction: &str) -> Json {
    json!({"field": {"fieldPath": path}, "direction": direction})
}

/// Feed or prefix-search query over the questions collection.
///
/// A prefix search becomes a closed title range ordered by title, then
/// newest first; the feed is simply newest first.
pub(super) fn questions(query: &QuestionListQuery) -> Json {
    let limit = query.limit();
    let mut structured = match query.filter() {
        QuestionFilter::All => json!({
            "from": [{"collectionId": QUESTIONS}],
            "orderBy": [order(field::TIMESTAMP, "DESCENDING")],
        }),
        QuestionFilter::TitlePrefix(prefix) => {
            let upper = query.upper_bound().unwrap_or_else(|| prefix.clone());
            json!({
                "from": [{"collectionId": QUESTIONS}],
                "where": {
                    "compositeFilter": {
                        "op": "AND",
                        "filters": [
                            field_filter(field::TITLE, "GREATER_THAN_OR_EQUAL", Value::string(prefix.as_str())),
                            field_filter(field::TITLE, "LESS_THAN_OR_EQUAL", Value::string(upper)),
                        ],
                    }
                },
                "orderBy": [
                    order(field::TITLE, "ASCENDING"),
                    order(field::TIMESTAMP, "DESCENDING"),
                ],
            })
        }
    };
    structured["limit"] = json!(limit);
    json!({"structuredQuery": structured})
}

/// Answers belonging to one question; ordering is applied after the read.
pub(super) fn answers_for(question_id: &QuestionId) -> Json {
    json!({
        "structuredQuery": {
            "from": [{"collectionId": ANSWERS}],
            "where": field_filter(field::QUESTION_ID, "EQUAL", Value::string(question_id.as_ref())),
        }
    })
}
