//! Wire-level message definitions for the live WebSocket.
//!
//! Every frame is a JSON object tagged by `type`. Clients send navigation
//! actions; the server answers with view state and live-query snapshots.

use serde::{Deserialize, Serialize};

use crate::domain::ports::LiveQueryError;
use crate::domain::{Answer, AppState, Error, Modal, Question, QuestionId, User, View};

/// Navigation action sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Search {
        term: String,
    },
    OpenQuestion {
        #[serde(rename = "questionId")]
        question_id: String,
    },
    BackToFeed,
    AskQuestion,
    Login,
    CloseModal,
}

/// Frame pushed to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Current view state; sent after every change.
    State {
        view: View,
        #[serde(rename = "searchTerm")]
        search_term: String,
        modal: Option<Modal>,
        user: Option<User>,
        #[serde(rename = "authLoading")]
        auth_loading: bool,
    },
    /// Latest feed or search snapshot.
    Questions { questions: Vec<Question> },
    /// Latest answers for the open question, in display order.
    Answers {
        #[serde(rename = "questionId")]
        question_id: QuestionId,
        answers: Vec<Answer>,
    },
    /// A failure the client should surface; the connection stays open.
    Error { code: String, message: String },
}

impl From<&AppState> for ServerMessage {
    fn from(state: &AppState) -> Self {
        Self::State {
            view: state.view().clone(),
            search_term: state.search_term().to_owned(),
            modal: state.modal(),
            user: state.user().cloned(),
            auth_loading: state.auth_loading(),
        }
    }
}

impl From<&Error> for ServerMessage {
    fn from(error: &Error) -> Self {
        Self::Error {
            code: error.code().as_str().to_owned(),
            message: error.message().to_owned(),
        }
    }
}

impl From<&LiveQueryError> for ServerMessage {
    fn from(error: &LiveQueryError) -> Self {
        let code = match error {
            LiveQueryError::Connection { .. } => "service_unavailable",
            LiveQueryError::Query { .. } => "internal_error",
        };
        Self::Error {
            code: code.to_owned(),
            message: "Failed to load live updates. Please try again.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, UserId};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"type": "search", "term": "Why"}), ClientMessage::Search { term: "Why".into() })]
    #[case(
        json!({"type": "openQuestion", "questionId": "q1"}),
        ClientMessage::OpenQuestion { question_id: "q1".into() }
    )]
    #[case(json!({"type": "backToFeed"}), ClientMessage::BackToFeed)]
    #[case(json!({"type": "askQuestion"}), ClientMessage::AskQuestion)]
    #[case(json!({"type": "login"}), ClientMessage::Login)]
    #[case(json!({"type": "closeModal"}), ClientMessage::CloseModal)]
    fn parses_client_messages(#[case] raw: serde_json::Value, #[case] expected: ClientMessage) {
        let parsed: ClientMessage = serde_json::from_value(raw).expect("message");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case(json!({"type": "shout"}))]
    #[case(json!({"term": "Why"}))]
    #[case(json!({"type": "search"}))]
    fn rejects_unknown_or_incomplete_messages(#[case] raw: serde_json::Value) {
        assert!(serde_json::from_value::<ClientMessage>(raw).is_err());
    }

    #[test]
    fn state_frame_is_camel_case() {
        let mut state = AppState::new(50);
        state.on_auth_changed(Some(User::new(UserId::new("u1").expect("id"), None, None)));
        state.request_ask_question();
        let value = serde_json::to_value(ServerMessage::from(&state)).expect("serialise");
        assert_eq!(
            value,
            json!({
                "type": "state",
                "view": {"kind": "feed"},
                "searchTerm": "",
                "modal": "askQuestion",
                "user": {"id": "u1"},
                "authLoading": false
            })
        );
    }

    #[test]
    fn answers_frame_names_question() {
        let message = ServerMessage::Answers {
            question_id: QuestionId::new("q1").expect("id"),
            answers: Vec::new(),
        };
        let value = serde_json::to_value(message).expect("serialise");
        assert_eq!(value, json!({"type": "answers", "questionId": "q1", "answers": []}));
    }

    #[test]
    fn domain_errors_keep_code_and_message() {
        let error = Error::not_found("Question not found.");
        let value = serde_json::to_value(ServerMessage::from(&error)).expect("serialise");
        assert_eq!(value["code"], ErrorCode::NotFound.as_str());
        assert_eq!(value["message"], "Question not found.");
    }
}
