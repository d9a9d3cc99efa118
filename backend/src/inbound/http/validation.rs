//! Validation error mapping shared by inbound HTTP handlers.
//!
//! Every validation failure becomes `400 invalid_request` whose details name
//! the offending field and a stable machine-readable code.

use serde_json::json;

use crate::domain::{
    AnswerId, AnswerValidationError, CredentialsValidationError, DocumentIdError, Error,
    QuestionId, QuestionValidationError, UserValidationError,
};

/// Request field name as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) const TITLE: FieldName = FieldName::new("title");
pub(crate) const BODY: FieldName = FieldName::new("body");
pub(crate) const QUESTION_ID: FieldName = FieldName::new("questionId");
pub(crate) const ANSWER_ID: FieldName = FieldName::new("answerId");

/// `400 invalid_request` with `{field, code}` details.
pub(crate) fn field_error(field: FieldName, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code,
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(field, "missing_field", format!("missing required field: {name}"))
}

pub(crate) fn question_error(err: QuestionValidationError) -> Error {
    let code = match err {
        QuestionValidationError::TitleTooShort { .. } => "title_too_short",
        QuestionValidationError::TitleTooLong { .. } => "title_too_long",
    };
    field_error(TITLE, code, err.to_string())
}

pub(crate) fn answer_error(err: AnswerValidationError) -> Error {
    let code = match err {
        AnswerValidationError::BodyTooShort { .. } => "body_too_short",
        AnswerValidationError::EmptyBody => "empty_body",
    };
    field_error(BODY, code, err.to_string())
}

pub(crate) fn credentials_error(err: CredentialsValidationError) -> Error {
    let code = match &err {
        CredentialsValidationError::InvalidEmail => "invalid_email",
        CredentialsValidationError::EmptyPassword => "empty_password",
        CredentialsValidationError::DisplayName(inner) => match inner {
            UserValidationError::DisplayNameTooShort { .. } => "display_name_too_short",
            UserValidationError::DisplayNameTooLong { .. } => "display_name_too_long",
            _ => "invalid_display_name",
        },
    };
    field_error(FieldName::new(err.field()), code, err.to_string())
}

fn id_error(field: FieldName, err: DocumentIdError) -> Error {
    let name = field.as_str();
    field_error(field, "invalid_id", format!("{name} is not a valid identifier: {err}"))
}

pub(crate) fn parse_question_id(raw: String) -> Result<QuestionId, Error> {
    QuestionId::new(raw).map_err(|err| id_error(QUESTION_ID, err))
}

pub(crate) fn parse_answer_id(raw: String) -> Result<AnswerId, Error> {
    AnswerId::new(raw).map_err(|err| id_error(ANSWER_ID, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, QuestionTitle, SignUpCredentials};
    use rstest::rstest;

    #[test]
    fn short_title_maps_to_field_error() {
        let err = question_error(QuestionTitle::new("Too short").expect_err("short"));
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.message(),
            "Question title must be at least 10 characters long."
        );
        assert_eq!(
            err.details(),
            Some(&json!({"field": "title", "code": "title_too_short"}))
        );
    }

    #[rstest]
    #[case("not-an-email", "secret1", "Ada", "email", "invalid_email")]
    #[case("ada@example.com", "", "Ada", "password", "empty_password")]
    #[case("ada@example.com", "secret1", "Al", "displayName", "display_name_too_short")]
    fn credential_failures_name_their_field(
        #[case] email: &str,
        #[case] password: &str,
        #[case] name: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let err = credentials_error(
            SignUpCredentials::try_from_parts(email, password, name).expect_err("invalid"),
        );
        assert_eq!(err.details(), Some(&json!({"field": field, "code": code})));
    }

    #[test]
    fn path_ids_are_validated() {
        let err = parse_question_id("a/b".into()).expect_err("slash rejected");
        assert_eq!(err.details().expect("details")["field"], "questionId");
        assert!(parse_answer_id("a1".into()).is_ok());
    }
}
