//! Question API handlers.
//!
//! ```text
//! GET /api/v1/questions?search=Why
//! POST /api/v1/questions {"title":"Why is the sky blue?","body":"..."}
//! GET /api/v1/questions/{id}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, Question, QuestionDraft, QuestionListQuery};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    TITLE, missing_field_error, parse_question_id, question_error,
};

/// Query string for `GET /api/v1/questions`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuestionsParams {
    /// Title prefix; blank or absent returns the newest questions.
    pub search: Option<String>,
}

/// Request body for `POST /api/v1/questions`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestionRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl TryFrom<AskQuestionRequest> for QuestionDraft {
    type Error = Error;

    fn try_from(value: AskQuestionRequest) -> Result<Self, Self::Error> {
        let title = value.title.ok_or_else(|| missing_field_error(TITLE))?;
        Self::try_from_parts(&title, value.body.as_deref()).map_err(question_error)
    }
}

/// Newest questions, or those whose title starts with `search`.
///
/// Prefix matching is case-sensitive; results are ordered by title and then
/// newest first.
#[utoipa::path(
    get,
    path = "/api/v1/questions",
    params(ListQuestionsParams),
    responses(
        (status = 200, description = "Questions", body = [Question]),
        (status = 503, description = "Store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["questions"],
    operation_id = "listQuestions",
    security([])
)]
#[get("/questions")]
pub async fn list_questions(
    state: web::Data<HttpState>,
    params: web::Query<ListQuestionsParams>,
) -> ApiResult<web::Json<Vec<Question>>> {
    let term = params.into_inner().search.unwrap_or_default();
    let query = QuestionListQuery::from_search(&term, state.feed_limit);
    let questions = state.questions_query.list(&query).await?;
    Ok(web::Json(questions))
}

/// Post a question as the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/questions",
    request_body = AskQuestionRequest,
    responses(
        (status = 201, description = "Question posted", body = Question),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["questions"],
    operation_id = "askQuestion"
)]
#[post("/questions")]
pub async fn ask_question(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AskQuestionRequest>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user()?;
    let draft = QuestionDraft::try_from(payload.into_inner())?;
    let question = state.questions.post_question(&author, draft).await?;
    Ok(HttpResponse::Created().json(question))
}

/// A single question.
#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}",
    params(("id" = String, Path, description = "Question identifier")),
    responses(
        (status = 200, description = "Question", body = Question),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Question not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["questions"],
    operation_id = "getQuestion",
    security([])
)]
#[get("/questions/{id}")]
pub async fn get_question(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Question>> {
    let id = parse_question_id(path.into_inner())?;
    let question = state.questions_query.get(&id).await?;
    Ok(web::Json(question))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuestionFilter, QuestionId, QuestionTitle, UserId};
    use crate::inbound::http::test_utils::{
        MockPorts, TEST_SIGN_IN_PATH, ada, session_cookie, sign_in_route, test_session_middleware,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn question(id: &str, title: &str) -> Question {
        Question {
            id: QuestionId::new(id).expect("id"),
            title: QuestionTitle::new(title).expect("title"),
            body: String::new(),
            author_id: UserId::new("u-ada").expect("user id"),
            author_name: "Ada".into(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            answer_count: 0,
        }
    }

    fn test_app(
        ports: MockPorts,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(ports.into_state())
            .wrap(test_session_middleware())
            .service(sign_in_route(ada()))
            .service(
                web::scope("/api/v1")
                    .service(list_questions)
                    .service(ask_question)
                    .service(get_question),
            )
    }

    #[rstest]
    #[case("/api/v1/questions", None)]
    #[case("/api/v1/questions?search=", None)]
    #[case("/api/v1/questions?search=%20Why%20", Some("Why"))]
    #[actix_web::test]
    async fn search_term_selects_filter(#[case] uri: &str, #[case] prefix: Option<&'static str>) {
        let mut ports = MockPorts::default();
        ports
            .questions_query
            .expect_list()
            .withf(move |query| match (query.filter(), prefix) {
                (QuestionFilter::All, None) => true,
                (QuestionFilter::TitlePrefix(actual), Some(expected)) => actual == expected,
                _ => false,
            })
            .times(1)
            .returning(|_| Ok(vec![question("q1", "Why is the sky blue?")]));
        let app = actix_test::init_service(test_app(ports)).await;

        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body[0]["id"], "q1");
        assert_eq!(body[0]["answerCount"], 0);
    }

    #[actix_web::test]
    async fn asking_requires_sign_in() {
        let mut ports = MockPorts::default();
        ports.questions.expect_post_question().never();
        let app = actix_test::init_service(test_app(ports)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/questions")
                .set_json(json!({"title": "Why is the sky blue?"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(json!({"title": "Too short"}), "title_too_short")]
    #[case(json!({"body": "no title"}), "missing_field")]
    #[actix_web::test]
    async fn invalid_titles_are_rejected_before_posting(
        #[case] payload: Value,
        #[case] code: &str,
    ) {
        let mut ports = MockPorts::default();
        ports.questions.expect_post_question().never();
        let app = actix_test::init_service(test_app(ports)).await;
        let signed_in = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri(TEST_SIGN_IN_PATH).to_request(),
        )
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/questions")
                .cookie(session_cookie(&signed_in))
                .set_json(payload)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], "title");
        assert_eq!(body["details"]["code"], code);
    }

    #[actix_web::test]
    async fn posts_question_as_session_user() {
        let mut ports = MockPorts::default();
        ports
            .questions
            .expect_post_question()
            .withf(|author, draft| {
                author.id().as_ref() == "u-ada" && draft.title().as_ref() == "Ten chars!"
            })
            .times(1)
            .returning(|_, draft| Ok(question("q9", draft.title().as_ref())));
        let app = actix_test::init_service(test_app(ports)).await;
        let signed_in = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri(TEST_SIGN_IN_PATH).to_request(),
        )
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/questions")
                .cookie(session_cookie(&signed_in))
                .set_json(json!({"title": "Ten chars!"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["id"], "q9");
    }

    #[actix_web::test]
    async fn missing_question_is_not_found() {
        let mut ports = MockPorts::default();
        ports
            .questions_query
            .expect_get()
            .times(1)
            .returning(|_| Err(Error::not_found("Question not found.")));
        let app = actix_test::init_service(test_app(ports)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/questions/nope")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
