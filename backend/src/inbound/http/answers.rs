//! Answer and vote API handlers.
//!
//! ```text
//! GET /api/v1/questions/{id}/answers
//! POST /api/v1/questions/{id}/answers {"body":"Rayleigh scattering of sunlight."}
//! POST /api/v1/questions/{id}/ai-answer
//! POST /api/v1/answers/{id}/vote {"direction":"up"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::VoteResult;
use crate::domain::{Answer, AnswerBody, Error, VoteDirection};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    BODY, FieldName, answer_error, field_error, missing_field_error, parse_answer_id,
    parse_question_id,
};

const DIRECTION: FieldName = FieldName::new("direction");

/// Request body for `POST /api/v1/questions/{id}/answers`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostAnswerRequest {
    pub body: Option<String>,
}

impl TryFrom<PostAnswerRequest> for AnswerBody {
    type Error = Error;

    fn try_from(value: PostAnswerRequest) -> Result<Self, Self::Error> {
        let body = value.body.ok_or_else(|| missing_field_error(BODY))?;
        Self::new(body).map_err(answer_error)
    }
}

/// Request body for `POST /api/v1/answers/{id}/vote`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// `up` or `down`. Repeating the current direction retracts the vote.
    #[schema(example = "up")]
    pub direction: Option<String>,
}

impl TryFrom<VoteRequest> for VoteDirection {
    type Error = Error;

    fn try_from(value: VoteRequest) -> Result<Self, Self::Error> {
        match value.direction.as_deref() {
            Some("up") => Ok(Self::Up),
            Some("down") => Ok(Self::Down),
            Some(_) => Err(field_error(
                DIRECTION,
                "invalid_direction",
                "direction must be \"up\" or \"down\"",
            )),
            None => Err(missing_field_error(DIRECTION)),
        }
    }
}

/// Answers to a question, highest score first.
#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}/answers",
    params(("id" = String, Path, description = "Question identifier")),
    responses(
        (status = 200, description = "Answers", body = [Answer]),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Question not found", body = Error),
        (status = 503, description = "Store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["answers"],
    operation_id = "listAnswers",
    security([])
)]
#[get("/questions/{id}/answers")]
pub async fn list_answers(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Answer>>> {
    let question_id = parse_question_id(path.into_inner())?;
    let answers = state.answers_query.list_for_question(&question_id).await?;
    Ok(web::Json(answers))
}

/// Post an answer as the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/answers",
    params(("id" = String, Path, description = "Question identifier")),
    request_body = PostAnswerRequest,
    responses(
        (status = 201, description = "Answer posted", body = Answer),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Question not found", body = Error),
        (status = 503, description = "Store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["answers"],
    operation_id = "postAnswer"
)]
#[post("/questions/{id}/answers")]
pub async fn post_answer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<PostAnswerRequest>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user()?;
    let question_id = parse_question_id(path.into_inner())?;
    let body = AnswerBody::try_from(payload.into_inner())?;
    let answer = state
        .answers
        .post_answer(&author, &question_id, body)
        .await?;
    Ok(HttpResponse::Created().json(answer))
}

/// Ask the generative model to answer a question.
///
/// Always posts an answer: generation failures become a fixed apology body.
#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/ai-answer",
    params(("id" = String, Path, description = "Question identifier")),
    responses(
        (status = 201, description = "AI answer posted", body = Answer),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Question not found", body = Error),
        (status = 503, description = "Store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["answers"],
    operation_id = "requestAiAnswer",
    security([])
)]
#[post("/questions/{id}/ai-answer")]
pub async fn request_ai_answer(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let question_id = parse_question_id(path.into_inner())?;
    let answer = state.answers.request_ai_answer(&question_id).await?;
    Ok(HttpResponse::Created().json(answer))
}

/// Toggle the signed-in user's vote on an answer.
#[utoipa::path(
    post,
    path = "/api/v1/answers/{id}/vote",
    params(("id" = String, Path, description = "Answer identifier")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote applied", body = VoteResult),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Answer not found", body = Error),
        (status = 409, description = "Too much contention", body = Error),
        (status = 503, description = "Store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["answers"],
    operation_id = "vote"
)]
#[post("/answers/{id}/vote")]
pub async fn vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<VoteRequest>,
) -> ApiResult<web::Json<VoteResult>> {
    let voter = session.require_user()?;
    let answer_id = parse_answer_id(path.into_inner())?;
    let direction = VoteDirection::try_from(payload.into_inner())?;
    let result = state
        .answers
        .vote(voter.id(), &answer_id, direction)
        .await?;
    Ok(web::Json(result))
}
