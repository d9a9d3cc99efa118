//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint from the inbound layer, the
//! domain schemas they exchange, and the session cookie security scheme.
//! Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::VoteResult;
use crate::domain::{Answer, Error, ErrorCode, Question, User, VoteChange, VoteDirection, VoteTally};
use crate::inbound::http::answers::{PostAnswerRequest, VoteRequest};
use crate::inbound::http::auth::{SignInRequest, SignUpRequest};
use crate::inbound::http::questions::AskQuestionRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login or /api/v1/auth/signup.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Quorum API",
        description = "Questions, answers, votes and AI insight answers over a session-authenticated REST interface."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::sign_up,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::current_user,
        crate::inbound::http::questions::list_questions,
        crate::inbound::http::questions::ask_question,
        crate::inbound::http::questions::get_question,
        crate::inbound::http::answers::list_answers,
        crate::inbound::http::answers::post_answer,
        crate::inbound::http::answers::request_ai_answer,
        crate::inbound::http::answers::vote,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Question,
        Answer,
        VoteDirection,
        VoteChange,
        VoteTally,
        VoteResult,
        SignUpRequest,
        SignInRequest,
        AskQuestionRequest,
        PostAnswerRequest,
        VoteRequest,
    )),
    tags(
        (name = "auth", description = "Account sign-up, sign-in and session"),
        (name = "questions", description = "Posting, listing and searching questions"),
        (name = "answers", description = "Answers, AI insight answers and votes"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
