//! Account API handlers.
//!
//! ```text
//! POST /api/v1/auth/signup {"email":"ada@example.com","password":"secret1","displayName":"Ada"}
//! POST /api/v1/auth/login {"email":"ada@example.com","password":"secret1"}
//! POST /api/v1/auth/logout
//! GET /api/v1/auth/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::{Error, SignInCredentials, SignUpCredentials, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, credentials_error, missing_field_error};

const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");
const DISPLAY_NAME: FieldName = FieldName::new("displayName");

fn required(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Sign-up request body for `POST /api/v1/auth/signup`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

impl TryFrom<SignUpRequest> for SignUpCredentials {
    type Error = Error;

    fn try_from(value: SignUpRequest) -> Result<Self, Self::Error> {
        let email = required(value.email, EMAIL)?;
        let password = required(value.password, PASSWORD)?;
        let display_name = required(value.display_name, DISPLAY_NAME)?;
        Self::try_from_parts(&email, &password, &display_name).map_err(credentials_error)
    }
}

/// Sign-in request body for `POST /api/v1/auth/login`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<SignInRequest> for SignInCredentials {
    type Error = Error;

    fn try_from(value: SignInRequest) -> Result<Self, Self::Error> {
        let email = required(value.email, EMAIL)?;
        let password = required(value.password, PASSWORD)?;
        Self::try_from_parts(&email, &password).map_err(credentials_error)
    }
}

/// Create an account and sign it in.
///
/// The display name is validated before the auth provider is contacted.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Auth provider unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/auth/signup")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignUpRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = SignUpCredentials::try_from(payload.into_inner())?;
    let user = state.accounts.sign_up(credentials).await?;
    session.persist_user(&user)?;
    state.session_links.announce(&session, &user)?;
    Ok(HttpResponse::Created().json(user))
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Auth provider unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = SignInCredentials::try_from(payload.into_inner())?;
    let user = state.accounts.sign_in(credentials).await?;
    session.persist_user(&user)?;
    state.session_links.announce(&session, &user)?;
    Ok(HttpResponse::Ok().json(user))
}

/// End the session. Succeeds even when nobody is signed in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared"),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    if let Some(user) = session.user()? {
        if let Err(err) = state.accounts.sign_out(user.id()).await {
            warn!(user_id = %user.id(), error = %err, "provider sign-out failed; clearing session");
        }
    }
    session.purge()?;
    Ok(HttpResponse::NoContent().finish())
}

/// The signed-in user.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use quorum::inbound::http::auth::current_user;
///
/// let app = App::new().service(current_user);
/// ```
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not signed in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn current_user(session: SessionContext) -> ApiResult<web::Json<User>> {
    Ok(web::Json(session.require_user()?))
}

#[cfg(test)]
mod tests;
