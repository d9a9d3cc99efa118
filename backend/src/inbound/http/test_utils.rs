//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::{HttpResponse, Resource, web};

use crate::domain::ports::{
    MockAccountCommand, MockAnswersCommand, MockAnswersQuery, MockQuestionsCommand,
    MockQuestionsQuery,
};
use crate::domain::{DEFAULT_FEED_LIMIT, DisplayName, Email, Error, User, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Session middleware with a fresh key, cookie `session`, and `Secure`
/// disabled for plain-HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set by `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Mock driving ports for handler tests; unset expectations panic on use.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountCommand,
    pub questions: MockQuestionsCommand,
    pub questions_query: MockQuestionsQuery,
    pub answers: MockAnswersCommand,
    pub answers_query: MockAnswersQuery,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(
            HttpStatePorts {
                accounts: Arc::new(self.accounts),
                questions: Arc::new(self.questions),
                questions_query: Arc::new(self.questions_query),
                answers: Arc::new(self.answers),
                answers_query: Arc::new(self.answers_query),
            },
            DEFAULT_FEED_LIMIT,
        ))
    }
}

pub const TEST_SIGN_IN_PATH: &str = "/test/sign-in";

/// Route that stores `user` in the session, standing in for a real sign-in.
pub fn sign_in_route(user: User) -> Resource {
    web::resource(TEST_SIGN_IN_PATH).route(web::post().to(move |session: SessionContext| {
        let user = user.clone();
        async move {
            session.persist_user(&user)?;
            Ok::<_, Error>(HttpResponse::NoContent().finish())
        }
    }))
}

/// A signed-in test user.
pub fn ada() -> User {
    User::new(
        UserId::new("u-ada").expect("id"),
        Some(Email::new("ada@example.com").expect("email")),
        Some(DisplayName::new("Ada").expect("display name")),
    )
}
