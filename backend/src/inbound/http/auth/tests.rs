//! Tests for account API handlers.

use super::*;
use crate::domain::ErrorCode;
use crate::inbound::http::test_utils::{
    MockPorts, TEST_SIGN_IN_PATH, ada, session_cookie, sign_in_route, test_session_middleware,
};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use serde_json::{Value, json};

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
                .service(sign_up)
                .service(login)
                .service(logout)
                .service(current_user),
        )
}

async fn error_body(response: actix_web::dev::ServiceResponse) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("error payload")
}

#[actix_web::test]
async fn sign_up_creates_session() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_sign_up()
        .withf(|creds| creds.display_name().as_ref() == "Ada")
        .times(1)
        .returning(|_| Ok(ada()));
    let app = actix_test::init_service(test_app(ports)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({
                "email": "ada@example.com",
                "password": "secret1",
                "displayName": " Ada "
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["displayName"], "Ada");

    let me = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(me.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(me).await;
    assert_eq!(body["id"], "u-ada");
}

#[actix_web::test]
async fn short_display_name_never_reaches_provider() {
    let mut ports = MockPorts::default();
    ports.accounts.expect_sign_up().never();
    let app = actix_test::init_service(test_app(ports)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({
                "email": "ada@example.com",
                "password": "secret1",
                "displayName": "Al"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "displayName");
    assert_eq!(body["details"]["code"], "display_name_too_short");
}

#[actix_web::test]
async fn missing_email_is_reported() {
    let app = actix_test::init_service(test_app(MockPorts::default())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"password": "secret1"}))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body["details"]["field"], "email");
    assert_eq!(body["details"]["code"], "missing_field");
}

#[actix_web::test]
async fn provider_rejection_is_surfaced_verbatim() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_sign_in()
        .times(1)
        .returning(|_| Err(Error::unauthorized("Incorrect email or password.")));
    let app = actix_test::init_service(test_app(ports)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "ada@example.com", "password": "wrong"}))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = error_body(response).await;
    assert_eq!(body["code"], ErrorCode::Unauthorized.as_str());
    assert_eq!(body["message"], "Incorrect email or password.");
}

#[actix_web::test]
async fn logout_signs_out_and_clears_session() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_sign_out()
        .withf(|id| id.as_ref() == "u-ada")
        .times(1)
        .returning(|_| Err(Error::service_unavailable("provider down")));
    let app = actix_test::init_service(test_app(ports)).await;

    let signed_in = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(TEST_SIGN_IN_PATH)
            .to_request(),
    )
    .await;
    let cookie = session_cookie(&signed_in);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = session_cookie(&response);
    assert!(cleared.value().is_empty());
}

#[actix_web::test]
async fn logout_without_session_is_a_no_op() {
    let mut ports = MockPorts::default();
    ports.accounts.expect_sign_out().never();
    let app = actix_test::init_service(test_app(ports)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/logout")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn me_requires_session() {
    let app = actix_test::init_service(test_app(MockPorts::default())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/auth/me").to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = error_body(response).await;
    assert_eq!(body["message"], "You must be logged in to do that.");
}
