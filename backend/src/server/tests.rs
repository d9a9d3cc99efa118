//! Tests for server assembly: readiness signalling and route wiring.

use super::*;
use actix_web::http::StatusCode;
use actix_web::test;
use quorum::domain::TRACE_ID_HEADER;
use quorum::inbound::ws::state::AllowedOrigins;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::time::Duration;

#[fixture]
fn health_state() -> web::Data<HealthState> {
    web::Data::new(HealthState::new())
}

#[fixture]
fn server_config() -> ServerConfig {
    ServerConfig {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
        session_ttl: Duration::from_secs(3600),
        bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
        backend: StoreBackend::Memory,
        gemini_api_key: None,
        gemini_model: "gemini-2.5-flash".to_owned(),
        feed_limit: 50,
        allowed_origins: AllowedOrigins::parse(["http://localhost:3000"]).expect("origins"),
    }
}

fn dependencies(health_state: web::Data<HealthState>, config: &ServerConfig) -> AppDependencies {
    let adapters = build_adapters(config).expect("adapters");
    AppDependencies {
        health_state,
        http_state: build_http_state(&adapters, config.feed_limit),
        ws_state: build_ws_state(&adapters, config),
        key: config.key.clone(),
        cookie_secure: config.cookie_secure,
        same_site: config.same_site,
        session_ttl: config.session_ttl,
    }
}

#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready(
    health_state: web::Data<HealthState>,
    server_config: ServerConfig,
) {
    assert!(!health_state.is_ready(), "state should start unready");

    let _server = create_server(health_state.clone(), server_config).expect("server should build");

    assert!(
        health_state.is_ready(),
        "server creation should mark readiness"
    );
}

#[rstest]
#[actix_rt::test]
async fn api_routes_share_session_and_trace(
    health_state: web::Data<HealthState>,
    server_config: ServerConfig,
) {
    let app = test::init_service(build_app(dependencies(health_state, &server_config))).await;

    let signup = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({
            "email": "ada@example.com",
            "password": "correct horse",
            "displayName": "Ada"
        }))
        .to_request();
    let resp = test::call_service(&app, signup).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key(TRACE_ID_HEADER));
    let cookie = resp
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned();

    let ask = test::TestRequest::post()
        .uri("/api/v1/questions")
        .cookie(cookie)
        .set_json(json!({"title": "Why is the sky blue?"}))
        .to_request();
    let resp = test::call_service(&app, ask).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let question: Value = test::read_body_json(resp).await;
    assert_eq!(question["authorName"], "Ada");

    let list = test::TestRequest::get()
        .uri("/api/v1/questions?search=Why")
        .to_request();
    let questions: Value = test::call_and_read_body_json(&app, list).await;
    assert_eq!(questions[0]["title"], "Why is the sky blue?");
}

#[rstest]
#[actix_rt::test]
async fn malformed_json_uses_error_envelope(
    health_state: web::Data<HealthState>,
    server_config: ServerConfig,
) {
    let app = test::init_service(build_app(dependencies(health_state, &server_config))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "invalid_request");
    assert!(body["traceId"].is_string());
}

#[rstest]
#[actix_rt::test]
async fn probes_follow_health_state(
    health_state: web::Data<HealthState>,
    server_config: ServerConfig,
) {
    let app =
        test::init_service(build_app(dependencies(health_state.clone(), &server_config))).await;

    let before = test::TestRequest::get().uri("/health/ready").to_request();
    assert_eq!(
        test::call_service(&app, before).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );

    health_state.mark_ready();
    let after = test::TestRequest::get().uri("/health/ready").to_request();
    assert_eq!(test::call_service(&app, after).await.status(), StatusCode::OK);
}
