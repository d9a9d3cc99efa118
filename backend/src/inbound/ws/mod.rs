//! WebSocket inbound adapter streaming live view state to clients.
//!
//! Responsibilities:
//! - validate upgrade requests against the configured origin allow-list
//! - adopt the cookie session's user, if any, as the connection's user, and
//!   link the cookie so later sign-ins on it reach the connection
//! - hand the socket to a per-connection live session task

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, info, warn};
use url::Url;

use crate::domain::TraceId;
use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

use session::LinkListener;
use state::{AllowedOrigins, WsState};

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(&state.allowed_origins, origin_header)?;

    let user = session.user()?;
    let link = LinkListener {
        link: session.live_link()?,
        events: state.session_links.subscribe(),
    };
    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;

    let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);
    info!(%trace_id, signed_in = user.is_some(), "live session opened");
    actix_web::rt::spawn(TraceId::scope(
        trace_id,
        session::handle_ws_session(
            state.live.clone(),
            state.feed_limit,
            user,
            link,
            ws_session,
            messages,
        ),
    ));
    Ok(response)
}

fn validate_origin(allowed: &AllowedOrigins, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.allows(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
