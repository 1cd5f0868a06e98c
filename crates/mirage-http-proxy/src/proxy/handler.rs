//! Request handling for the intermediary.
//!
//! Admin paths are dispatched to the admin API. Everything else is recorded or
//! replayed depending on the current mode.

use super::context::RequestHandlerContext;
use super::headers::{
    is_replayable, MirageHeadersExt, VALUE_TRUE, X_MIRAGE_RECORDED, X_MIRAGE_REPLAYED,
};
use super::target::is_bare_host;
use crate::admin_api::{
    self, error_response, json_response, AdminContext, NoRecordingResponse, ADMIN_PREFIX,
};
use crate::metrics;
use crate::recording::{Mode, PlayerError, RecordedResponse};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Request, Response, StatusCode, Uri};
use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt::Display;
use tracing::{debug, error, warn};

/// Handle an incoming request: admin endpoint, recording or playback.
pub async fn handle_request<B>(
    ctx: &RequestHandlerContext<'_>,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();

    debug!("Received request: {} {}", parts.method, parts.uri);

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(
                "Failed to read request body for {} {}: {}",
                parts.method, parts.uri, e
            );
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
            ));
        }
    };

    if let Some(admin_path) = parts.uri.path().strip_prefix(ADMIN_PREFIX) {
        let admin = AdminContext {
            mode: ctx.mode,
            repository: &**ctx.repository,
        };
        return Ok(admin_api::route_request(&admin, &parts.method, admin_path, &body));
    }

    let mode = ctx.mode.get();
    let response = match mode {
        Mode::Record => record(ctx, &parts, body).await,
        Mode::Playback => replay(ctx, &parts, &body),
    };

    metrics::record_request(mode.as_str(), response.status().as_u16());
    Ok(response)
}

async fn record(
    ctx: &RequestHandlerContext<'_>,
    parts: &Parts,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let Some(target) = resolve_target(&parts.uri, ctx.target_param) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            &format!("Missing '{}' query parameter", ctx.target_param),
        );
    };

    match ctx.recorder.handle(parts, body, &target).await {
        Ok(interaction) => {
            let mut response = interaction_response(&interaction.response);
            response.set_header(&X_MIRAGE_RECORDED, &VALUE_TRUE);
            response
        }
        Err(e) => {
            warn!(
                "Recording {} {} via '{}' failed: {}",
                parts.method, parts.uri, target, e
            );
            error_response(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

fn replay(ctx: &RequestHandlerContext<'_>, parts: &Parts, body: &[u8]) -> Response<Full<Bytes>> {
    match ctx.player.handle(parts, body) {
        Ok(interaction) => {
            metrics::record_replay();
            let mut response = interaction_response(&interaction.response);
            response.set_header(&X_MIRAGE_REPLAYED, &VALUE_TRUE);
            response
        }
        Err(PlayerError::NoRecording {
            method,
            url,
            fingerprint,
        }) => {
            metrics::record_playback_miss();
            debug!("No recording for {} {} ({})", method, url, fingerprint);
            json_response(
                StatusCode::NOT_FOUND,
                &NoRecordingResponse {
                    error: "No recording matches this request".to_string(),
                    method,
                    url,
                    fingerprint,
                },
            )
        }
        Err(e) => {
            error!("Playback of {} {} failed: {}", parts.method, parts.uri, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Extract the upstream target from an inbound URI.
///
/// The target is the decoded value of the `target_param` query parameter. A
/// target naming only a host is extended with the inbound path and the
/// remaining query parameters, so `/v1/users?target=api.example.com&page=2`
/// resolves to `api.example.com/v1/users?page=2`. The appended pairs stay
/// percent-encoded, with form-style `+` rewritten to `%20`.
pub fn resolve_target(uri: &Uri, target_param: &str) -> Option<String> {
    let query = uri.query()?;

    let mut target = None;
    let mut remaining = Vec::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if target.is_none() && decode_component(key) == target_param {
            target = Some(decode_component(value).trim().to_string());
        } else {
            // Form-encoded `+` is a space; keep it one once the query is re-encoded
            remaining.push(pair.replace('+', "%20"));
        }
    }

    let mut target = target.filter(|target| !target.is_empty())?;

    if is_bare_host(&target) {
        let path = uri.path();
        if path != "/" {
            target.push_str(path);
        }
        if !remaining.is_empty() {
            if path == "/" {
                target.push('/');
            }
            target.push('?');
            target.push_str(&remaining.join("&"));
        }
    }

    Some(target)
}

/// Decode a form-style query component, `+` meaning space.
fn decode_component(component: &str) -> Cow<'_, str> {
    if component.contains(['+', '%']) {
        let spaced = component.replace('+', " ");
        match urlencoding::decode(&spaced) {
            Ok(decoded) => Cow::Owned(decoded.into_owned()),
            Err(_) => Cow::Owned(spaced),
        }
    } else {
        Cow::Borrowed(component)
    }
}

/// Build the client-facing response for a recorded upstream response.
///
/// Connection-level headers and `content-length` are left out.
fn interaction_response(recorded: &RecordedResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(recorded.status_code);

    for (name, values) in &recorded.headers {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            debug!("Skipping recorded header with invalid name '{}'", name);
            continue;
        };
        if !is_replayable(&header_name) {
            continue;
        }
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(header_value) => builder = builder.header(&header_name, header_value),
                Err(_) => debug!("Skipping invalid recorded value for header '{}'", name),
            }
        }
    }

    builder
        .body(Full::new(Bytes::from(recorded.body.clone())))
        .unwrap_or_else(|e| {
            error!("Recorded response cannot be replayed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Recorded response cannot be replayed",
            )
        })
}
