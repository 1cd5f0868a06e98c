//! Mode handlers: read and switch between record and playback.

use crate::admin_api::types::*;
use crate::recording::ModeController;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET /__mirage/mode
pub fn handle_get(mode: &ModeController) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &ModeBody { mode: mode.get() })
}

/// PUT /__mirage/mode - body `{"mode": "record" | "playback"}`
pub fn handle_set(mode: &ModeController, body: &[u8]) -> Response<Full<Bytes>> {
    match serde_json::from_slice::<ModeBody>(body) {
        Ok(requested) => {
            mode.set(requested.mode);
            json_response(StatusCode::OK, &requested)
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &format!("Invalid mode body: {e}")),
    }
}
