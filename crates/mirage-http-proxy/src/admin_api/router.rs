//! Route dispatch logic for the admin endpoints.

use crate::admin_api::handlers::{interactions, mode, system};
use crate::admin_api::types::{method_not_allowed, not_found};
use crate::recording::{InteractionRepository, ModeController};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response};
use tracing::debug;

/// Path prefix reserved for admin endpoints on the intermediary listener
pub const ADMIN_PREFIX: &str = "/__mirage";

/// State the admin endpoints operate on
pub struct AdminContext<'a> {
    pub mode: &'a ModeController,
    pub repository: &'a dyn InteractionRepository,
}

/// Dispatch an admin request. `path` is the part after [`ADMIN_PREFIX`].
pub fn route_request(
    ctx: &AdminContext<'_>,
    method: &Method,
    path: &str,
    body: &[u8],
) -> Response<Full<Bytes>> {
    debug!("Admin API: {} {}{}", method, ADMIN_PREFIX, path);

    match path {
        "/health" => match *method {
            Method::GET => system::handle_health(),
            _ => method_not_allowed(),
        },
        "/metrics" => match *method {
            Method::GET => system::handle_metrics(),
            _ => method_not_allowed(),
        },
        "/mode" => match *method {
            Method::GET => mode::handle_get(ctx.mode),
            Method::PUT => mode::handle_set(ctx.mode, body),
            _ => method_not_allowed(),
        },
        "/interactions" => match *method {
            Method::GET => interactions::handle_list(ctx.repository),
            Method::DELETE => interactions::handle_clear(ctx.repository),
            _ => method_not_allowed(),
        },
        "/interactions/count" => match *method {
            Method::GET => interactions::handle_count(ctx.repository),
            _ => method_not_allowed(),
        },
        _ => not_found(),
    }
}
